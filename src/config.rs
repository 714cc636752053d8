use crate::calendar::ExamCalendarConfig;
use crate::error::ConfigError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MIN_GAP_MINUTES: i64 = 180;
pub const DEFAULT_MAX_EXAMS_PER_DAY: usize = 2;
pub const DEFAULT_MAX_DAYS: usize = 50;
pub const DEFAULT_SLOT_STEP_MINUTES: i64 = 30;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_ATTEMPT_FACTOR: u64 = 2_000;

/// Hours of the day during which exams may run, `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DailyWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }

    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start >= self.start && end <= self.end
    }
}

impl Default for DailyWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(18, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// How candidate classrooms are ordered for each placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassroomOrder {
    /// Smallest sufficient classroom first.
    #[default]
    BestFit,
    /// Smallest first, ties broken by how often the room is already in use.
    BestFitLeastUsed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub min_gap_minutes: i64,
    pub max_exams_per_day: usize,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub slot_step_minutes: i64,
    /// Wall-clock limit per day-count probe; zero disables it.
    pub probe_timeout_ms: u64,
    /// Attempt budget per probe is `courses * classrooms * attempt_factor`;
    /// zero disables the budget.
    pub attempt_factor: u64,
    /// Day-count ceiling used when a request names neither an end date nor a
    /// day count.
    pub max_days: usize,
    /// Added to the heuristic lower bound before the day-count search.
    pub lower_bound_margin: usize,
    pub classroom_order: ClassroomOrder,
    pub calendar: ExamCalendarConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let window = DailyWindow::default();
        Self {
            min_gap_minutes: DEFAULT_MIN_GAP_MINUTES,
            max_exams_per_day: DEFAULT_MAX_EXAMS_PER_DAY,
            window_start: window.start,
            window_end: window.end,
            slot_step_minutes: DEFAULT_SLOT_STEP_MINUTES,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            attempt_factor: DEFAULT_ATTEMPT_FACTOR,
            max_days: DEFAULT_MAX_DAYS,
            lower_bound_margin: 0,
            classroom_order: ClassroomOrder::default(),
            calendar: ExamCalendarConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn window(&self) -> DailyWindow {
        DailyWindow::new(self.window_start, self.window_end)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_start >= self.window_end {
            return Err(ConfigError::Invalid(format!(
                "window_start {} must be before window_end {}",
                self.window_start, self.window_end
            )));
        }
        if self.slot_step_minutes <= 0 {
            return Err(ConfigError::Invalid(format!(
                "slot_step_minutes must be positive (got {})",
                self.slot_step_minutes
            )));
        }
        if self.min_gap_minutes < 0 {
            return Err(ConfigError::Invalid(format!(
                "min_gap_minutes must not be negative (got {})",
                self.min_gap_minutes
            )));
        }
        if self.max_exams_per_day == 0 {
            return Err(ConfigError::Invalid(
                "max_exams_per_day must be at least 1".to_string(),
            ));
        }
        if self.max_days == 0 {
            return Err(ConfigError::Invalid("max_days must be at least 1".to_string()));
        }
        if self.calendar.excludes_every_weekday() {
            return Err(ConfigError::Invalid(
                "calendar excludes every weekday".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_config_from_json<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig, ConfigError> {
    let file = File::open(path)?;
    let config: SchedulerConfig = serde_json::from_reader(BufReader::new(file))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config_to_json<P: AsRef<Path>>(
    config: &SchedulerConfig,
    path: P,
) -> Result<(), ConfigError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}

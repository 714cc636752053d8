use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How a single day-count probe ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    #[default]
    NotStarted,
    Searching,
    Success,
    /// The per-probe deadline passed before the search finished.
    TimedOut,
    /// The attempt budget ran out before the search finished.
    AttemptsExhausted,
    /// Every candidate was tried; no timetable exists for this day count.
    Exhausted,
    /// Abandoned because a smaller day count already succeeded.
    Cancelled,
}

impl ProbeStatus {
    /// Terminal statuses other than `Success` and `Exhausted` say nothing
    /// about whether a timetable exists.
    pub fn is_budget_exceeded(self) -> bool {
        matches!(self, ProbeStatus::TimedOut | ProbeStatus::AttemptsExhausted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProbeStatus::NotStarted => "not_started",
            ProbeStatus::Searching => "searching",
            ProbeStatus::Success => "success",
            ProbeStatus::TimedOut => "timed_out",
            ProbeStatus::AttemptsExhausted => "attempts_exhausted",
            ProbeStatus::Exhausted => "exhausted",
            ProbeStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub day_count: usize,
    pub status: ProbeStatus,
    /// Candidate placements examined.
    pub attempts: u64,
    pub elapsed: Duration,
}

/// Trace of one day-count search, in probe order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub lower_bound: usize,
    pub upper_bound: usize,
    pub optimal_days: Option<usize>,
    pub probes: Vec<ProbeRecord>,
}

impl SearchSummary {
    pub fn new(lower_bound: usize, upper_bound: usize) -> Self {
        Self {
            lower_bound,
            upper_bound,
            optimal_days: None,
            probes: Vec::new(),
        }
    }

    pub fn record(&mut self, probe: ProbeRecord) {
        if probe.status == ProbeStatus::Success {
            self.optimal_days = Some(match self.optimal_days {
                Some(best) => best.min(probe.day_count),
                None => probe.day_count,
            });
        }
        self.probes.push(probe);
    }

    pub fn status_of(&self, day_count: usize) -> Option<ProbeStatus> {
        self.probes
            .iter()
            .rev()
            .find(|probe| probe.day_count == day_count)
            .map(|probe| probe.status)
    }

    pub fn any_budget_exceeded(&self) -> bool {
        self.probes
            .iter()
            .any(|probe| probe.status.is_budget_exceeded())
    }

    pub fn total_attempts(&self) -> u64 {
        self.probes.iter().map(|probe| probe.attempts).sum()
    }

    pub fn total_elapsed(&self) -> Duration {
        self.probes.iter().map(|probe| probe.elapsed).sum()
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("bounds={}..={}", self.lower_bound, self.upper_bound));
        if let Some(days) = self.optimal_days {
            parts.push(format!("days={}", days));
        }
        parts.push(format!("probes={}", self.probes.len()));
        if !self.probes.is_empty() {
            let trail = self
                .probes
                .iter()
                .map(|probe| format!("{}:{}", probe.day_count, probe.status))
                .collect::<Vec<_>>()
                .join(" ");
            parts.push(format!("trail=[{}]", trail));
        }
        let attempts = self.total_attempts();
        if attempts > 0 {
            parts.push(format!("attempts={}", attempts));
        }
        parts.join(", ")
    }
}

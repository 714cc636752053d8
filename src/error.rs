use crate::scheduler::SearchSummary;
use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Rejected before any search started.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No probed day count up to `ceiling` produced a timetable.
    #[error(
        "no valid timetable within {ceiling} day(s) ({}); constraints may be too tight, try extending the date range",
        .summary.to_cli_summary()
    )]
    Infeasible {
        ceiling: usize,
        summary: SearchSummary,
    },
}

impl SchedulerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// True when some probe gave up on its time or attempt budget, i.e. the
    /// failure is not a proof that no timetable exists.
    pub fn is_budget_limited(&self) -> bool {
        match self {
            SchedulerError::Infeasible { summary, .. } => summary.any_budget_exceeded(),
            SchedulerError::InvalidInput(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] SerdeJsonError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

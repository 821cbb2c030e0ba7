use thiserror::Error;

/// Failures surfaced by the scheduling layer.
///
/// Selecting a mechanism never fails. Errors only come from parsing and
/// configuration at the edges, or from the task itself once it has run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unknown priority `{0}`, expected one of: background, user-visible, user-blocking")]
    UnknownPriority(String),

    #[error("{delays} delay for `{less}` ({less_ms} ms) is shorter than for `{more}` ({more_ms} ms)")]
    NonMonotonicDelays {
        delays: &'static str,
        less: &'static str,
        less_ms: u128,
        more: &'static str,
        more_ms: u128,
    },

    #[error("invalid delay table: {0}")]
    InvalidDelayTable(String),

    #[error("task panicked: {message}")]
    TaskPanicked { message: String },

    #[error("host dropped the task before running it")]
    Abandoned,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, LogError>;

/// Errors surfaced by registration and write calls.
///
/// Every failure is local to the call that produced it: there is no retry,
/// no fallback writer and no global error channel.
#[derive(Debug, Error)]
pub enum LogError {
    /// Opening a file destination or writing to a sink failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A `%expr%` placeholder could not be evaluated against its context.
    #[error("template expression `{expr}` failed: {reason}")]
    Template { expr: String, reason: String },

    /// Caller contract violation (missing destination, unknown flags, ...).
    #[error("logger misuse: {0}")]
    Misuse(String),

    /// One or more entries of a batch registration failed. Every entry is
    /// attempted; failures are collected, not rolled back.
    #[error("batch registration failed: {}", display_batch(.0))]
    Batch(Vec<(String, LogError)>),
}

fn display_batch(failures: &[(String, LogError)]) -> String {
    failures
        .iter()
        .map(|(alias, err)| format!("`{alias}`: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

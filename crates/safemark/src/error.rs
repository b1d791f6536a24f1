//! CLI error types.

use safemark_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("input has {lines} lines, limit is {max} (engine.max_lines)")]
    InputTooLarge { lines: usize, max: usize },

    #[error("link destination rejected: {0}")]
    RejectedHref(String),
}

//! Error types for engine extensions.

use crate::delegate::Extension;

/// Error while installing an engine extension.
///
/// Never surfaces from conversion: a failed extension is logged and skipped.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PluginError {
    /// The extension was installed twice into the same configuration.
    #[error("extension {0} is already enabled")]
    AlreadyEnabled(Extension),

    /// The extension cannot be combined with one that is already enabled.
    #[error("extension {extension} conflicts with {enabled}")]
    Conflict {
        /// Extension being installed.
        extension: Extension,
        /// Extension already present in the configuration.
        enabled: Extension,
    },

    /// Engine-specific installation failure.
    #[error("failed to install {extension}: {reason}")]
    Install {
        extension: Extension,
        reason: String,
    },
}

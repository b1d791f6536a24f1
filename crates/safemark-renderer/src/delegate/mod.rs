//! Delegation to a full Markdown engine.
//!
//! A [`MarkdownEngine`] renders documents according to an [`EngineConfig`]
//! derived from [`RenderOptions`]. Optional features are modelled as
//! [`Extension`]s: each engine publishes a capability table mapping an
//! extension to an [`Installer`], and [`configure`] runs every available
//! installer. Missing capabilities and failed installers are skipped.

#[cfg(feature = "pulldown")]
mod pulldown;

#[cfg(feature = "pulldown")]
pub use pulldown::PulldownEngine;

use std::fmt;

use crate::error::PluginError;
use crate::options::RenderOptions;

/// Optional syntax features an engine may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Footnotes,
    TaskLists,
    DefinitionLists,
    /// `^sup^` and `~sub~`.
    SubSuperscript,
    /// `==marked==`.
    Highlight,
    Abbreviations,
    /// `{#id .class}` attribute blocks.
    Attributes,
    /// Fenced `:::` containers.
    Containers,
}

impl Extension {
    /// Every extension, in installation order.
    pub const ALL: [Extension; 8] = [
        Extension::Footnotes,
        Extension::TaskLists,
        Extension::DefinitionLists,
        Extension::SubSuperscript,
        Extension::Highlight,
        Extension::Abbreviations,
        Extension::Attributes,
        Extension::Containers,
    ];

    /// Stable lowercase name used in logs and messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Extension::Footnotes => "footnotes",
            Extension::TaskLists => "task-lists",
            Extension::DefinitionLists => "definition-lists",
            Extension::SubSuperscript => "sub-superscript",
            Extension::Highlight => "highlight",
            Extension::Abbreviations => "abbreviations",
            Extension::Attributes => "attributes",
            Extension::Containers => "containers",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Installs one extension into an engine configuration.
pub type Installer = fn(&mut EngineConfig, Extension) -> Result<(), PluginError>;

/// Per-call engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct EngineConfig {
    /// Pass raw HTML through.
    pub html: bool,
    /// Auto-link bare URLs in text.
    pub linkify: bool,
    /// Smart quotes and dashes.
    pub typographer: bool,
    /// Soft line breaks become `<br />`.
    pub breaks: bool,
    /// Skip link destination validation.
    pub allow_unsafe_links: bool,
    /// Pipe tables; always on.
    pub tables: bool,
    /// `~~strikethrough~~`; always on.
    pub strikethrough: bool,
    extensions: Vec<Extension>,
}

impl EngineConfig {
    /// Base configuration without any extension installed.
    #[must_use]
    pub fn from_options(options: &RenderOptions) -> Self {
        Self {
            html: options.allow_html,
            linkify: options.linkify,
            typographer: options.typographer,
            breaks: options.breaks,
            allow_unsafe_links: options.allow_unsafe_links,
            tables: true,
            strikethrough: true,
            extensions: Vec::new(),
        }
    }

    /// Mark `extension` as enabled.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyEnabled`] if it was enabled before.
    pub fn enable(&mut self, extension: Extension) -> Result<(), PluginError> {
        if self.is_enabled(extension) {
            return Err(PluginError::AlreadyEnabled(extension));
        }
        self.extensions.push(extension);
        Ok(())
    }

    #[must_use]
    pub fn is_enabled(&self, extension: Extension) -> bool {
        self.extensions.contains(&extension)
    }

    /// Enabled extensions in installation order.
    #[must_use]
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }
}

/// Installer that only records the extension as enabled.
///
/// Suitable for engines that switch features on from the final config.
///
/// # Errors
///
/// Fails when the extension is already enabled.
pub fn enable_extension(config: &mut EngineConfig, extension: Extension) -> Result<(), PluginError> {
    config.enable(extension)
}

/// A Markdown engine the converter can delegate to.
///
/// Engines must run every link destination through
/// [`validate_href`](crate::validate_href) unless
/// [`EngineConfig::allow_unsafe_links`] is set, and must escape raw HTML
/// unless [`EngineConfig::html`] is set.
pub trait MarkdownEngine: Send + Sync {
    /// Engine name for logs.
    fn name(&self) -> &'static str;

    /// Capability table entry: the installer for `extension`, or `None`
    /// when the engine does not provide it.
    fn capability(&self, extension: Extension) -> Option<Installer>;

    /// Extensions this engine provides.
    fn extensions(&self) -> Vec<Extension> {
        Extension::ALL
            .into_iter()
            .filter(|&extension| self.capability(extension).is_some())
            .collect()
    }

    /// Render a normalized Markdown document.
    fn render(&self, source: &str, config: &EngineConfig) -> String;
}

/// Build the configuration for one render call.
///
/// Every extension in [`Extension::ALL`] is looked up in the engine's
/// capability table. Absent capabilities are skipped; installers that fail
/// are logged and skipped without affecting the others.
pub fn configure(engine: &dyn MarkdownEngine, options: &RenderOptions) -> EngineConfig {
    let mut config = EngineConfig::from_options(options);

    for extension in Extension::ALL {
        let Some(install) = engine.capability(extension) else {
            tracing::debug!(
                engine = engine.name(),
                extension = %extension,
                "Extension not available, skipping"
            );
            continue;
        };
        if let Err(error) = install(&mut config, extension) {
            tracing::warn!(
                engine = engine.name(),
                extension = %extension,
                %error,
                "Failed to install extension, skipping"
            );
        }
    }

    config
}

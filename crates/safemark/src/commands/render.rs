//! `safemark render` command implementation.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use safemark_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render (default: stdin; `-` also reads stdin).
    file: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover safemark.toml).
    #[arg(short, long, env = "SAFEMARK_CONFIG")]
    config: Option<PathBuf>,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use the built-in engine instead of the delegated one.
    #[arg(long)]
    fallback: bool,

    /// Pass raw HTML through (delegated engine only).
    #[arg(long)]
    allow_html: bool,

    /// Do not validate link schemes.
    #[arg(long)]
    allow_unsafe_links: bool,

    /// Do not auto-link bare URLs.
    #[arg(long)]
    no_linkify: bool,

    /// Enable smart quotes and dashes.
    #[arg(long)]
    typographer: bool,

    /// Render single line breaks as `<br />`.
    #[arg(long)]
    breaks: bool,

    /// Do not add `target="_blank"` to links.
    #[arg(long)]
    no_target_blank: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read,
    /// the input exceeds `engine.max_lines`, or the output cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if self.verbose
            && let Some(path) = &config.config_path
        {
            output.info(&format!("Using config: {}", path.display()));
        }

        let source = read_source(self.file.as_deref())?;
        check_line_limit(&source, config.engine.max_lines)?;

        let converter = config.converter();
        tracing::info!(
            engine = converter.engine_name(),
            bytes = source.len(),
            "Rendering markdown"
        );
        let html = converter.convert(&source, &config.render);

        if let Some(path) = &self.output {
            std::fs::write(path, &html)?;
            output.success(&format!("Wrote {}", path.display()));
        } else {
            let mut stdout = io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            if !html.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }

        Ok(())
    }

    /// Map command-line flags to config overrides.
    ///
    /// Flags only ever switch a setting away from its default, so an unset
    /// flag leaves the config file value alone.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            allow_html: self.allow_html.then_some(true),
            allow_unsafe_links: self.allow_unsafe_links.then_some(true),
            linkify: self.no_linkify.then_some(false),
            typographer: self.typographer.then_some(true),
            breaks: self.breaks.then_some(true),
            link_target_blank: self.no_target_blank.then_some(false),
            fallback: self.fallback.then_some(true),
        }
    }
}

/// Read Markdown from `file`, or from stdin when absent or `-`.
fn read_source(file: Option<&Path>) -> Result<String, CliError> {
    match file {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => Ok(io::read_to_string(io::stdin())?),
    }
}

fn check_line_limit(source: &str, max_lines: Option<usize>) -> Result<(), CliError> {
    let Some(max) = max_lines else {
        return Ok(());
    };
    let lines = source.lines().count();
    if lines > max {
        return Err(CliError::InputTooLarge { lines, max });
    }
    Ok(())
}

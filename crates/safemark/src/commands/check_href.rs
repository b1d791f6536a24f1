//! `safemark check-href` command implementation.

use clap::Args;
use safemark_renderer::{SafeHref, validate_href};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check-href command.
#[derive(Args)]
pub(crate) struct CheckHrefArgs {
    /// Link destination to check.
    url: String,

    /// Accept every scheme, as `--allow-unsafe-links` does for rendering.
    #[arg(long)]
    allow_unsafe: bool,
}

impl CheckHrefArgs {
    /// Execute the check-href command.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::RejectedHref`] if the destination is rejected.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let href = self.check()?;
        Output::new().success(&format!("Allowed: {href}"));
        Ok(())
    }

    /// Run the link policy, returning the href rendered links would use.
    fn check(&self) -> Result<String, CliError> {
        match validate_href(&self.url, self.allow_unsafe) {
            SafeHref::Allowed(href) => Ok(href),
            SafeHref::Rejected => Err(CliError::RejectedHref(self.url.trim().to_owned())),
        }
    }
}

//! `drop build` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use drop_build::{BuildOptions, build};
use drop_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Output directory (overrides config, default: dist).
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Fail with the first underlying error and its full cause chain.
    #[arg(long)]
    pub(crate) debug: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or any page, route or copy
    /// fails to build.
    pub(crate) async fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            destination_dir: self.dest,
            ..CliSettings::default()
        };
        let config = Config::load(config_path, Some(&cli_settings))?;
        let descriptors = super::site_descriptors(&config)?;
        let destination_dir = config.build_resolved.destination_dir.clone();

        output.info(&format!(
            "Building {} site(s) into {}",
            descriptors.len(),
            destination_dir.display()
        ));

        let report = build(&descriptors, &BuildOptions { destination_dir }).await?;

        if report.is_success() {
            output.success(&format!("Built {} file(s)", report.files_written));
            return Ok(());
        }

        let count = report.failures.len();
        tracing::debug!(
            written = report.files_written,
            failed = count,
            "Build finished with failures"
        );
        if self.debug {
            return Err(report
                .failures
                .into_iter()
                .next()
                .map_or(CliError::BuildFailed(count), |first| first.error.into()));
        }

        output.warning(&format!(
            "Wrote {} file(s), {count} failed:",
            report.files_written
        ));
        for failure in &report.failures {
            output.detail(&format!("{}: {}", failure.target.display(), failure.error));
        }
        Err(CliError::BuildFailed(count))
    }
}

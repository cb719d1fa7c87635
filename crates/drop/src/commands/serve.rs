//! `drop serve` command implementation.

use std::path::Path;

use clap::Args;
use drop_config::{CliSettings, Config};
use drop_server::{ServerConfig, run_server};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            ..CliSettings::default()
        };
        let config = Config::load(config_path, Some(&cli_settings))?;
        let descriptors = super::site_descriptors(&config)?;

        output.info(&format!(
            "Starting server on http://{}:{}",
            config.server.host, config.server.port
        ));
        for descriptor in &descriptors {
            let mount = descriptor
                .normalized_mount_point()
                .map_or_else(|| "/".to_owned(), |m| format!("/{m}/"));
            output.detail(&format!("{mount} -> {}", descriptor.source_dir.display()));
        }

        let server_config = ServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
        };
        run_server(&server_config, &descriptors).await?;

        Ok(())
    }
}

//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod serve;

pub(crate) use build::BuildArgs;
pub(crate) use serve::ServeArgs;

use drop_config::Config;
use drop_context::Descriptor;

use crate::error::CliError;

/// Descriptors for every configured site, with the built-in processors.
fn site_descriptors(config: &Config) -> Result<Vec<Descriptor>, CliError> {
    let descriptors = config.descriptors(drop_processors::builtin, drop_processors::BUILTIN_IDS)?;
    tracing::debug!(
        config = ?config.config_path,
        sites = descriptors.len(),
        "Loaded site descriptors"
    );
    if descriptors.is_empty() {
        let location = config
            .config_path
            .as_ref()
            .map_or_else(|| "no drop.toml found".to_owned(), |p| p.display().to_string());
        return Err(CliError::Validation(format!(
            "No sites configured ({location}); add a [[site]] table"
        )));
    }
    Ok(descriptors)
}

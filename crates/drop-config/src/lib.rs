//! Configuration management for drop.
//!
//! Parses `drop.toml` with serde and discovers it in the current directory
//! or its parents. CLI settings are applied during load via [`CliSettings`].
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 7979
//!
//! [build]
//! destination_dir = "dist"
//!
//! [[site]]
//! source_dir = "site"
//! statics = "static"
//! pages = "pages"
//! processors = ["markdown", { id = "md", use = "markdown" }]
//!
//! [site.data]
//! title = "My site"
//!
//! [site.routes]
//! "robots.txt" = { text = "User-agent: *" }
//! "404.html" = { process = "templates/404" }
//! ```
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `build.destination_dir`
//! - `site.source_dir`

mod expand;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use drop_context::{
    Artifact, ContextData, Descriptor, DynamicRoute, DynamicRoutes, Processor, Registry, render_fn,
};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override build output directory.
    pub destination_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "drop.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    build: BuildConfigRaw,
    #[serde(rename = "site")]
    sites_raw: Vec<SiteConfigRaw>,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Resolved sites (set after loading).
    #[serde(skip)]
    pub sites: Vec<SiteConfig>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    destination_dir: Option<String>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Default)]
pub struct BuildConfig {
    pub destination_dir: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct SiteConfigRaw {
    source_dir: Option<String>,
    statics: Option<String>,
    pages: Option<String>,
    mount_point: Option<String>,
    processors: Option<Vec<ProcessorEntry>>,
    data: ContextData,
    routes: BTreeMap<String, RouteSource>,
}

/// A `processors` entry: a built-in id, or a new id that uses a built-in.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ProcessorEntry {
    Id(String),
    Aliased {
        id: String,
        #[serde(rename = "use")]
        uses: Option<String>,
    },
}

impl ProcessorEntry {
    /// Id the processor is registered under.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Aliased { id, .. } => id,
        }
    }

    /// Id of the built-in implementation.
    #[must_use]
    pub fn implementation(&self) -> &str {
        match self {
            Self::Id(id) | Self::Aliased { id, uses: None } => id,
            Self::Aliased { uses: Some(uses), .. } => uses,
        }
    }
}

/// Content of a dynamic route.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    /// Literal text.
    Text(String),
    /// A logical path processed through the site's context.
    Process(String),
}

/// Resolved site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Absolute source directory.
    pub source_dir: PathBuf,
    pub statics_subdir: Option<PathBuf>,
    pub pages_subdir: Option<PathBuf>,
    pub mount_point: Option<String>,
    /// Processors to register; `None` registers every built-in.
    pub processors: Option<Vec<ProcessorEntry>>,
    pub data: ContextData,
    pub routes: BTreeMap<String, RouteSource>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`DROP_HOST`} not set").
        message: String,
    },
    /// A site names a processor that is not available.
    #[error("Unknown processor '{id}' in site {}", .site.display())]
    UnknownProcessor { site: PathBuf, id: String },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `drop.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(destination_dir) = &settings.destination_dir {
            self.build_resolved.destination_dir.clone_from(destination_dir);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Default config (no sites) with paths relative to `base`.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            build: BuildConfigRaw::default(),
            sites_raw: Vec::new(),
            build_resolved: BuildConfig {
                destination_dir: base.join("dist"),
            },
            sites: Vec::new(),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_sites()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_sites(&self) -> Result<(), ConfigError> {
        let mut mount_points = HashSet::new();
        for (index, site) in self.sites.iter().enumerate() {
            let mount_point = site
                .mount_point
                .as_deref()
                .map(|m| m.trim_matches('/'))
                .unwrap_or_default();
            if !mount_points.insert(mount_point) {
                return Err(ConfigError::Validation(format!(
                    "site[{index}].mount_point '{mount_point}' is used by another site"
                )));
            }

            for entry in site.processors.iter().flatten() {
                require_non_empty(entry.id(), &format!("site[{index}].processors.id"))?;
                require_non_empty(
                    entry.implementation(),
                    &format!("site[{index}].processors.use"),
                )?;
            }
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref dir) = self.build.destination_dir {
            self.build.destination_dir = Some(expand::expand_env(dir, "build.destination_dir")?);
        }

        for (index, site) in self.sites_raw.iter_mut().enumerate() {
            if let Some(ref dir) = site.source_dir {
                site.source_dir = Some(expand::expand_env(
                    dir,
                    &format!("site[{index}].source_dir"),
                )?);
            }
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    ///
    /// Every `[[site]]` must name its `source_dir`.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        self.build_resolved = BuildConfig {
            destination_dir: config_dir
                .join(self.build.destination_dir.as_deref().unwrap_or("dist")),
        };

        self.sites = self
            .sites_raw
            .iter()
            .enumerate()
            .map(|(index, raw)| -> Result<SiteConfig, ConfigError> {
                let source_dir = raw.source_dir.as_deref().ok_or_else(|| {
                    ConfigError::Validation(format!("site[{index}].source_dir is required"))
                })?;
                Ok(SiteConfig {
                    source_dir: config_dir.join(source_dir),
                    statics_subdir: raw.statics.as_ref().map(PathBuf::from),
                    pages_subdir: raw.pages.as_ref().map(PathBuf::from),
                    mount_point: raw.mount_point.clone(),
                    processors: raw.processors.clone(),
                    data: raw.data.clone(),
                    routes: raw.routes.clone(),
                })
            })
            .collect::<Result<_, ConfigError>>()?;

        Ok(())
    }

    /// Convert every configured site into a [`Descriptor`].
    ///
    /// `builtin` maps an implementation id to a processor. Sites without a
    /// `processors` list get every id in `default_ids`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownProcessor` if a site names an id `builtin`
    /// does not know.
    pub fn descriptors<F>(
        &self,
        builtin: F,
        default_ids: &[&str],
    ) -> Result<Vec<Descriptor>, ConfigError>
    where
        F: Fn(&str) -> Option<Arc<dyn Processor>>,
    {
        self.sites
            .iter()
            .map(|site| site.descriptor(&builtin, default_ids))
            .collect()
    }
}

impl SiteConfig {
    fn descriptor(
        &self,
        builtin: &dyn Fn(&str) -> Option<Arc<dyn Processor>>,
        default_ids: &[&str],
    ) -> Result<Descriptor, ConfigError> {
        let entries = self.processors.clone().unwrap_or_else(|| {
            default_ids
                .iter()
                .map(|id| ProcessorEntry::Id((*id).to_owned()))
                .collect()
        });
        let mut registry = Registry::new();
        for entry in &entries {
            let processor = builtin(entry.implementation()).ok_or_else(|| {
                ConfigError::UnknownProcessor {
                    site: self.source_dir.clone(),
                    id: entry.implementation().to_owned(),
                }
            })?;
            registry.register(entry.id(), processor);
        }

        let mut descriptor = Descriptor::new(&self.source_dir)
            .with_registry(registry)
            .with_data(self.data.clone());
        if let Some(statics) = &self.statics_subdir {
            descriptor = descriptor.with_statics(statics);
        }
        if let Some(pages) = &self.pages_subdir {
            descriptor = descriptor.with_pages(pages);
        }
        if let Some(mount_point) = &self.mount_point {
            descriptor = descriptor.with_mount_point(mount_point);
        }

        let routes = self
            .routes
            .iter()
            .map(|(path, source)| route(&descriptor, path, source))
            .collect();
        Ok(descriptor.with_dynamic_routes(DynamicRoutes::List(routes)))
    }
}

fn route(descriptor: &Descriptor, path: &str, source: &RouteSource) -> DynamicRoute {
    let render = match source {
        RouteSource::Text(text) => {
            let text = text.clone();
            render_fn(move || {
                let text = text.clone();
                async move { Ok(Artifact::Text(text)) }
            })
        }
        RouteSource::Process(logical) => {
            let context = descriptor.context();
            let logical = logical.clone();
            render_fn(move || {
                let context = context.clone();
                let logical = logical.clone();
                async move { context.process(&logical).await }
            })
        }
    };
    DynamicRoute::new(path, render)
}

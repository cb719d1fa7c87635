//! Application state.
//!
//! One [`SiteState`] per descriptor, looked up by URL prefix.

use std::path::PathBuf;

use drop_context::{Context, Descriptor, DynamicRoutes};
use tower_http::services::ServeDir;

use crate::error::ServerError;

/// Everything the request chain of one descriptor needs.
pub(crate) struct SiteState {
    /// Normalized mount point (`docs/api`), `None` for the root site.
    pub(crate) mount_point: Option<String>,
    pub(crate) source_dir: PathBuf,
    pub(crate) statics: Option<ServeDir>,
    pub(crate) pages_dir: Option<PathBuf>,
    pub(crate) dynamic_routes: DynamicRoutes,
    pub(crate) context: Context,
}

impl SiteState {
    fn new(descriptor: &Descriptor) -> Self {
        Self {
            mount_point: descriptor.normalized_mount_point().map(str::to_owned),
            source_dir: descriptor.source_dir.clone(),
            statics: descriptor
                .statics_dir()
                .map(|dir| ServeDir::new(dir).append_index_html_on_directories(true)),
            pages_dir: descriptor.pages_dir(),
            dynamic_routes: descriptor.dynamic_routes.clone(),
            context: descriptor.context(),
        }
    }

    /// Strip this site's mount point from `path`.
    ///
    /// Returns the remaining URL path (always starting with `/`), or `None`
    /// if `path` lies outside the mount point.
    pub(crate) fn strip_mount<'a>(&self, path: &'a str) -> Option<&'a str> {
        let Some(mount_point) = &self.mount_point else {
            return Some(path);
        };
        let rest = path.strip_prefix('/')?.strip_prefix(mount_point.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Mounted sites first, root site (if any) last.
    sites: Vec<SiteState>,
}

impl AppState {
    pub(crate) fn new(descriptors: &[Descriptor]) -> Result<Self, ServerError> {
        let mut sites: Vec<SiteState> = descriptors.iter().map(SiteState::new).collect();
        check_disjoint(&sites)?;
        sites.sort_by_key(|site| site.mount_point.is_none());
        Ok(Self { sites })
    }

    /// Site responsible for `path`, with the path relative to its mount point.
    pub(crate) fn site_for<'a>(&self, path: &'a str) -> Option<(&SiteState, &'a str)> {
        self.sites
            .iter()
            .find_map(|site| site.strip_mount(path).map(|rest| (site, rest)))
    }
}

fn check_disjoint(sites: &[SiteState]) -> Result<(), ServerError> {
    for (i, a) in sites.iter().enumerate() {
        for b in &sites[i + 1..] {
            if overlaps(a.mount_point.as_deref(), b.mount_point.as_deref()) {
                return Err(ServerError::MountConflict {
                    first: display_mount(a.mount_point.as_deref()),
                    second: display_mount(b.mount_point.as_deref()),
                });
            }
        }
    }
    Ok(())
}

/// Two mount points overlap when equal or when one is a segment prefix of the other.
fn overlaps(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a == b
                || a.strip_prefix(b).is_some_and(|rest| rest.starts_with('/'))
                || b.strip_prefix(a).is_some_and(|rest| rest.starts_with('/'))
        }
        _ => false,
    }
}

fn display_mount(mount_point: Option<&str>) -> String {
    mount_point.map_or_else(|| "/".to_owned(), |m| format!("/{m}"))
}

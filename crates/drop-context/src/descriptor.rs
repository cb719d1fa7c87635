//! Build/serve descriptors and dynamic routes.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use crate::context::{Context, ContextData};
use crate::processor::Registry;
use crate::{Artifact, BoxFuture, ProcessError};

/// Zero-argument producer of a generated page.
pub type RenderFn =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Artifact, ProcessError>> + Send + Sync>;

/// Wrap an async closure as a [`RenderFn`].
pub fn render_fn<F, Fut>(f: F) -> RenderFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Artifact, ProcessError>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// A generated output path that is not backed by a source file.
#[derive(Clone)]
pub struct DynamicRoute {
    /// Logical output path, relative to the descriptor's mount point.
    pub path: String,
    render: RenderFn,
}

impl DynamicRoute {
    pub fn new(path: impl Into<String>, render: RenderFn) -> Self {
        Self {
            path: path.into(),
            render,
        }
    }

    /// Produce the route's content.
    pub async fn render(&self) -> Result<Artifact, ProcessError> {
        (self.render)().await
    }
}

impl fmt::Debug for DynamicRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRoute")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Dynamic routes declared either as a path → render mapping or as a list.
#[derive(Clone)]
pub enum DynamicRoutes {
    Mapping(BTreeMap<String, RenderFn>),
    List(Vec<DynamicRoute>),
}

impl Default for DynamicRoutes {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl DynamicRoutes {
    /// Normalize to a list. List form keeps declaration order.
    #[must_use]
    pub fn to_list(&self) -> Vec<DynamicRoute> {
        match self {
            Self::List(routes) => routes.clone(),
            Self::Mapping(map) => map
                .iter()
                .map(|(path, render)| DynamicRoute::new(path.clone(), Arc::clone(render)))
                .collect(),
        }
    }

    /// Find the route whose path equals `path` exactly.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<DynamicRoute> {
        match self {
            Self::List(routes) => routes.iter().find(|r| r.path == path).cloned(),
            Self::Mapping(map) => map
                .get(path)
                .map(|render| DynamicRoute::new(path, Arc::clone(render))),
        }
    }
}

impl fmt::Debug for DynamicRoutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<_> = self.to_list().into_iter().map(|r| r.path).collect();
        f.debug_list().entries(paths).finish()
    }
}

/// One source tree's build/serve configuration.
///
/// Descriptors are independent: each gets its own [`Context`] and its own
/// destination subfolder (or URL prefix) given by `mount_point`.
#[derive(Clone, Debug)]
pub struct Descriptor {
    pub source_dir: PathBuf,
    /// Directory of files copied or served verbatim, relative to `source_dir`.
    pub statics_subdir: Option<PathBuf>,
    /// Directory of processed pages, relative to `source_dir`.
    pub pages_subdir: Option<PathBuf>,
    pub registry: Arc<Registry>,
    pub data: Arc<ContextData>,
    pub dynamic_routes: DynamicRoutes,
    pub mount_point: Option<String>,
}

impl Descriptor {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            statics_subdir: None,
            pages_subdir: None,
            registry: Arc::new(Registry::new()),
            data: Arc::new(ContextData::new()),
            dynamic_routes: DynamicRoutes::default(),
            mount_point: None,
        }
    }

    #[must_use]
    pub fn with_statics(mut self, subdir: impl Into<PathBuf>) -> Self {
        self.statics_subdir = Some(subdir.into());
        self
    }

    #[must_use]
    pub fn with_pages(mut self, subdir: impl Into<PathBuf>) -> Self {
        self.pages_subdir = Some(subdir.into());
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: ContextData) -> Self {
        self.data = Arc::new(data);
        self
    }

    #[must_use]
    pub fn with_dynamic_routes(mut self, routes: DynamicRoutes) -> Self {
        self.dynamic_routes = routes;
        self
    }

    #[must_use]
    pub fn with_mount_point(mut self, mount_point: impl Into<String>) -> Self {
        self.mount_point = Some(mount_point.into());
        self
    }

    /// A fresh context rooted at `source_dir`.
    #[must_use]
    pub fn context(&self) -> Context {
        Context::new(
            self.source_dir.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.data),
        )
    }

    /// Absolute statics directory, if configured.
    #[must_use]
    pub fn statics_dir(&self) -> Option<PathBuf> {
        self.statics_subdir.as_ref().map(|d| self.source_dir.join(d))
    }

    /// Absolute pages directory, if configured.
    #[must_use]
    pub fn pages_dir(&self) -> Option<PathBuf> {
        self.pages_subdir.as_ref().map(|d| self.source_dir.join(d))
    }

    /// Mount point without surrounding slashes; `None` for the root.
    #[must_use]
    pub fn normalized_mount_point(&self) -> Option<&str> {
        self.mount_point
            .as_deref()
            .map(|m| m.trim_matches('/'))
            .filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_route(text: &'static str) -> RenderFn {
        render_fn(move || async move { Ok(Artifact::Text(text.to_owned())) })
    }

    #[test]
    fn test_list_keeps_declaration_order() {
        let routes = DynamicRoutes::List(vec![
            DynamicRoute::new("z.txt", text_route("z")),
            DynamicRoute::new("a.txt", text_route("a")),
        ]);

        let paths: Vec<_> = routes.to_list().into_iter().map(|r| r.path).collect();

        assert_eq!(paths, vec!["z.txt", "a.txt"]);
    }

    #[test]
    fn test_mapping_to_list() {
        let mut map = BTreeMap::new();
        map.insert("feed.xml".to_owned(), text_route("<rss/>"));
        map.insert("robots.txt".to_owned(), text_route("User-agent: *"));

        let routes = DynamicRoutes::Mapping(map);

        assert_eq!(routes.to_list().len(), 2);
        assert!(routes.find("robots.txt").is_some());
        assert!(routes.find("missing.txt").is_none());
    }

    #[tokio::test]
    async fn test_route_render() {
        let routes =
            DynamicRoutes::List(vec![DynamicRoute::new("gen.txt", text_route("generated"))]);

        let route = routes.find("gen.txt").unwrap();
        let result = route.render().await.unwrap();

        assert_eq!(result.as_text(), Some("generated"));
    }

    #[test]
    fn test_normalized_mount_point() {
        let root = Descriptor::new("/site");
        let slash = Descriptor::new("/site").with_mount_point("/");
        let docs = Descriptor::new("/site").with_mount_point("/docs/");

        assert_eq!(root.normalized_mount_point(), None);
        assert_eq!(slash.normalized_mount_point(), None);
        assert_eq!(docs.normalized_mount_point(), Some("docs"));
    }

    #[test]
    fn test_directories() {
        let desc = Descriptor::new("/site").with_statics("static").with_pages("pages");

        assert_eq!(desc.statics_dir(), Some(PathBuf::from("/site/static")));
        assert_eq!(desc.pages_dir(), Some(PathBuf::from("/site/pages")));
        assert_eq!(desc.context().root_dir(), std::path::Path::new("/site"));
    }
}

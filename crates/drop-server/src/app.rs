//! Router construction.
//!
//! All requests go to a single fallback that picks the site by mount point.

use std::sync::Arc;

use axum::Router;
use drop_context::Descriptor;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router for a set of descriptors.
///
/// # Errors
///
/// Returns [`ServerError::MountConflict`] if two descriptors share a URL prefix.
pub fn create_router(descriptors: &[Descriptor]) -> Result<Router, ServerError> {
    let state = Arc::new(AppState::new(descriptors)?);

    Ok(Router::new()
        .fallback(handlers::dispatch)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::content_type_options_layer())
                .layer(security::referrer_policy_layer()),
        )
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use drop_context::{
        Artifact, DynamicRoute, DynamicRoutes, ProcessError, ProcessorInput, processor_fn,
        render_fn,
    };
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn routes() -> DynamicRoutes {
        DynamicRoutes::List(vec![
            DynamicRoute::new(
                "feed.json",
                render_fn(|| async { Ok(Artifact::Data(serde_json::json!({"items": [1]}))) }),
            ),
            DynamicRoute::new(
                "news.html",
                render_fn(|| async { Ok(Artifact::Text("route news".to_owned())) }),
            ),
            DynamicRoute::new("skip.html", render_fn(|| async { Ok(Artifact::Nothing) })),
            DynamicRoute::new(
                "boom.html",
                render_fn(|| async { Err(ProcessError::transform("route exploded")) }),
            ),
        ])
    }

    fn fixture(root: &Path) -> Descriptor {
        write(root, "static/logo.txt", "logo");
        write(root, "static/about.html", "static about");
        write(root, "pages/about.html.md", "---\nprocessors: [markdown]\n---\npage about\n");
        write(root, "pages/index.html.md", "---\nprocessors: [markdown]\n---\n# Home\n");
        write(root, "pages/guide.md", "---\nprocessors: [markdown]\n---\n*guide*\n");
        write(root, "pages/news.html.md", "---\nprocessors: [markdown]\n---\npage news\n");
        write(root, "pages/skip.html.md", "---\nprocessors: [markdown]\n---\nskipped to page\n");
        write(root, "pages/plain.html", "no front matter");
        write(root, "pages/dup.md", "a");
        write(root, "pages/dup.txt", "b");
        write(root, "pages/blog/index.md", "---\nprocessors: [markdown]\n---\nblog\n");

        Descriptor::new(root)
            .with_statics("static")
            .with_pages("pages")
            .with_registry(drop_processors::default_registry())
            .with_dynamic_routes(routes())
    }

    async fn get(router: &Router, uri: &str) -> Response {
        router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_static_file_served_first() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let logo = get(&router, "/logo.txt").await;
        assert_eq!(logo.status(), StatusCode::OK);
        assert_eq!(body_text(logo).await, "logo");

        let about = get(&router, "/about.html").await;
        assert_eq!(body_text(about).await, "static about");
    }

    #[tokio::test]
    async fn test_static_html_extensions_and_htm_index() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "static/contact.html", "static contact");
        write(dir.path(), "static/old.htm", "old page");
        write(dir.path(), "static/legacy/index.htm", "legacy index");
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let contact = get(&router, "/contact").await;
        assert_eq!(contact.status(), StatusCode::OK);
        assert_eq!(body_text(contact).await, "static contact");

        assert_eq!(body_text(get(&router, "/old").await).await, "old page");
        assert_eq!(body_text(get(&router, "/legacy/").await).await, "legacy index");
        assert_eq!(body_text(get(&router, "/about").await).await, "static about");
    }

    #[tokio::test]
    async fn test_static_index_wins_at_root() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "static/index.html", "static home");
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let index = get(&router, "/").await;

        assert_eq!(index.status(), StatusCode::OK);
        assert_eq!(body_text(index).await, "static home");
    }

    #[tokio::test]
    async fn test_static_index_under_mount_point() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "static/index.html", "mounted home");
        let router = create_router(&[fixture(dir.path()).with_mount_point("site")]).unwrap();

        let slash = get(&router, "/site/").await;
        assert_eq!(slash.status(), StatusCode::OK);
        assert_eq!(body_text(slash).await, "mounted home");

        let bare = get(&router, "/site").await;
        assert_eq!(bare.status(), StatusCode::OK);
        assert_eq!(body_text(bare).await, "mounted home");
    }

    #[tokio::test]
    async fn test_dynamic_route_before_page() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let news = get(&router, "/news").await;
        assert_eq!(news.status(), StatusCode::OK);
        assert_eq!(body_text(news).await, "route news");

        let feed = get(&router, "/feed.json").await;
        assert_eq!(feed.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_text(feed).await, "{\n  \"items\": [\n    1\n  ]\n}");
    }

    #[tokio::test]
    async fn test_route_rendering_nothing_falls_through_to_page() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let response = get(&router, "/skip").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<p>skipped to page</p>\n");
    }

    #[tokio::test]
    async fn test_route_error_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let response = get(&router, "/boom").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("route exploded"));
    }

    #[tokio::test]
    async fn test_pages_resolved_and_processed() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let index = get(&router, "/").await;
        assert_eq!(index.status(), StatusCode::OK);
        assert_eq!(index.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body_text(index).await, "<h1>Home</h1>\n");

        let guide = get(&router, "/guide").await;
        assert_eq!(body_text(guide).await, "<p><em>guide</em></p>\n");

        let blog = get(&router, "/blog/").await;
        assert_eq!(body_text(blog).await, "<p>blog</p>\n");
    }

    #[tokio::test]
    async fn test_page_processing_to_nothing_is_404() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pages/empty.html.md", "---\nprocessors: [nothing]\n---\nignored\n");
        let registry = drop_processors::default_registry().with_processor(
            "nothing",
            processor_fn(|_input: ProcessorInput| async { Ok(Artifact::Nothing) }),
        );
        let router = create_router(&[Descriptor::new(dir.path())
            .with_pages("pages")
            .with_registry(registry)])
        .unwrap();

        let response = get(&router, "/empty").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_page_without_processors_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let response = get(&router, "/plain").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_ambiguous_page_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let response = get(&router, "/dup").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_missing_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        assert_eq!(get(&router, "/nope").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(&router, "/../secret").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_only_get_and_head() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let post = router
            .clone()
            .oneshot(Request::post("/logo.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let head = router
            .oneshot(Request::head("/guide").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(post.status(), StatusCode::NOT_FOUND);
        assert_eq!(head.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_etag_revalidation() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let first = get(&router, "/guide").await;
        let etag = first.headers()[header::ETAG].clone();
        let second = router
            .oneshot(
                Request::get("/guide")
                    .header(header::IF_NONE_MATCH, etag)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_mounted_site() {
        let main = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        write(docs.path(), "pages/intro.md", "---\nprocessors: [markdown]\n---\nintro\n");
        let router = create_router(&[
            fixture(main.path()),
            Descriptor::new(docs.path())
                .with_pages("pages")
                .with_registry(drop_processors::default_registry())
                .with_mount_point("docs"),
        ])
        .unwrap();

        let intro = get(&router, "/docs/intro").await;
        assert_eq!(body_text(intro).await, "<p>intro</p>\n");

        assert_eq!(get(&router, "/docs/guide").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(&router, "/guide").await.status(), StatusCode::OK);
    }

    #[test]
    fn test_mount_conflict() {
        let err = create_router(&[
            Descriptor::new("/a").with_mount_point("docs"),
            Descriptor::new("/b").with_mount_point("docs/api"),
        ])
        .unwrap_err();

        assert!(matches!(err, ServerError::MountConflict { .. }));
    }

    #[tokio::test]
    async fn test_security_headers() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(&[fixture(dir.path())]).unwrap();

        let response = get(&router, "/guide").await;

        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }
}

//! HTTP request handlers.
//!
//! Every request runs through the chain of the site owning its URL prefix:
//! statics, then dynamic routes, then pages, then a 404. A state hands the
//! request on only when it has nothing to say.

mod pages;
mod routes;
mod statics;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use crate::error::ServerError;
use crate::response::artifact_response;
use crate::state::{AppState, SiteState};

/// Fallback handler: dispatch to the owning site and run its chain.
pub(crate) async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let path = request.uri().path().to_owned();

    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return ServerError::NotFound(path).into_response();
    }
    let Some((site, rest)) = state.site_for(&path) else {
        return ServerError::NotFound(path).into_response();
    };
    let rest = rest.to_owned();

    serve_site(site, &rest, request)
        .await
        .unwrap_or_else(|e| {
            if !matches!(e, ServerError::NotFound(_)) {
                tracing::error!(path = %path, error = %e, "Request failed");
            }
            e.into_response()
        })
}

async fn serve_site(
    site: &SiteState,
    url_path: &str,
    request: Request,
) -> Result<Response, ServerError> {
    let (parts, _) = request.into_parts();
    if let Some(response) = statics::serve(site, url_path, &parts).await {
        return Ok(response);
    }

    let (logical, html_appended) = expand_url_path(url_path);
    let artifact = match routes::render(site, &logical).await? {
        Some(artifact) => artifact,
        None => pages::render(site, &logical, html_appended)
            .await?
            .ok_or_else(|| ServerError::NotFound(url_path.to_owned()))?,
    };

    artifact_response(&logical, artifact, &parts.headers)
}

/// Map a URL path to the logical file it requests.
///
/// - `projects/` → `projects/index.html`
/// - `projects/bla` → `projects/bla.html`
/// - `projects/bla.pdf` → `projects/bla.pdf`
///
/// The result is percent-decoded and has no leading slash. No filesystem
/// access.
pub fn map_url_to_logical_path(url_path: &str) -> String {
    expand_url_path(url_path).0
}

/// Like [`map_url_to_logical_path`], also reporting whether `.html` was appended.
fn expand_url_path(url_path: &str) -> (String, bool) {
    let decoded = percent_decode_str(url_path).decode_utf8_lossy();
    let path = decoded.strip_prefix('/').unwrap_or(decoded.as_ref());

    if path.is_empty() || path.ends_with('/') {
        return (format!("{path}index.html"), true);
    }
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if std::path::Path::new(file_name).extension().is_none() {
        return (format!("{path}.html"), true);
    }
    (path.to_owned(), false)
}

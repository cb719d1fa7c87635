//! Static file state: `ServeDir` over the site's statics directory.

use std::path::Path;

use axum::body::Body;
use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::Response;
use tower::ServiceExt;

use crate::state::SiteState;

/// Serve `url_path` from the statics directory.
///
/// Extensionless paths also try `.html` and `.htm`, and directories fall back
/// from `index.html` to `index.htm`. Returns `None` when the site has no
/// statics or no candidate exists.
pub(super) async fn serve(site: &SiteState, url_path: &str, parts: &Parts) -> Option<Response> {
    let serve_dir = site.statics.as_ref()?;

    for candidate in candidates(url_path) {
        let uri = match parts.uri.query() {
            Some(query) => format!("{candidate}?{query}"),
            None => candidate,
        };
        let mut attempt = Request::new(Body::empty());
        *attempt.method_mut() = parts.method.clone();
        *attempt.uri_mut() = uri.parse::<Uri>().ok()?;
        *attempt.headers_mut() = parts.headers.clone();

        let response = match serve_dir.clone().oneshot(attempt).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        if response.status() == StatusCode::NOT_FOUND {
            continue;
        }

        let mut response = response.map(Body::new);
        if let Some(mount_point) = &site.mount_point {
            remount_location(&mut response, mount_point);
        }
        return Some(response);
    }
    None
}

/// URL paths to try in order for `url_path`.
fn candidates(url_path: &str) -> Vec<String> {
    let mut candidates = vec![url_path.to_owned()];
    if url_path.ends_with('/') {
        candidates.push(format!("{url_path}index.htm"));
        return candidates;
    }
    let file_name = url_path.rsplit('/').next().unwrap_or(url_path);
    if Path::new(file_name).extension().is_none() {
        candidates.push(format!("{url_path}.html"));
        candidates.push(format!("{url_path}.htm"));
    }
    candidates
}

/// Prefix a directory redirect's `Location` with the mount point.
fn remount_location(response: &mut Response, mount_point: &str) {
    if !response.status().is_redirection() {
        return;
    }
    let Some(location) = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with('/'))
    else {
        return;
    };
    if let Ok(value) = HeaderValue::from_str(&format!("/{mount_point}{location}")) {
        response.headers_mut().insert(header::LOCATION, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_candidates() {
        assert_eq!(candidates("/"), ["/", "/index.htm"]);
        assert_eq!(candidates("/legacy/"), ["/legacy/", "/legacy/index.htm"]);
        assert_eq!(
            candidates("/contact"),
            ["/contact", "/contact.html", "/contact.htm"]
        );
        assert_eq!(candidates("/logo.txt"), ["/logo.txt"]);
        assert_eq!(
            candidates("/v1.2/notes"),
            ["/v1.2/notes", "/v1.2/notes.html", "/v1.2/notes.htm"]
        );
    }

    #[test]
    fn test_remount_location() {
        let mut response = Response::builder()
            .status(StatusCode::TEMPORARY_REDIRECT)
            .header(header::LOCATION, "/guide/")
            .body(Body::empty())
            .unwrap();

        remount_location(&mut response, "docs");

        assert_eq!(response.headers()[header::LOCATION], "/docs/guide/");
    }

    #[test]
    fn test_remount_ignores_success() {
        let mut response = Response::builder()
            .header(header::LOCATION, "/guide/")
            .body(Body::empty())
            .unwrap();

        remount_location(&mut response, "docs");

        assert_eq!(response.headers()[header::LOCATION], "/guide/");
    }
}

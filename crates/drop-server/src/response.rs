//! Turning artifacts into HTTP responses.

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use drop_context::Artifact;
use md5::{Digest, Md5};

use crate::error::ServerError;

/// Build a 200 response for `artifact`, or 304 if the client's copy is current.
///
/// The content type is guessed from the requested file name; data is JSON.
pub(crate) fn artifact_response(
    logical: &str,
    artifact: Artifact,
    request_headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let content_type = match &artifact {
        Artifact::Data(_) => "application/json".to_owned(),
        Artifact::Callable(_) => return Err(ServerError::Unservable(logical.to_owned())),
        _ => content_type_for(logical),
    };
    let body = artifact.into_bytes()?.unwrap_or_default();

    let etag = compute_etag(&body);
    if let Some(if_none_match) = request_headers.get(header::IF_NONE_MATCH)
        && if_none_match.as_bytes() == etag.as_bytes()
    {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        [(header::CONTENT_TYPE, content_type), (header::ETAG, etag)],
        body,
    )
        .into_response())
}

/// MIME type for a file name, with an explicit charset for text.
fn content_type_for(logical: &str) -> String {
    let mime = mime_guess::from_path(logical).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_owned()
    }
}

/// Compute `ETag` from content.
///
/// MD5 truncated to 64 bits (16 hex chars).
fn compute_etag(content: &[u8]) -> String {
    let hash = Md5::digest(content);
    format!("\"{}\"", &hex::encode(hash)[..16])
}

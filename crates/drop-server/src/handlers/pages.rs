//! Page state: process the source file behind a logical path on request.

use std::path::{Component, Path, PathBuf};

use drop_context::{Artifact, ChainPolicy, ProcessError, find_file_with_arbitrary_extension};

use crate::error::ServerError;
use crate::state::SiteState;

/// Process the page for `logical`, or `None` if no source file matches.
///
/// Pages must declare a processor chain. A page processing to nothing falls
/// through like a missing one.
pub(super) async fn render(
    site: &SiteState,
    logical: &str,
    html_appended: bool,
) -> Result<Option<Artifact>, ServerError> {
    let Some(pages_dir) = &site.pages_dir else {
        return Ok(None);
    };
    if !Path::new(logical)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Ok(None);
    }

    let Some(file) = find_page(pages_dir, logical, html_appended).await? else {
        return Ok(None);
    };
    let relative = file.strip_prefix(&site.source_dir).unwrap_or(&file);

    tracing::debug!(logical, file = %file.display(), "Processing page");
    match site
        .context
        .process_with(relative, ChainPolicy::Required)
        .await?
    {
        Artifact::Nothing => Ok(None),
        artifact => Ok(Some(artifact)),
    }
}

/// Look up the source file for `logical` below `pages_dir`.
///
/// Tried in order: the exact file, `<logical>.<anything>`, and when `.html`
/// was appended to the URL, `<stem>.<anything>`.
async fn find_page(
    pages_dir: &Path,
    logical: &str,
    html_appended: bool,
) -> Result<Option<PathBuf>, ProcessError> {
    let exact = pages_dir.join(logical);
    if tokio::fs::metadata(&exact).await.is_ok_and(|m| m.is_file()) {
        return Ok(Some(exact));
    }
    if let Some(found) = find_file_with_arbitrary_extension(&exact).await? {
        return Ok(Some(found));
    }
    match logical.strip_suffix(".html") {
        Some(stem) if html_appended => {
            find_file_with_arbitrary_extension(&pages_dir.join(stem)).await
        }
        _ => Ok(None),
    }
}

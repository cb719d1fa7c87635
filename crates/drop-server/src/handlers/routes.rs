//! Dynamic route state.

use drop_context::Artifact;

use crate::error::ServerError;
use crate::state::SiteState;

/// Render the dynamic route registered for `logical`.
///
/// A missing route and a route rendering nothing both fall through.
pub(super) async fn render(
    site: &SiteState,
    logical: &str,
) -> Result<Option<Artifact>, ServerError> {
    let Some(route) = site.dynamic_routes.find(logical) else {
        return Ok(None);
    };

    tracing::debug!(route = %route.path, "Rendering dynamic route");
    match route.render().await? {
        Artifact::Nothing => Ok(None),
        artifact => Ok(Some(artifact)),
    }
}

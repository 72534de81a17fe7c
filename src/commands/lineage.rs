use tracing::{info, warn};

use super::{CommandError, ValidationError};
use crate::api::models::VersionSnapshot;
use crate::api::ApiError;
use crate::lineage::LineageView;
use crate::session::Session;

/// Fetches the snapshot history of one chunk, in backend order.
pub async fn resolve(
    session: &Session,
    url: &str,
    chunk_id: Option<i64>,
) -> Result<Vec<VersionSnapshot>, ApiError> {
    session.client().versions(url, chunk_id).await
}

/// Loads lineage for `url`/`chunk_id` and makes it the displayed lineage.
/// A failed load leaves the previous lineage displayed.
pub async fn open_lineage(
    session: &Session,
    url: &str,
    chunk_id: Option<i64>,
) -> Result<LineageView, CommandError> {
    let snapshots = match resolve(session, url, chunk_id).await {
        Ok(snapshots) => snapshots,
        Err(e) => {
            warn!(url, error = %e, "failed to load lineage");
            return Err(e.into());
        }
    };
    let view = LineageView::new(url, chunk_id, &snapshots);
    info!(url, versions = view.total, "lineage loaded");
    session.set_lineage(view.clone());
    Ok(view)
}

/// Opens lineage for result `result` of message `message`.
pub async fn open_result_lineage(
    session: &Session,
    message: usize,
    result: usize,
) -> Result<LineageView, CommandError> {
    let target = session
        .conversation()
        .result(message, result)
        .map(|r| (r.url.clone(), r.chunk_id));
    let (url, chunk_id) = target.ok_or(ValidationError::UnknownResult { message, result })?;
    open_lineage(session, &url, chunk_id).await
}

use axum::extract::{Path, State};
use axum::Json;
use rollback_core::tracker::{RevisionState, TrackerSnapshot};

use crate::state::AppState;

/// GET /api/tracker: every pending and completed revision.
pub async fn get_tracker(State(app): State<AppState>) -> Json<TrackerSnapshot> {
    Json(app.tracker.snapshot())
}

/// GET /api/tracker/{revision}: state of one revision, `null` when untracked.
pub async fn get_revision(
    State(app): State<AppState>,
    Path(revision): Path<String>,
) -> Json<Option<RevisionState>> {
    Json(app.tracker.state_of(&revision))
}

//! Route definitions for floor resolution.

use axum::routing::post;
use axum::Router;

use crate::handlers::floors;
use crate::state::AppState;

/// Routes mounted at `/accounts`.
///
/// ```text
/// POST   /{account_id}/floors               -> resolve
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{account_id}/floors", post(floors::resolve))
}

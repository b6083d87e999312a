pub mod floors;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /accounts/{account_id}/floors                    resolve floors (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/accounts", floors::router())
}

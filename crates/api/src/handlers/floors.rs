//! Handlers for the `/accounts/{account_id}/floors` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use floors_core::{
    account_for_request, enrich_with_floors, floors_enabled, random_draw, should_enforce_floors,
    BidRequest, FetchStatus,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Result of resolving floors for one bid request.
#[derive(Debug, Serialize)]
pub struct FloorsResponse {
    /// The request with floors applied and the resolved document written
    /// back into `ext.prebid.floors`.
    pub request: BidRequest,
    pub fetch_status: FetchStatus,
    /// Whether floors are enforced for this auction.
    pub enforced: bool,
    /// Non-fatal problems found while resolving floors.
    pub diagnostics: Vec<String>,
}

/// POST /api/v1/accounts/{account_id}/floors
pub async fn resolve(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    payload: Result<Json<BidRequest>, JsonRejection>,
) -> AppResult<Json<FloorsResponse>> {
    let Json(mut request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let account = state
        .accounts
        .get(&account_id)
        .ok_or_else(|| AppError::AccountNotFound(account_id.clone()))?;
    let account = account_for_request(account, &account_id, &request);

    let enabled = floors_enabled(&account, &request);
    let fetched = if enabled {
        state.fetcher.fetch(&account).await
    } else {
        (None, FetchStatus::None)
    };
    let fetch_status = fetched.1;

    let errors = enrich_with_floors(
        &mut request,
        &account,
        fetched,
        state.conversions.as_ref(),
        random_draw,
    );

    let enforced = enabled
        && request
            .floors_mut()
            .is_some_and(|floors| {
                should_enforce_floors(floors, account.enforce_floors_rate, random_draw)
            });

    tracing::debug!(
        account_id = %account_id,
        request_id = %request.id,
        fetch_status = ?fetch_status,
        enforced,
        diagnostics = errors.len(),
        "Resolved floors",
    );

    Ok(Json(FloorsResponse {
        request,
        fetch_status,
        enforced,
        diagnostics: errors.iter().map(ToString::to_string).collect(),
    }))
}

//! Request enrichment: choose the floor document for a request (fetched,
//! inline, or none), merge the two sources when both exist, and apply it.
//!
//! Everything here is synchronous. The caller asks the fetch scheduler
//! first (using [`account_for_request`]) and hands the result to
//! [`enrich_with_floors`].

use crate::account::AccountFloorConfig;
use crate::currency::Conversions;
use crate::error::FloorError;
use crate::openrtb::BidRequest;
use crate::resolver::{modify_imps_with_floors, round_to_four_decimals};
use crate::rules::{FetchStatus, FloorLocation, FloorRulesDocument};
use crate::selection::select_floor_model_group;
use crate::validation::{select_valid_model_groups, validate_floor_params, ModelGroupLimits};

/// Floors apply unless the account or the request turns them off.
pub fn floors_enabled(account: &AccountFloorConfig, request: &BidRequest) -> bool {
    account.enabled && request.floors().and_then(|f| f.enabled) != Some(false)
}

/// Account config as seen by the fetch scheduler for this request.
///
/// A request-level `floorendpoint.url` replaces the configured fetch URL.
pub fn account_for_request(
    account: &AccountFloorConfig,
    account_id: &str,
    request: &BidRequest,
) -> AccountFloorConfig {
    let mut config = account.clone();
    if let Some(url) = request.floors().and_then(FloorRulesDocument::endpoint_url) {
        config.fetch.url = url.to_string();
    }
    config.fetch.account_id = account_id.to_string();
    config
}

fn limits_for(account: &AccountFloorConfig, location: Option<FloorLocation>) -> ModelGroupLimits {
    let mut limits = account.limits();
    if location == Some(FloorLocation::Fetch) {
        limits.max_rules = account.fetch.max_rules;
    }
    limits
}

/// Floor minimum of the merged document, in the fetched data's currency
/// when a conversion is possible.
fn merged_floor_min(
    request: &FloorRulesDocument,
    fetched: &FloorRulesDocument,
    conversions: &dyn Conversions,
) -> (f64, String) {
    let mut request_cur = request.floor_min_cur.clone();
    if request_cur.is_empty() {
        if let Some(data) = &request.data {
            request_cur = data.currency.clone();
        }
    }
    let provider_cur = fetched
        .data
        .as_ref()
        .map(|d| d.currency.clone())
        .unwrap_or_default();

    if request_cur.is_empty() {
        return (request.floor_min, provider_cur);
    }

    if !provider_cur.is_empty() && !request_cur.eq_ignore_ascii_case(&provider_cur) {
        match conversions.rate(&request_cur, &provider_cur) {
            Ok(rate) => {
                return (
                    round_to_four_decimals(rate * request.floor_min),
                    provider_cur,
                )
            }
            Err(e) => tracing::debug!(error = %e, "Keeping request floor minimum unconverted"),
        }
    }
    (request.floor_min, request_cur)
}

/// Merge request-level settings into a fetched document.
///
/// The fetched document is the base; the request contributes enforcement,
/// the floor minimum and the endpoint.
pub fn merge_floors(
    request: Option<&FloorRulesDocument>,
    fetched: FloorRulesDocument,
    conversions: &dyn Conversions,
) -> FloorRulesDocument {
    let mut merged = fetched;
    if merged.enforcement.is_none() {
        merged.enforcement = Some(Default::default());
    }

    let Some(request) = request else {
        return merged;
    };

    if request.enabled.is_some() {
        merged.enabled = request.enabled;
    }
    if let Some(enforcement) = &request.enforcement {
        merged.enforcement = Some(enforcement.clone());
    }

    let (floor_min, floor_min_cur) = merged_floor_min(request, &merged, conversions);
    if floor_min > 0.0 {
        merged.floor_min = floor_min;
        merged.floor_min_cur = floor_min_cur;
    }

    if request.endpoint_url().is_some() {
        merged.endpoint = request.endpoint.clone();
    }
    merged
}

/// Validate `source` and reduce it to a single model group, stamped with
/// where it came from.
fn build_floors(
    source: Option<FloorRulesDocument>,
    limits: ModelGroupLimits,
    status: FetchStatus,
    location: FloorLocation,
    draw: &mut impl FnMut(i32) -> i32,
) -> (FloorRulesDocument, Vec<FloorError>) {
    let mut result = FloorRulesDocument {
        fetch_status: Some(status),
        location: Some(location),
        ..Default::default()
    };

    let Some(mut floors) = source else {
        return (result, Vec::new());
    };
    if let Err(e) = validate_floor_params(&floors) {
        return (result, vec![e]);
    }
    result.enforcement = floors.enforcement.clone();

    let Some(data) = floors.data.as_mut() else {
        return (result, Vec::new());
    };
    let (mut groups, errors) = select_valid_model_groups(&data.model_groups, limits);
    if groups.is_empty() {
        return (result, errors);
    }
    if groups.len() > 1 {
        select_floor_model_group(&mut groups, &mut *draw);
    }
    data.model_groups = groups;

    floors.fetch_status = Some(status);
    floors.location = Some(location);
    (floors, errors)
}

/// Pick the floor document for this request.
///
/// A successful fetch wins (merged with the inline document), then the
/// inline document, then an empty `noData` document.
pub fn resolve_floors(
    account: &AccountFloorConfig,
    request: &BidRequest,
    fetched: Option<FloorRulesDocument>,
    fetch_status: FetchStatus,
    conversions: &dyn Conversions,
    mut draw: impl FnMut(i32) -> i32,
) -> (FloorRulesDocument, Vec<FloorError>) {
    let inline = request.floors();

    if let (FetchStatus::Success, Some(fetched)) = (fetch_status, fetched) {
        let merged = merge_floors(inline, fetched, conversions);
        let limits = limits_for(account, Some(FloorLocation::Fetch));
        return build_floors(Some(merged), limits, fetch_status, FloorLocation::Fetch, &mut draw);
    }

    let limits = limits_for(account, Some(FloorLocation::Request));
    match inline {
        Some(doc) => build_floors(
            Some(doc.clone()),
            limits,
            fetch_status,
            FloorLocation::Request,
            &mut draw,
        ),
        None => build_floors(None, limits, fetch_status, FloorLocation::NoData, &mut draw),
    }
}

/// Resolve and apply floors to `request`, writing the resolved document
/// back into `ext.prebid.floors`. Returns the collected diagnostics.
pub fn enrich_with_floors(
    request: &mut BidRequest,
    account: &AccountFloorConfig,
    fetched: (Option<FloorRulesDocument>, FetchStatus),
    conversions: &dyn Conversions,
    mut draw: impl FnMut(i32) -> i32,
) -> Vec<FloorError> {
    if !floors_enabled(account, request) {
        return vec![FloorError::Disabled];
    }

    let (fetched_doc, fetch_status) = fetched;
    let (mut floors, mut errors) =
        resolve_floors(account, request, fetched_doc, fetch_status, conversions, &mut draw);

    let limits = limits_for(account, floors.location);
    errors.extend(modify_imps_with_floors(
        &mut floors,
        request,
        conversions,
        limits,
        &mut draw,
    ));

    if !errors.is_empty() {
        tracing::debug!(
            request_id = %request.id,
            count = errors.len(),
            location = ?floors.location,
            "Floor resolution produced diagnostics",
        );
    }

    request.set_floors(floors);
    errors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

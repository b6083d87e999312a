//! Per-request floor resolution.
//!
//! [`modify_imps_with_floors`] runs on the request path: it settles on a
//! single model group, decides whether floors are skipped, and writes a
//! floor onto every impression that resolves to a non-zero value.

use crate::context::create_rule_key;
use crate::currency::Conversions;
use crate::error::FloorError;
use crate::matching::find_rule;
use crate::openrtb::{BidRequest, Imp};
use crate::rules::{FloorRulesDocument, DEFAULT_DELIMITER};
use crate::selection::{select_floor_model_group, should_skip_floors};
use crate::validation::{
    select_valid_model_groups, validate_rules_and_lower_keys, validate_skip_rates,
    ModelGroupLimits,
};

/// Round to 4 decimal places.
pub fn round_to_four_decimals(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Resolve the floor minimum for one impression, in `floor_currency`.
///
/// An impression-level `floormin`/`floormincur` overrides the document
/// values. Converts when the minimum's currency differs from the floor
/// currency; a missing rate is returned as an error.
pub fn resolve_floor_min(
    doc: &FloorRulesDocument,
    imp: &Imp,
    floor_currency: &str,
    conversions: &dyn Conversions,
) -> Result<f64, FloorError> {
    let mut floor_min = round_to_four_decimals(doc.floor_min);
    let mut floor_min_cur = doc.floor_min_cur.as_str();

    if let Some(imp_floors) = imp.floors() {
        if imp_floors.floor_min > 0.0 {
            floor_min = imp_floors.floor_min;
        }
        if !imp_floors.floor_min_cur.is_empty() {
            if !doc.floor_min_cur.is_empty() && doc.floor_min_cur != imp_floors.floor_min_cur {
                tracing::debug!(
                    imp_id = %imp.id,
                    request_cur = %doc.floor_min_cur,
                    imp_cur = %imp_floors.floor_min_cur,
                    "Floor minimum currency differs between request and impression",
                );
            }
            floor_min_cur = imp_floors.floor_min_cur.as_str();
        }
    }

    if floor_min > 0.0
        && !floor_min_cur.is_empty()
        && !floor_min_cur.eq_ignore_ascii_case(floor_currency)
    {
        floor_min *= conversions.rate(floor_min_cur, floor_currency)?;
    }

    Ok(round_to_four_decimals(floor_min))
}

/// Apply the floor document to every impression of `request`.
///
/// Mutates both arguments: the document ends up holding the selected
/// model group only (or none when skipped) with `skipped` set, and each
/// impression with a non-zero resolved floor gets `bidfloor`,
/// `bidfloorcur` and `ext.prebid.floors` written. Returns every
/// diagnostic collected on the way; an empty document is a no-op.
pub fn modify_imps_with_floors(
    doc: &mut FloorRulesDocument,
    request: &mut BidRequest,
    conversions: &dyn Conversions,
    limits: ModelGroupLimits,
    mut draw: impl FnMut(i32) -> i32,
) -> Vec<FloorError> {
    if doc
        .data
        .as_ref()
        .is_none_or(|data| data.model_groups.is_empty())
    {
        return Vec::new();
    }

    let errors = validate_skip_rates(doc);
    if !errors.is_empty() {
        return errors;
    }

    let min_source = FloorRulesDocument {
        floor_min: doc.floor_min,
        floor_min_cur: doc.floor_min_cur.clone(),
        ..Default::default()
    };
    let currency = doc.currency().to_string();
    let root_skip_rate = doc.skip_rate;

    let Some(data) = doc.data.as_mut() else {
        return errors;
    };

    let (mut groups, mut errors) = select_valid_model_groups(&data.model_groups, limits);
    if groups.is_empty() {
        return errors;
    }
    if groups.len() > 1 {
        select_floor_model_group(&mut groups, &mut draw);
    }
    if groups[0].schema.delimiter.is_empty() {
        groups[0].schema.delimiter = DEFAULT_DELIMITER.to_string();
    }
    data.model_groups = groups;

    let group_skip_rate = data.model_groups[0].skip_rate;
    if should_skip_floors(group_skip_rate, data.skip_rate, root_skip_rate, &mut draw) {
        data.model_groups.clear();
        doc.skipped = Some(true);
        return errors;
    }
    doc.skipped = Some(false);

    let group = &mut data.model_groups[0];
    let delimiter = group.schema.delimiter.clone();
    errors.extend(validate_rules_and_lower_keys(
        &group.schema,
        &delimiter,
        &mut group.values,
    ));

    let group = &data.model_groups[0];
    let desired_keys: Vec<Vec<String>> = request
        .imp
        .iter()
        .map(|imp| create_rule_key(&group.schema, request, imp))
        .collect();

    for (imp, desired) in request.imp.iter_mut().zip(desired_keys) {
        let matched = find_rule(&group.values, &delimiter, &desired);
        let rule_value = matched
            .as_ref()
            .and_then(|key| group.values.get(key).copied())
            .unwrap_or(group.default);

        // Nothing matched and no default: leave the impression alone.
        if rule_value == 0.0 {
            continue;
        }

        let mut bid_floor = rule_value;
        match resolve_floor_min(&min_source, imp, &currency, conversions) {
            Ok(floor_min) if floor_min > 0.0 => bid_floor = bid_floor.max(floor_min),
            Ok(_) => {}
            Err(e) => errors.push(FloorError::FloorMin {
                imp_id: imp.id.clone(),
                reason: e.to_string(),
            }),
        }

        let bid_floor = round_to_four_decimals(bid_floor);
        imp.bid_floor = bid_floor;
        imp.bid_floor_cur = currency.clone();

        let floors = imp.floors_mut();
        floors.floor_rule = matched.unwrap_or_default();
        floors.floor_rule_value = rule_value;
        floors.floor_value = bid_floor;
    }

    errors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

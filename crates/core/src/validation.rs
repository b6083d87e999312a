//! Structural and range validation of floor-rules documents.
//!
//! Request-time validation drops what it cannot use and reports why;
//! [`validate_floor_params`] is the only check that rejects a whole
//! document. Fetch-time validation ([`validate_fetched_rules`]) is stricter
//! and all-or-nothing because a fetched document replaces a cache entry.

use std::collections::{HashMap, HashSet};

use crate::account::MAX_SCHEMA_DIMS_LIMIT;
use crate::context::dimension;
use crate::error::FloorError;
use crate::rules::{
    FloorData, FloorRulesDocument, ModelGroup, Schema, DEFAULT_DELIMITER,
    SUPPORTED_SCHEMA_VERSION,
};

/// Upper bound for every skip rate and the enforcement rate.
pub const RATE_MAX: i32 = 100;

/// Lower bound of a declared model weight.
pub const MODEL_WEIGHT_MIN: i32 = 1;

/// Upper bound of a declared model weight.
pub const MODEL_WEIGHT_MAX: i32 = 100;

fn rate_in_range(rate: i32) -> bool {
    (0..=RATE_MAX).contains(&rate)
}

/// Account-level limits applied to each model group.
///
/// Zero disables `max_rules`. `max_schema_dims` is always bounded by
/// [`MAX_SCHEMA_DIMS_LIMIT`]; zero means only that bound applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelGroupLimits {
    pub max_schema_dims: usize,
    pub max_rules: usize,
}

impl ModelGroupLimits {
    fn schema_dims_bound(&self) -> usize {
        match self.max_schema_dims {
            0 => MAX_SCHEMA_DIMS_LIMIT,
            n => n.min(MAX_SCHEMA_DIMS_LIMIT),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema / model groups
// ---------------------------------------------------------------------------

/// Reject any dimension name outside the supported set, and any name
/// listed twice.
pub fn validate_schema_dimensions(fields: &[String]) -> Result<(), FloorError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if !dimension::ALL.contains(&field.as_str()) {
            return Err(FloorError::InvalidDimension(field.clone()));
        }
        if !seen.insert(field.as_str()) {
            return Err(FloorError::DuplicateDimension(field.clone()));
        }
    }
    Ok(())
}

fn validate_model_group(group: &ModelGroup, limits: ModelGroupLimits) -> Result<(), FloorError> {
    validate_schema_dimensions(&group.schema.fields)?;

    let invalid = |reason: String| FloorError::InvalidModelGroup {
        version: group.model_version.clone(),
        reason,
    };

    let dims = group.schema.fields.len();
    let max_dims = limits.schema_dims_bound();
    if dims > max_dims {
        return Err(invalid(format!(
            "number of schema fields = '{dims}' are greater than limit {max_dims}"
        )));
    }
    let rules = group.values.len();
    if limits.max_rules > 0 && rules > limits.max_rules {
        return Err(invalid(format!(
            "number of rules = '{rules}' are greater than limit {}",
            limits.max_rules
        )));
    }
    if !rate_in_range(group.skip_rate) {
        return Err(invalid(format!(
            "SkipRate = '{}' is out of range (1-100)",
            group.skip_rate
        )));
    }
    if let Some(weight) = group.model_weight {
        if !(MODEL_WEIGHT_MIN..=MODEL_WEIGHT_MAX).contains(&weight) {
            return Err(invalid(format!(
                "ModelWeight = '{weight}' is out of range (1-100)"
            )));
        }
    }
    if group.default < 0.0 {
        return Err(invalid(format!(
            "Default = '{}' is less than 0",
            group.default
        )));
    }
    Ok(())
}

/// Keep the model groups that pass every structural check.
///
/// Each rejected group contributes exactly one error; order of the
/// surviving groups is preserved. An empty result means no floor can be
/// applied and the caller must stop.
pub fn select_valid_model_groups(
    groups: &[ModelGroup],
    limits: ModelGroupLimits,
) -> (Vec<ModelGroup>, Vec<FloorError>) {
    let mut valid = Vec::with_capacity(groups.len());
    let mut errors = Vec::new();

    for group in groups {
        match validate_model_group(group, limits) {
            Ok(()) => valid.push(group.clone()),
            Err(e) => errors.push(e),
        }
    }

    (valid, errors)
}

// ---------------------------------------------------------------------------
// Rule keys
// ---------------------------------------------------------------------------

/// Drop malformed rule keys and lower-case the rest.
///
/// Mutates `values` in place: keys whose component count differs from
/// the schema's field count are removed (one error each), mixed-case keys
/// are re-inserted in lower case.
pub fn validate_rules_and_lower_keys(
    schema: &Schema,
    delimiter: &str,
    values: &mut HashMap<String, f64>,
) -> Vec<FloorError> {
    let delimiter = if delimiter.is_empty() {
        DEFAULT_DELIMITER
    } else {
        delimiter
    };
    let expected = schema.fields.len();

    let mut dropped = Vec::new();
    values.retain(|key, _| {
        let keep = key.split(delimiter).count() == expected;
        if !keep {
            dropped.push(key.clone());
        }
        keep
    });

    let mixed_case: Vec<String> = values
        .keys()
        .filter(|k| k.chars().any(char::is_uppercase))
        .cloned()
        .collect();
    for key in mixed_case {
        if let Some(value) = values.remove(&key) {
            values.insert(key.to_lowercase(), value);
        }
    }

    dropped.sort();
    dropped
        .into_iter()
        .map(|key| FloorError::InvalidRuleKey {
            key,
            fields: schema.fields.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Document-level parameters
// ---------------------------------------------------------------------------

/// Data-level and root-level skip rates must lie in `[0, 100]`.
pub fn validate_skip_rates(doc: &FloorRulesDocument) -> Vec<FloorError> {
    let mut errors = Vec::new();
    if let Some(data) = &doc.data {
        if !rate_in_range(data.skip_rate) {
            errors.push(FloorError::InvalidSkipRate {
                rate: data.skip_rate,
                location: "ext.prebid.floors.data.skipRate",
            });
        }
    }
    if !rate_in_range(doc.skip_rate) {
        errors.push(FloorError::InvalidSkipRate {
            rate: doc.skip_rate,
            location: "ext.prebid.floors.skipRate",
        });
    }
    errors
}

/// Document-wide checks; the first violation rejects the document.
pub fn validate_floor_params(doc: &FloorRulesDocument) -> Result<(), FloorError> {
    if let Some(data) = &doc.data {
        if data.floors_schema_version != 0
            && data.floors_schema_version != SUPPORTED_SCHEMA_VERSION
        {
            return Err(FloorError::UnsupportedSchemaVersion(
                data.floors_schema_version,
            ));
        }
    }
    if let Some(e) = validate_skip_rates(doc).into_iter().next() {
        return Err(e);
    }
    if doc.floor_min < 0.0 {
        return Err(FloorError::InvalidFloorMin(doc.floor_min));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Fetch-time validation
// ---------------------------------------------------------------------------

/// Validate a freshly fetched data block before it may enter the cache.
///
/// Every model group must carry between 1 and `max_rules` rules.
pub fn validate_fetched_rules(max_rules: usize, data: &FloorData) -> Result<(), FloorError> {
    let invalid = |msg: &str| Err(FloorError::InvalidFetchedRules(msg.to_string()));

    if data.model_groups.is_empty() {
        return invalid("no model groups found in price floor data");
    }
    if !rate_in_range(data.skip_rate) {
        return invalid("skip rate should be greater than or equal to 0 and less than 100");
    }

    for group in &data.model_groups {
        if group.values.is_empty() || group.values.len() > max_rules {
            return invalid(
                "invalid number of floor rules, floor rules should be greater than zero and less than MaxRules specified in account config",
            );
        }
        if let Some(weight) = group.model_weight {
            if !(MODEL_WEIGHT_MIN..=MODEL_WEIGHT_MAX).contains(&weight) {
                return invalid(
                    "modelGroup[].modelWeight should be greater than or equal to 1 and less than 100",
                );
            }
        }
        if !rate_in_range(group.skip_rate) {
            return invalid(
                "model group skip rate should be greater than or equal to 0 and less than 100",
            );
        }
        if group.default < 0.0 {
            return invalid("modelGroup.Default should be greater than 0");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Floor-rules document model.
//!
//! Mirrors the `ext.prebid.floors` object of a bid request. The same shape
//! is produced for dynamically fetched documents, where the remote
//! endpoint serves only the [`FloorData`] part.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Wildcard token matching any value of a schema dimension.
pub const WILDCARD: &str = "*";

/// Delimiter used when a schema does not name one.
pub const DEFAULT_DELIMITER: &str = "|";

/// Currency assumed for floor values when the data block names none.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Only supported `floorsschemaversion` (0 means "not provided").
pub const SUPPORTED_SCHEMA_VERSION: i32 = 2;

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Outcome of asking the fetch scheduler for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Dynamic fetching is disabled or the URL is unusable.
    None,
    /// Cache hit with usable data.
    Success,
    /// Cache hit but the cached value carries no data.
    Error,
    /// Cache miss; a fetch has been scheduled.
    #[serde(rename = "inprogress")]
    InProgress,
}

/// Where the applied floor document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorLocation {
    #[serde(rename = "request")]
    Request,
    #[serde(rename = "fetch")]
    Fetch,
    #[serde(rename = "noData")]
    NoData,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Remote endpoint overriding the account's configured fetch URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorEndpoint {
    #[serde(default)]
    pub url: String,
}

/// Enforcement settings carried by the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enforcement {
    #[serde(rename = "enforcepbs", default, skip_serializing_if = "Option::is_none")]
    pub enforce_pbs: Option<bool>,
    #[serde(rename = "floordeals", default, skip_serializing_if = "Option::is_none")]
    pub floor_deals: Option<bool>,
    #[serde(rename = "enforcerate", default, skip_serializing_if = "is_zero_i32")]
    pub enforce_rate: i32,
}

/// Top-level floor-rules document, resolved once per auction request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorRulesDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "floorendpoint", default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<FloorEndpoint>,
    #[serde(rename = "floormin", default, skip_serializing_if = "is_zero_f64")]
    pub floor_min: f64,
    #[serde(rename = "floormincur", default, skip_serializing_if = "String::is_empty")]
    pub floor_min_cur: String,
    #[serde(rename = "skiprate", default, skip_serializing_if = "is_zero_i32")]
    pub skip_rate: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FloorData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<Enforcement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<FloorLocation>,
    #[serde(rename = "fetchstatus", default, skip_serializing_if = "Option::is_none")]
    pub fetch_status: Option<FetchStatus>,
    /// Enforcement decision taken for the current request. Never serialized.
    #[serde(skip)]
    pub enforce_decision: Option<bool>,
}

impl FloorRulesDocument {
    /// Wrap a fetched data block into a document.
    pub fn from_data(data: FloorData) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    /// Currency the floor values are expressed in.
    pub fn currency(&self) -> &str {
        self.data
            .as_ref()
            .map(FloorData::currency)
            .unwrap_or(DEFAULT_CURRENCY)
    }

    /// `true` once floor signalling has been skipped for this request.
    pub fn is_skipped(&self) -> bool {
        self.skipped == Some(true)
    }

    /// URL of the request-level endpoint override, if any.
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint
            .as_ref()
            .map(|e| e.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Data / model groups
// ---------------------------------------------------------------------------

/// Floor data block: one or more model groups plus their shared settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub currency: String,
    #[serde(rename = "skiprate", default, skip_serializing_if = "is_zero_i32")]
    pub skip_rate: i32,
    #[serde(rename = "floorsschemaversion", default, skip_serializing_if = "is_zero_i32")]
    pub floors_schema_version: i32,
    #[serde(rename = "modeltimestamp", default, skip_serializing_if = "is_zero_i64")]
    pub model_timestamp: i64,
    #[serde(rename = "floorprovider", default, skip_serializing_if = "String::is_empty")]
    pub floor_provider: String,
    #[serde(rename = "modelgroups", default)]
    pub model_groups: Vec<ModelGroup>,
}

impl FloorData {
    pub fn currency(&self) -> &str {
        if self.currency.is_empty() {
            DEFAULT_CURRENCY
        } else {
            &self.currency
        }
    }
}

/// Ordered list of dimensions used to build rule keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delimiter: String,
}

impl Schema {
    pub fn delimiter(&self) -> &str {
        if self.delimiter.is_empty() {
            DEFAULT_DELIMITER
        } else {
            &self.delimiter
        }
    }
}

/// One weighted, versioned rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelGroup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub currency: String,
    #[serde(rename = "modelweight", default, skip_serializing_if = "Option::is_none")]
    pub model_weight: Option<i32>,
    #[serde(rename = "modelversion", default, skip_serializing_if = "String::is_empty")]
    pub model_version: String,
    #[serde(rename = "skiprate", default, skip_serializing_if = "is_zero_i32")]
    pub skip_rate: i32,
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    pub values: HashMap<String, f64>,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub default: f64,
}

impl ModelGroup {
    /// Selection weight, 1 when the group does not declare one.
    pub fn weight(&self) -> i32 {
        self.model_weight.unwrap_or(1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The slice of the OpenRTB 2.x bid request the floor engine reads and
//! writes.
//!
//! Every object keeps unrecognised members in a flattened `other` map so a
//! request can be enriched and serialized back without losing data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rules::FloorRulesDocument;

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub imp: Vec<Imp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<App>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<RequestExt>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl BidRequest {
    /// The request-level floors document (`ext.prebid.floors`), if any.
    pub fn floors(&self) -> Option<&FloorRulesDocument> {
        self.ext.as_ref()?.prebid.as_ref()?.floors.as_ref()
    }

    pub fn floors_mut(&mut self) -> Option<&mut FloorRulesDocument> {
        self.ext.as_mut()?.prebid.as_mut()?.floors.as_mut()
    }

    /// Replace the request-level floors document.
    pub fn set_floors(&mut self, floors: FloorRulesDocument) {
        let ext = self.ext.get_or_insert_with(Default::default);
        let prebid = ext.prebid.get_or_insert_with(Default::default);
        prebid.floors = Some(floors);
    }

    /// Name of the integration channel (`ext.prebid.channel.name`).
    pub fn channel_name(&self) -> Option<&str> {
        self.ext
            .as_ref()?
            .prebid
            .as_ref()?
            .channel
            .as_ref()
            .map(|c| c.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct App {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bundle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ua: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPrebid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<FloorRulesDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestExt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prebid: Option<RequestPrebid>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Impression
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub w: i64,
    #[serde(default)]
    pub h: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format: Vec<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Video placement value denoting in-stream inventory.
pub const VIDEO_PLACEMENT_INSTREAM: i32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<i32>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Imp {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<Value>,
    #[serde(rename = "tagid", default, skip_serializing_if = "String::is_empty")]
    pub tag_id: String,
    #[serde(rename = "bidfloor", default, skip_serializing_if = "is_zero_f64")]
    pub bid_floor: f64,
    #[serde(rename = "bidfloorcur", default, skip_serializing_if = "String::is_empty")]
    pub bid_floor_cur: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<ImpExt>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Imp {
    /// Floor settings and results under `ext.prebid.floors`.
    pub fn floors(&self) -> Option<&ImpFloors> {
        self.ext.as_ref()?.prebid.as_ref()?.floors.as_ref()
    }

    pub fn floors_mut(&mut self) -> &mut ImpFloors {
        let ext = self.ext.get_or_insert_with(Default::default);
        let prebid = ext.prebid.get_or_insert_with(Default::default);
        prebid.floors.get_or_insert_with(Default::default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdServer {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "adslot", default)]
    pub ad_slot: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpExtData {
    #[serde(rename = "adserver", default, skip_serializing_if = "Option::is_none")]
    pub ad_server: Option<AdServer>,
    #[serde(rename = "pbadslot", default, skip_serializing_if = "String::is_empty")]
    pub pb_ad_slot: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredRequest {
    #[serde(default)]
    pub id: String,
}

/// Per-impression floor override (input) and floor metadata (output).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpFloors {
    #[serde(rename = "floorrule", default, skip_serializing_if = "String::is_empty")]
    pub floor_rule: String,
    #[serde(rename = "floorrulevalue", default, skip_serializing_if = "is_zero_f64")]
    pub floor_rule_value: f64,
    #[serde(rename = "floorvalue", default, skip_serializing_if = "is_zero_f64")]
    pub floor_value: f64,
    #[serde(rename = "floormin", default, skip_serializing_if = "is_zero_f64")]
    pub floor_min: f64,
    #[serde(rename = "floormincur", default, skip_serializing_if = "String::is_empty")]
    pub floor_min_cur: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpPrebid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<ImpFloors>,
    #[serde(rename = "storedrequest", default, skip_serializing_if = "Option::is_none")]
    pub stored_request: Option<StoredRequest>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpExt {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gpid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ImpExtData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prebid: Option<ImpPrebid>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

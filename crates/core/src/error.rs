/// Diagnostics produced while validating or applying floor rules.
///
/// None of these are fatal to an auction: callers collect them and carry
/// on with whatever floors (if any) survived.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FloorError {
    #[error("Invalid schema dimension provided '{0}' in Schema Fields")]
    InvalidDimension(String),

    #[error("Duplicate schema dimension '{0}' in Schema Fields")]
    DuplicateDimension(String),

    #[error("Invalid Floor Model = '{version}' due to {reason}")]
    InvalidModelGroup { version: String, reason: String },

    #[error("Invalid Floor Rule = '{key}' for Schema Fields = '{fields:?}'")]
    InvalidRuleKey { key: String, fields: Vec<String> },

    #[error("Invalid FloorsSchemaVersion = '{0}', supported version 2")]
    UnsupportedSchemaVersion(i32),

    #[error("Invalid SkipRate = '{rate}' at {location}")]
    InvalidSkipRate { rate: i32, location: &'static str },

    #[error("Invalid FloorMin = '{0}', value should be >= 0")]
    InvalidFloorMin(f64),

    #[error("Currency conversion rate not found: '{from}' => '{to}'")]
    MissingRate { from: String, to: String },

    #[error("Error in getting FloorMin value for imp '{imp_id}': {reason}")]
    FloorMin { imp_id: String, reason: String },

    #[error("Invalid fetched floor rules: {0}")]
    InvalidFetchedRules(String),

    #[error("Invalid account floor configuration: {0}")]
    InvalidConfig(String),

    #[error("Floors feature is disabled at account or in the request")]
    Disabled,
}

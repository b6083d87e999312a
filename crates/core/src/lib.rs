//! Price-floor resolution for OpenRTB bid requests.
//!
//! Pure, synchronous building blocks: the floor-rules data model,
//! validation, wildcard rule matching, request context extraction and the
//! per-request resolver. Fetching remote documents lives in
//! `floors-fetcher`.

pub mod account;
pub mod context;
pub mod currency;
pub mod enforcement;
pub mod enrich;
pub mod error;
pub mod matching;
pub mod openrtb;
pub mod resolver;
pub mod rules;
pub mod selection;
pub mod validation;

pub use account::{AccountFetchConfig, AccountFloorConfig};
pub use currency::{Conversions, RateTable};
pub use enforcement::should_enforce_floors;
pub use enrich::{account_for_request, enrich_with_floors, floors_enabled, merge_floors, resolve_floors};
pub use error::FloorError;
pub use openrtb::BidRequest;
pub use resolver::modify_imps_with_floors;
pub use rules::{FetchStatus, FloorData, FloorLocation, FloorRulesDocument};
pub use selection::random_draw;

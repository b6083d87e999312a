use std::sync::Arc;

use floors_core::Conversions;
use floors_fetcher::PriceFloorFetcher;

use crate::config::{AccountRegistry, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Per-account floor settings.
    pub accounts: Arc<AccountRegistry>,
    /// Currency conversion rates used for floor minimums.
    pub conversions: Arc<dyn Conversions>,
    /// Dynamic floor fetch scheduler.
    pub fetcher: Arc<PriceFloorFetcher>,
}

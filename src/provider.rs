pub mod yahoo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::ProviderError;
use crate::model::PriceSeries;

/// Source of daily price history.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn PriceProvider`).
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch the daily OHLCV history of `ticker`, oldest bar first.
    fn fetch_daily(&self, ticker: &str) -> BoxFuture<'_, Result<PriceSeries, Report<ProviderError>>>;
}

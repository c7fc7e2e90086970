use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::model::{Bar, PriceSeries};
use crate::provider::PriceProvider;

const PROVIDER: &str = "yahoo";
const INTERVAL: &str = "1d";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; stock-technicals/0.1)";
const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_SECS: u64 = 8;

/// Daily bars from the Yahoo Finance chart endpoint.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
    range: String,
    max_retries: u32,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, Report<ProviderError>> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .change_context(ProviderError::Request {
                provider: PROVIDER.into(),
            })
            .attach("failed to build HTTP client")?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            range: config.range.clone(),
            max_retries: config.max_retries,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        })
    }

    async fn request_chart(&self, ticker: &str) -> Result<ChartEnvelope, Report<ProviderError>> {
        // Wait for rate limiter before making the request
        self.rate_limiter.until_ready().await;

        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let params = [("range", self.range.as_str()), ("interval", INTERVAL)];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .change_context(ProviderError::Request {
                provider: PROVIDER.into(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Report::new(ProviderError::NoData {
                provider: PROVIDER.into(),
                ticker: ticker.into(),
            })
            .attach(format!("HTTP status: {status}")));
        }
        if !status.is_success() {
            return Err(Report::new(ProviderError::Request {
                provider: PROVIDER.into(),
            })
            .attach(format!("HTTP status: {status}")));
        }

        response
            .json()
            .await
            .change_context(ProviderError::ResponseParse {
                provider: PROVIDER.into(),
            })
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn fetch_daily(&self, ticker: &str) -> BoxFuture<'_, Result<PriceSeries, Report<ProviderError>>> {
        let ticker = ticker.to_owned();
        Box::pin(async move {
            let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
            let mut attempt = 0;

            let envelope = loop {
                match self.request_chart(&ticker).await {
                    Ok(envelope) => break envelope,
                    Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                        attempt += 1;
                        warn!(
                            ticker = %ticker,
                            attempt,
                            error = %e,
                            "yahoo chart request failed, retrying..."
                        );
                        sleep(backoff).await;
                        backoff = (backoff * 2).min(Duration::from_secs(MAX_BACKOFF_SECS));
                    }
                    Err(e) => return Err(e.attach(format!("ticker: {ticker}"))),
                }
            };

            let series = envelope.into_series(&ticker)?;
            info!(
                ticker = %ticker,
                bars = series.len(),
                range = %self.range,
                "daily history fetched"
            );
            Ok(series)
        })
    }
}

fn is_retryable(report: &Report<ProviderError>) -> bool {
    matches!(report.current_context(), ProviderError::Request { .. })
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; bar timestamps are session opens.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

/// Column-oriented OHLCV; Yahoo emits `null` for missing values.
#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartEnvelope {
    fn into_series(self, ticker: &str) -> Result<PriceSeries, Report<ProviderError>> {
        let no_data = || ProviderError::NoData {
            provider: PROVIDER.into(),
            ticker: ticker.into(),
        };

        if let Some(error) = self.chart.error {
            return Err(Report::new(no_data()).attach(format!(
                "{}: {}",
                error.code,
                error.description.unwrap_or_default()
            )));
        }

        let result = self
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| Report::new(no_data()))?;

        let series =
            PriceSeries::new(result.into_bars()).change_context(ProviderError::InvalidSeries {
                provider: PROVIDER.into(),
                ticker: ticker.into(),
            })?;
        if series.is_empty() {
            return Err(Report::new(no_data()));
        }
        Ok(series)
    }
}

impl ChartResult {
    /// Rows with a missing or malformed price are skipped. When two rows fall
    /// on the same exchange date (the in-progress session), the later row wins.
    fn into_bars(self) -> Vec<Bar> {
        let offset = self.meta.gmtoffset;
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();
        let column = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

        let mut bars: Vec<Bar> = Vec::with_capacity(self.timestamp.len());
        for (i, &ts) in self.timestamp.iter().enumerate() {
            let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
                debug!(timestamp = ts, "skipping row with invalid timestamp");
                continue;
            };
            let (Some(open), Some(high), Some(low), Some(close)) = (
                column(&quote.open, i),
                column(&quote.high, i),
                column(&quote.low, i),
                column(&quote.close, i),
            ) else {
                debug!(%date, "skipping row with missing prices");
                continue;
            };

            let bar = Bar {
                date,
                open,
                high,
                low,
                close,
                volume: column(&quote.volume, i).unwrap_or(0.0),
            };
            if let Some(reason) = bar.defect() {
                debug!(%date, reason, "skipping malformed row");
                continue;
            }
            match bars.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => bars.push(bar),
            }
        }
        bars
    }
}

use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::technicals::volatility::Annualization;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}

fn default_range() -> String {
    "6mo".into()
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_min_bars() -> usize {
    50
}

fn default_level_lookback() -> usize {
    14
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// History window requested per ticker, e.g. `"6mo"` or `"1y"`.
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            range: default_range(),
            requests_per_second: default_requests_per_second(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Parameters of the indicator engine. Indicator periods and signal
/// thresholds are fixed; these are the knobs that are not.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Minimum number of bars for a report; shorter series yield `{}`.
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,
    /// Bars in the support/resistance window.
    #[serde(default = "default_level_lookback")]
    pub level_lookback: usize,
    #[serde(default)]
    pub hv_annualization: Annualization,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bars: default_min_bars(),
            level_lookback: default_level_lookback(),
            hv_annualization: Annualization::default(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];
const VALID_RANGES: &[&str] = &["3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"];

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(&config.general)?;
    validate_provider(&config.provider)?;
    validate_engine(&config.engine)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(general: &GeneralConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" is not one of {VALID_LOG_FORMATS:?}",
            general.log_format
        )));
    }
    Ok(())
}

fn validate_provider(provider: &ProviderConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_RANGES.contains(&provider.range.as_str()) {
        return Err(invalid(format!(
            "provider.range \"{}\" is not one of {VALID_RANGES:?}",
            provider.range
        )));
    }
    if provider.requests_per_second == 0 {
        return Err(invalid("provider.requests_per_second must be > 0".into()));
    }
    if provider.timeout_secs == 0 {
        return Err(invalid("provider.timeout_secs must be > 0".into()));
    }
    Ok(())
}

fn validate_engine(engine: &EngineConfig) -> Result<(), Report<ConfigError>> {
    if engine.min_bars == 0 {
        return Err(invalid("engine.min_bars must be > 0".into()));
    }
    if engine.level_lookback == 0 {
        return Err(invalid("engine.level_lookback must be > 0".into()));
    }
    Ok(())
}

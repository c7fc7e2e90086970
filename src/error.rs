use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ProviderError {
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
    #[display("{provider} returned no data for {ticker}")]
    NoData { provider: String, ticker: String },
    #[display("{provider} returned a malformed price series for {ticker}")]
    InvalidSeries { provider: String, ticker: String },
}

#[derive(Debug, Display, Error)]
pub enum SeriesError {
    #[display("bar {index} ({date}) is malformed: {reason}")]
    MalformedBar {
        index: usize,
        date: String,
        reason: String,
    },
    #[display("bar {index} ({date}) is not after the previous bar")]
    OutOfOrder { index: usize, date: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

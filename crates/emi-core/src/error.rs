use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmiError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("Exchange rate fetch failed: {0}")]
    RateFetch(String),

    #[error("Malformed exchange rate payload: {0}")]
    MalformedRates(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for EmiError {
    fn from(e: serde_json::Error) -> Self {
        EmiError::SerializationError(e.to_string())
    }
}

impl From<reqwest::Error> for EmiError {
    fn from(e: reqwest::Error) -> Self {
        EmiError::RateFetch(e.to_string())
    }
}

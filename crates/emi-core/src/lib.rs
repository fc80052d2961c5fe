pub mod amortization;
pub mod config;
pub mod currency;
pub mod error;
pub mod rates;
pub mod session;
pub mod types;
pub mod validation;

pub use error::EmiError;
pub use types::*;

/// Standard result type for all EMI operations
pub type EmiResult<T> = Result<T, EmiError>;

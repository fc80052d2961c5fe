use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::EmiError;

/// Monetary values. Plain `f64`: the schedule carries sub-cent drift and is
/// only rounded at display time.
pub type Money = f64;

/// Annual interest rate as a percentage (8.5 = 8.5%).
pub type RatePercent = f64;

/// Loan term in years; may be fractional.
pub type Years = f64;

/// Display currencies. Every monetary value is computed in USD and converted
/// into one of these at render time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    INR,
    GBP,
    JPY,
    AUD,
    CAD,
}

impl Currency {
    /// All supported currencies, in selector order.
    pub const ALL: [Currency; 7] = [
        Currency::USD,
        Currency::EUR,
        Currency::INR,
        Currency::GBP,
        Currency::JPY,
        Currency::AUD,
        Currency::CAD,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::INR => "INR",
            Self::GBP => "GBP",
            Self::JPY => "JPY",
            Self::AUD => "AUD",
            Self::CAD => "CAD",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::USD => "US Dollar",
            Self::EUR => "Euro",
            Self::INR => "Indian Rupee",
            Self::GBP => "British Pound",
            Self::JPY => "Japanese Yen",
            Self::AUD => "Australian Dollar",
            Self::CAD => "Canadian Dollar",
        }
    }

    pub fn is_base(self) -> bool {
        self == Self::USD
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = EmiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| EmiError::UnknownCurrency(s.to_string()))
    }
}

/// Parsed, validated loan parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate_percent: RatePercent,
    pub term_years: Years,
}

/// One month of the amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// 1-based month index.
    pub month: u32,
    pub principal: Money,
    pub interest: Money,
    pub remaining_balance: Money,
}

/// Snapshot of one successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    pub principal: Money,
    pub annual_rate_percent: RatePercent,
    pub term_years: Years,
    pub months: u32,
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub schedule: Vec<AmortizationEntry>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "f64".to_string(),
        },
    }
}

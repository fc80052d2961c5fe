//! Field-level validation of raw loan form input.
//!
//! Validation failures are data, not errors: each field maps to an optional
//! [`FieldError`] and a form with any error present cannot be calculated.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

use crate::amortization::{months_for_term, MAX_TERM_MONTHS};
use crate::error::EmiError;
use crate::types::LoanTerms;

/// Unsigned decimal with at most two fractional digits.
static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]{1,2})?$").expect("valid number pattern"));

const MAX_RATE_PERCENT: f64 = 100.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The three loan form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoanField {
    LoanAmount,
    InterestRate,
    LoanTerm,
}

impl LoanField {
    pub const ALL: [LoanField; 3] = [
        LoanField::LoanAmount,
        LoanField::InterestRate,
        LoanField::LoanTerm,
    ];

    /// Form key of the field.
    pub fn key(self) -> &'static str {
        match self {
            Self::LoanAmount => "loanAmount",
            Self::InterestRate => "interestRate",
            Self::LoanTerm => "loanTerm",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LoanAmount => "Loan Amount",
            Self::InterestRate => "Interest Rate (%)",
            Self::LoanTerm => "Term (Years)",
        }
    }
}

impl std::fmt::Display for LoanField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for LoanField {
    type Err = EmiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loanAmount" | "amount" => Ok(Self::LoanAmount),
            "interestRate" | "rate" => Ok(Self::InterestRate),
            "loanTerm" | "term" => Ok(Self::LoanTerm),
            other => Err(EmiError::InvalidInput {
                field: "field".into(),
                reason: format!("unknown loan field '{other}'"),
            }),
        }
    }
}

/// Why a single field was rejected. `Display` yields the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FieldError {
    #[error("This field is required.")]
    Required,
    #[error("Please enter a valid number.")]
    InvalidNumber,
    #[error("Amount must be greater than 0.")]
    AmountNotPositive,
    #[error("Rate must be between 0-100.")]
    RateOutOfRange,
    #[error("Term must be greater than 0.")]
    TermNotPositive,
    #[error("Term must be at most 100 years.")]
    TermTooLong,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate one raw field value. Rules apply in order and the first failure
/// wins: presence, number pattern, then field-specific bounds.
pub fn validate(field: LoanField, raw: &str) -> Option<FieldError> {
    parse_field(field, raw).err()
}

/// Validate and parse one raw field value.
pub fn parse_field(field: LoanField, raw: &str) -> Result<f64, FieldError> {
    if raw.is_empty() {
        return Err(FieldError::Required);
    }
    if !NUMBER_PATTERN.is_match(raw) {
        return Err(FieldError::InvalidNumber);
    }
    let value: f64 = raw.parse().map_err(|_| FieldError::InvalidNumber)?;
    // long digit strings match the pattern but overflow to infinity
    if !value.is_finite() {
        return Err(FieldError::InvalidNumber);
    }

    match field {
        LoanField::LoanAmount if value <= 0.0 => Err(FieldError::AmountNotPositive),
        LoanField::InterestRate if !(0.0..=MAX_RATE_PERCENT).contains(&value) => {
            Err(FieldError::RateOutOfRange)
        }
        LoanField::LoanTerm if value <= 0.0 => Err(FieldError::TermNotPositive),
        LoanField::LoanTerm if months_for_term(value) > MAX_TERM_MONTHS => {
            Err(FieldError::TermTooLong)
        }
        _ => Ok(value),
    }
}

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

/// Raw form strings plus the current per-field errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInputs {
    amount: String,
    rate: String,
    term: String,
    errors: BTreeMap<LoanField, FieldError>,
}

impl Default for LoanInputs {
    fn default() -> Self {
        Self::new("100000", "8.5", "5")
    }
}

impl LoanInputs {
    /// Build a form from raw strings. Nothing is validated until a field is
    /// edited or [`LoanInputs::validate_all`] runs.
    pub fn new(amount: impl Into<String>, rate: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            rate: rate.into(),
            term: term.into(),
            errors: BTreeMap::new(),
        }
    }

    pub fn value(&self, field: LoanField) -> &str {
        match field {
            LoanField::LoanAmount => &self.amount,
            LoanField::InterestRate => &self.rate,
            LoanField::LoanTerm => &self.term,
        }
    }

    /// Store an edit and re-validate that field only.
    pub fn set(&mut self, field: LoanField, value: impl Into<String>) -> Option<FieldError> {
        let value = value.into();
        let error = validate(field, &value);
        match field {
            LoanField::LoanAmount => self.amount = value,
            LoanField::InterestRate => self.rate = value,
            LoanField::LoanTerm => self.term = value,
        }
        self.record(field, error);
        error
    }

    pub fn error(&self, field: LoanField) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    pub fn errors(&self) -> &BTreeMap<LoanField, FieldError> {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check every field independently and refresh the stored errors.
    /// Returns true only when all fields are valid.
    pub fn validate_all(&mut self) -> bool {
        for field in LoanField::ALL {
            let error = validate(field, self.value(field));
            self.record(field, error);
        }
        self.is_valid()
    }

    /// Typed loan terms, if every field currently parses.
    pub fn terms(&self) -> Option<LoanTerms> {
        Some(LoanTerms {
            principal: parse_field(LoanField::LoanAmount, &self.amount).ok()?,
            annual_rate_percent: parse_field(LoanField::InterestRate, &self.rate).ok()?,
            term_years: parse_field(LoanField::LoanTerm, &self.term).ok()?,
        })
    }

    fn record(&mut self, field: LoanField, error: Option<FieldError>) {
        match error {
            Some(e) => {
                self.errors.insert(field, e);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }
}

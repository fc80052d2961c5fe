//! Calculator session: form state, the current result, and the selected
//! display currency.
//!
//! The session holds no rate data of its own. Rendering takes the caller's
//! [`RateFeed`] explicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::amortization::build_result;
use crate::currency::{convert, format_money};
use crate::rates::RateFeed;
use crate::types::{Currency, LoanResult, Money};
use crate::validation::{FieldError, LoanField, LoanInputs};

/// Notice raised when a calculation is attempted with invalid fields.
pub const FIX_ERRORS_NOTICE: &str = "Please fix the errors in the form.";

/// Session phase. Computing is synchronous and never observable from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Ready,
}

#[derive(Debug, Clone, Default)]
pub struct CalculatorSession {
    inputs: LoanInputs,
    result: Option<LoanResult>,
    currency: Currency,
    notice: Option<String>,
}

impl CalculatorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs(inputs: LoanInputs) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.result.is_some() {
            SessionPhase::Ready
        } else {
            SessionPhase::Idle
        }
    }

    pub fn inputs(&self) -> &LoanInputs {
        &self.inputs
    }

    pub fn result(&self) -> Option<&LoanResult> {
        self.result.as_ref()
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Form-level notice from the last calculate attempt.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Record a field edit with real-time validation of that field.
    pub fn edit(&mut self, field: LoanField, value: impl Into<String>) -> Option<FieldError> {
        self.inputs.set(field, value)
    }

    /// Validate every field and, if all pass, run the engine and store the
    /// result. On failure the errors are returned and any previous result is
    /// kept.
    pub fn calculate(&mut self) -> Result<&LoanResult, BTreeMap<LoanField, FieldError>> {
        let terms = if self.inputs.validate_all() {
            self.inputs.terms()
        } else {
            None
        };

        let Some(terms) = terms else {
            tracing::debug!(errors = ?self.inputs.errors(), "calculation blocked by invalid input");
            self.notice = Some(FIX_ERRORS_NOTICE.to_string());
            return Err(self.inputs.errors().clone());
        };

        self.notice = None;
        Ok(&*self.result.insert(build_result(&terms)))
    }

    /// Clear the result and return to Idle. Inputs are kept.
    pub fn reset(&mut self) {
        self.result = None;
        self.notice = None;
    }

    /// Change the display currency. Never recomputes the schedule.
    pub fn select_currency(&mut self, currency: Currency) {
        self.currency = currency;
    }

    /// Render the current result in the selected currency, or `None` when Idle.
    pub fn view(&self, feed: &RateFeed) -> Option<ScheduleView> {
        self.result
            .as_ref()
            .map(|r| ScheduleView::render(r, self.currency, feed.rate(self.currency), feed.notice()))
    }
}

// ---------------------------------------------------------------------------
// Rendered output
// ---------------------------------------------------------------------------

/// A result converted and formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub currency: Currency,
    pub exchange_rate: f64,
    pub monthly_payment: String,
    pub converted_monthly_payment: String,
    pub converted_monthly_payment_value: Money,
    pub total_paid: String,
    pub total_interest: String,
    pub rows: Vec<ScheduleRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    pub principal: String,
    pub interest: String,
    pub remaining_balance: String,
}

impl ScheduleView {
    /// Convert every monetary field of `result` by `rate` and format it.
    /// The base payment stays in USD.
    pub fn render(result: &LoanResult, currency: Currency, rate: f64, rate_notice: Option<&str>) -> Self {
        let money = |v: Money| format_money(convert(v, rate), currency);
        let converted = convert(result.monthly_payment, rate);

        Self {
            currency,
            exchange_rate: rate,
            monthly_payment: format_money(result.monthly_payment, Currency::USD),
            converted_monthly_payment: format_money(converted, currency),
            converted_monthly_payment_value: converted,
            total_paid: money(result.total_paid),
            total_interest: money(result.total_interest),
            rows: result
                .schedule
                .iter()
                .map(|e| ScheduleRow {
                    month: e.month,
                    principal: money(e.principal),
                    interest: money(e.interest),
                    remaining_balance: money(e.remaining_balance),
                })
                .collect(),
            rate_notice: rate_notice.map(str::to_string),
        }
    }
}

//! Fixed-payment loan amortization.
//!
//! The engine works in the base currency (USD) with `f64` arithmetic and never
//! rounds mid-schedule. Conversion and two-decimal formatting happen at
//! display time (see [`crate::currency`]).

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::EmiError;
use crate::types::*;
use crate::EmiResult;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Longest schedule the engine will build: 100 years of monthly periods.
pub const MAX_TERM_MONTHS: u32 = 1200;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Payment amount plus the month-by-month breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub monthly_payment: Money,
    pub entries: Vec<AmortizationEntry>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Number of monthly periods for a term in years: `term_years * 12` rounded to
/// the nearest whole month, never less than one.
pub fn months_for_term(term_years: Years) -> u32 {
    let months = (term_years * MONTHS_PER_YEAR).round();
    if months < 1.0 {
        1
    } else if months >= u32::MAX as f64 {
        u32::MAX
    } else {
        months as u32
    }
}

/// Monthly rate as a decimal fraction, from an annual percentage.
pub fn monthly_rate(annual_rate_percent: RatePercent) -> f64 {
    annual_rate_percent / 100.0 / MONTHS_PER_YEAR
}

/// Fixed payment retiring `principal` over `months` periods at `rate` per
/// period. Zero rate divides the principal evenly.
pub fn level_payment(principal: Money, rate: f64, months: u32) -> Money {
    if rate == 0.0 {
        return principal / months as f64;
    }
    // P*r*(1+r)^n / ((1+r)^n - 1), rearranged so large n cannot overflow
    let discount = (1.0 + rate).powf(-(months as f64));
    principal * rate / (1.0 - discount)
}

/// Compute the monthly payment and full amortization schedule.
///
/// Inputs must already be validated: `principal > 0`, `0 <= rate <= 100`,
/// `term_years > 0` and at most [`MAX_TERM_MONTHS`] months. The final entry
/// retires whatever balance remains, so its principal and interest may differ
/// from the payment by float drift and its remaining balance is exactly zero.
pub fn compute_schedule(
    principal: Money,
    annual_rate_percent: RatePercent,
    term_years: Years,
) -> Schedule {
    debug_assert!(principal > 0.0, "principal must be positive");
    debug_assert!((0.0..=100.0).contains(&annual_rate_percent), "rate out of range");
    debug_assert!(term_years > 0.0, "term must be positive");
    debug_assert!(months_for_term(term_years) <= MAX_TERM_MONTHS, "term too long");

    let rate = monthly_rate(annual_rate_percent);
    let months = months_for_term(term_years);
    let payment = level_payment(principal, rate, months);

    let mut entries = Vec::with_capacity(months as usize);
    let mut balance = principal;

    for month in 1..=months {
        let interest = balance * rate;
        let principal_portion = if month == months {
            balance
        } else {
            (payment - interest).min(balance)
        };
        balance = (balance - principal_portion).max(0.0);
        if month == months {
            balance = 0.0;
        }

        entries.push(AmortizationEntry {
            month,
            principal: principal_portion,
            interest,
            remaining_balance: balance,
        });
    }

    tracing::debug!(
        principal,
        annual_rate_percent,
        months,
        monthly_payment = payment,
        "computed amortization schedule"
    );

    Schedule {
        monthly_payment: payment,
        entries,
    }
}

/// Checked entry point: validate the terms, run the engine, and wrap the
/// resulting [`LoanResult`] in the standard computation envelope.
pub fn calculate_loan(terms: &LoanTerms) -> EmiResult<ComputationOutput<LoanResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_terms(terms)?;

    let exact_months = terms.term_years * MONTHS_PER_YEAR;
    let months = months_for_term(terms.term_years);
    if (exact_months - months as f64).abs() > 1e-9 {
        warnings.push(format!(
            "Term of {} years is {exact_months:.4} months; rounded to {months} months.",
            terms.term_years
        ));
    }
    if terms.annual_rate_percent == 0.0 {
        warnings.push("Zero interest rate: principal is repaid in equal instalments.".into());
    }

    let result = build_result(terms);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization (monthly compounding)",
        terms,
        warnings,
        elapsed,
        result,
    ))
}

/// Run the engine on validated terms and collect the result snapshot.
pub fn build_result(terms: &LoanTerms) -> LoanResult {
    let schedule = compute_schedule(terms.principal, terms.annual_rate_percent, terms.term_years);

    let total_paid: Money = schedule
        .entries
        .iter()
        .map(|e| e.principal + e.interest)
        .sum();
    let total_interest: Money = schedule.entries.iter().map(|e| e.interest).sum();

    LoanResult {
        principal: terms.principal,
        annual_rate_percent: terms.annual_rate_percent,
        term_years: terms.term_years,
        months: schedule.entries.len() as u32,
        monthly_payment: schedule.monthly_payment,
        total_paid,
        total_interest,
        schedule: schedule.entries,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_terms(terms: &LoanTerms) -> EmiResult<()> {
    if !terms.principal.is_finite() || terms.principal <= 0.0 {
        return Err(EmiError::InvalidInput {
            field: "principal".into(),
            reason: "Amount must be greater than 0".into(),
        });
    }
    if !(0.0..=100.0).contains(&terms.annual_rate_percent) {
        return Err(EmiError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: "Rate must be between 0-100".into(),
        });
    }
    if !terms.term_years.is_finite() || terms.term_years <= 0.0 {
        return Err(EmiError::InvalidInput {
            field: "term_years".into(),
            reason: "Term must be greater than 0".into(),
        });
    }
    if months_for_term(terms.term_years) > MAX_TERM_MONTHS {
        return Err(EmiError::InvalidInput {
            field: "term_years".into(),
            reason: format!("Term must be at most {MAX_TERM_MONTHS} months"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_months_for_term_rounds_to_nearest() {
        assert_eq!(months_for_term(5.0), 60);
        assert_eq!(months_for_term(2.5), 30);
        // 27.96 months
        assert_eq!(months_for_term(2.33), 28);
        // 1.15 * 12 is 13.799999... in f64
        assert_eq!(months_for_term(1.15), 14);
        assert_eq!(months_for_term(0.01), 1);
    }

    #[test]
    fn test_monthly_rate() {
        assert!((monthly_rate(12.0) - 0.01).abs() < TOL);
        assert_eq!(monthly_rate(0.0), 0.0);
    }

    #[test]
    fn test_level_payment_reference() {
        // 100k over 60 months at 8.5% p.a.
        let pmt = level_payment(100_000.0, monthly_rate(8.5), 60);
        assert!((pmt - 2051.65).abs() < 0.01, "got {pmt}");
    }

    #[test]
    fn test_zero_rate_payment_is_exact_division() {
        let s = compute_schedule(1000.0, 0.0, 0.25);
        assert_eq!(s.monthly_payment, 1000.0 / 3.0);
        assert!(s.entries.iter().all(|e| e.interest == 0.0));
        assert_eq!(s.entries.last().unwrap().remaining_balance, 0.0);
    }

    #[test]
    fn test_single_month_term() {
        let s = compute_schedule(500.0, 12.0, 1.0 / 12.0);
        assert_eq!(s.entries.len(), 1);
        let e = s.entries[0];
        assert!((e.principal - 500.0).abs() < TOL);
        assert!((e.interest - 5.0).abs() < TOL);
        assert_eq!(e.remaining_balance, 0.0);
    }

    #[test]
    fn test_calculate_loan_rejects_bad_terms() {
        let terms = LoanTerms {
            principal: 0.0,
            annual_rate_percent: 5.0,
            term_years: 1.0,
        };
        assert!(matches!(
            calculate_loan(&terms),
            Err(EmiError::InvalidInput { ref field, .. }) if field == "principal"
        ));

        let terms = LoanTerms {
            principal: 1000.0,
            annual_rate_percent: 101.0,
            term_years: 1.0,
        };
        assert!(calculate_loan(&terms).is_err());
    }

    #[test]
    fn test_calculate_loan_caps_term_length() {
        let mut terms = LoanTerms {
            principal: 1000.0,
            annual_rate_percent: 5.0,
            term_years: 100.0,
        };
        assert_eq!(calculate_loan(&terms).unwrap().result.months, MAX_TERM_MONTHS);

        for term_years in [100.1, 100_000_000.0, f64::INFINITY] {
            terms.term_years = term_years;
            assert!(
                matches!(
                    calculate_loan(&terms),
                    Err(EmiError::InvalidInput { ref field, .. }) if field == "term_years"
                ),
                "{term_years} years should be rejected"
            );
        }
    }

    #[test]
    fn test_calculate_loan_rejects_non_finite_principal() {
        let terms = LoanTerms {
            principal: f64::INFINITY,
            annual_rate_percent: 5.0,
            term_years: 1.0,
        };
        assert!(calculate_loan(&terms).is_err());
    }

    #[test]
    fn test_calculate_loan_warns_on_fractional_months() {
        let terms = LoanTerms {
            principal: 10_000.0,
            annual_rate_percent: 6.0,
            term_years: 2.33,
        };
        let out = calculate_loan(&terms).unwrap();
        assert_eq!(out.result.months, 28);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("rounded to 28 months"));
    }
}

use emi_core::amortization::{self, compute_schedule, months_for_term};
use emi_core::currency::format_money;
use emi_core::types::{Currency, LoanTerms};

// ===========================================================================
// Schedule shape
// ===========================================================================

const CASES: [(f64, f64, f64); 8] = [
    (100_000.0, 8.5, 5.0),
    (250_000.0, 6.75, 30.0),
    (1_000.0, 0.0, 1.0),
    (5_000.0, 100.0, 2.0),
    (12_345.67, 3.99, 2.33),
    (0.01, 12.0, 0.5),
    (750_000.0, 0.01, 15.0),
    (42.0, 55.5, 0.04),
];

#[test]
fn test_entry_count_and_month_numbering() {
    for (principal, rate, term) in CASES {
        let s = compute_schedule(principal, rate, term);
        let n = months_for_term(term);
        assert_eq!(s.entries.len(), n as usize, "case {principal}/{rate}/{term}");
        for (i, e) in s.entries.iter().enumerate() {
            assert_eq!(e.month, i as u32 + 1);
        }
    }
}

#[test]
fn test_principal_portions_sum_to_principal() {
    for (principal, rate, term) in CASES {
        let s = compute_schedule(principal, rate, term);
        let repaid: f64 = s.entries.iter().map(|e| e.principal).sum();
        let rel = ((repaid - principal) / principal).abs();
        assert!(rel < 1e-6, "case {principal}/{rate}/{term}: repaid {repaid}");
    }
}

#[test]
fn test_final_balance_exactly_zero() {
    for (principal, rate, term) in CASES {
        let s = compute_schedule(principal, rate, term);
        assert_eq!(s.entries.last().unwrap().remaining_balance, 0.0);
    }
}

#[test]
fn test_balance_non_negative_and_non_increasing() {
    for (principal, rate, term) in CASES {
        let s = compute_schedule(principal, rate, term);
        let mut previous = principal;
        for e in &s.entries {
            assert!(e.remaining_balance >= 0.0);
            assert!(e.remaining_balance <= previous, "month {} increased", e.month);
            previous = e.remaining_balance;
        }
    }
}

#[test]
fn test_each_entry_sums_to_payment_except_last() {
    for (principal, rate, term) in CASES {
        let s = compute_schedule(principal, rate, term);
        let tol = s.monthly_payment.abs() * 1e-9;
        let body = &s.entries[..s.entries.len() - 1];
        for e in body {
            let paid = e.principal + e.interest;
            assert!(
                (paid - s.monthly_payment).abs() <= tol,
                "case {principal}/{rate}/{term} month {}: {paid} vs {}",
                e.month,
                s.monthly_payment
            );
        }
    }
}

// ===========================================================================
// Zero-rate edge case
// ===========================================================================

#[test]
fn test_zero_rate_exact_payment_and_no_interest() {
    let s = compute_schedule(10_000.0, 0.0, 3.0);
    assert_eq!(s.monthly_payment, 10_000.0 / 36.0);
    assert!(s.entries.iter().all(|e| e.interest == 0.0));
    for e in &s.entries[..35] {
        assert_eq!(e.principal, s.monthly_payment);
    }
}

// ===========================================================================
// Reference loan
// ===========================================================================

#[test]
fn test_reference_loan_100k_8_5pct_5y() {
    let s = compute_schedule(100_000.0, 8.5, 5.0);
    // Level payment formula: 2051.653...
    assert!((s.monthly_payment - 2051.653).abs() < 1e-3);
    assert!((s.monthly_payment - 2052.08).abs() < 0.5);
    assert_eq!(s.entries.len(), 60);

    let first = s.entries[0];
    // 100000 * 0.085 / 12
    assert!((first.interest - 708.333_333).abs() < 1e-5);
    assert!((first.principal - 1343.319_799).abs() < 1e-5);

    let last = s.entries.last().unwrap();
    assert_eq!(format_money(last.remaining_balance, Currency::USD), "0.00 USD");
}

#[test]
fn test_calculate_loan_envelope() {
    let terms = LoanTerms {
        principal: 100_000.0,
        annual_rate_percent: 8.5,
        term_years: 5.0,
    };
    let out = amortization::calculate_loan(&terms).unwrap();
    let r = &out.result;

    assert_eq!(r.months, 60);
    assert_eq!(r.schedule.len(), 60);
    assert!(out.warnings.is_empty());
    assert_eq!(out.metadata.precision, "f64");
    assert!((r.total_paid - r.principal - r.total_interest).abs() < 1e-6);
    // 60 * 2051.653 - 100000
    assert!((r.total_interest - 23_099.19).abs() < 0.01);
}

#[test]
fn test_fractional_term_rounding() {
    // 2.33 years is 27.96 months
    assert_eq!(compute_schedule(10_000.0, 5.0, 2.33).entries.len(), 28);
    // 0.02 years is 0.24 months; at least one payment
    let s = compute_schedule(10_000.0, 5.0, 0.02);
    assert_eq!(s.entries.len(), 1);
    assert!((s.entries[0].principal - 10_000.0).abs() < 1e-9);
}

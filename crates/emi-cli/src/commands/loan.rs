use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

use emi_core::amortization;
use emi_core::session::{CalculatorSession, ScheduleView};
use emi_core::types::{Currency, LoanTerms};
use emi_core::validation::{self, FieldError, LoanField, LoanInputs};

use crate::commands::{load_feed, Context};
use crate::input;

const METHODOLOGY: &str = "Level-payment amortization (monthly compounding)";

/// Arguments for the EMI calculation
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to JSON input file with principal, annual_rate_percent, term_years
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount in USD
    #[arg(long, default_value = "100000")]
    pub amount: String,

    /// Annual interest rate in percent
    #[arg(long, default_value = "8.5")]
    pub rate: String,

    /// Loan term in years
    #[arg(long, default_value = "5")]
    pub term: String,

    /// Display currency (USD, EUR, INR, GBP, JPY, AUD, CAD)
    #[arg(long, default_value = "USD")]
    pub currency: String,
}

/// Arguments for single-field validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Field name: loanAmount, interestRate or loanTerm
    #[arg(long)]
    pub field: String,

    /// Raw field value
    #[arg(long, allow_hyphen_values = true)]
    pub value: String,
}

/// Per-field form errors that blocked a calculation.
#[derive(Debug)]
pub struct FormErrors(BTreeMap<LoanField, FieldError>);

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", emi_core::session::FIX_ERRORS_NOTICE)?;
        for (field, error) in &self.0 {
            write!(f, "\n  {field}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

pub async fn run_calculate(args: CalculateArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let currency: Currency = args.currency.parse()?;

    let terms: Option<LoanTerms> = if let Some(ref path) = args.input {
        Some(input::file::read_json(path)?)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Some(serde_json::from_value(data)?)
    } else {
        None
    };

    let feed = load_feed(ctx).await;

    let (view, warnings) = match terms {
        Some(terms) => {
            let output = amortization::calculate_loan(&terms)?;
            let view = ScheduleView::render(
                &output.result,
                currency,
                feed.rate(currency),
                feed.notice(),
            );
            (view, output.warnings)
        }
        None => {
            let mut session =
                CalculatorSession::with_inputs(LoanInputs::new(args.amount, args.rate, args.term));
            session.select_currency(currency);
            session.calculate().map_err(FormErrors)?;
            let view = session
                .view(&feed)
                .ok_or("calculation produced no result")?;
            (view, Vec::new())
        }
    };

    let mut summary = serde_json::to_value(&view)?;
    let rows = summary
        .as_object_mut()
        .and_then(|m| m.remove("rows"))
        .unwrap_or_else(|| Value::Array(Vec::new()));

    Ok(json!({
        "result": summary,
        "rows": rows,
        "warnings": warnings,
        "methodology": METHODOLOGY,
        "rates": feed.status(),
    }))
}

/// Outcome of validating one field; an empty message means valid.
#[derive(Serialize)]
struct ValidationReport {
    field: &'static str,
    value: String,
    valid: bool,
    message: String,
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let field: LoanField = args.field.parse()?;
    let error = validation::validate(field, &args.value);

    let report = ValidationReport {
        field: field.key(),
        value: args.value,
        valid: error.is_none(),
        message: error.map(|e| e.to_string()).unwrap_or_default(),
    };
    Ok(json!({ "result": report }))
}

use clap::Args;
use serde_json::{json, Value};

use emi_core::currency::{convert, format_money, format_rate};
use emi_core::types::Currency;

use crate::commands::{load_feed, Context};

/// Arguments for a single conversion
#[derive(Args)]
pub struct ConvertArgs {
    /// Amount in USD
    #[arg(long, allow_hyphen_values = true)]
    pub amount: f64,

    /// Target currency (USD, EUR, INR, GBP, JPY, AUD, CAD)
    #[arg(long)]
    pub currency: String,
}

/// Arguments for the exchange-rate listing
#[derive(Args)]
pub struct RatesArgs {
    /// Only list the supported display currencies
    #[arg(long)]
    pub supported: bool,
}

pub async fn run_convert(args: ConvertArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    if !args.amount.is_finite() {
        return Err("--amount must be a finite number".into());
    }
    let currency: Currency = args.currency.parse()?;

    let feed = load_feed(ctx).await;
    let rate = feed.rate(currency);
    let converted = convert(args.amount, rate);

    Ok(json!({
        "result": {
            "amount_usd": args.amount,
            "currency": currency,
            "rate": rate,
            "converted": converted,
            "formatted": format_money(converted, currency),
        },
        "rates": feed.status(),
    }))
}

pub async fn run_rates(args: RatesArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let feed = load_feed(ctx).await;
    let table = feed.table().ok_or("no exchange rate table available")?;

    let rows: Vec<Value> = table
        .iter()
        .filter_map(|(code, rate)| {
            let known = code.parse::<Currency>().ok();
            if args.supported && known.is_none() {
                return None;
            }
            Some(json!({
                "code": code,
                "name": known.map(Currency::name).unwrap_or(""),
                "rate": format_rate(rate),
            }))
        })
        .collect();

    Ok(json!({
        "result": {
            "base": "USD",
            "source": table.source,
            "updated_at": table.updated_at,
            "count": rows.len(),
        },
        "rows": rows,
        "rates": feed.status(),
    }))
}

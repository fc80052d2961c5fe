pub mod loan;
pub mod rates;

use colored::Colorize;
use std::path::PathBuf;

use emi_core::config::RateSourceConfig;
use emi_core::rates::{HttpRateSource, RateFeed, StaticRateSource};
use emi_core::EmiResult;

/// Options shared by every command.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub offline: bool,
}

/// Fetch the rate table once for this invocation. Nothing here is an error:
/// a bad rate-source configuration or a failed fetch leaves the feed on the
/// built-in table and a warning is printed.
pub async fn load_feed(ctx: &Context) -> RateFeed {
    let mut feed = RateFeed::new();
    tracing::debug!(offline = ctx.offline, "loading exchange rates");

    if ctx.offline {
        feed.refresh(&StaticRateSource::fallback()).await;
    } else {
        match http_source(ctx) {
            Ok(source) => {
                feed.refresh(&source).await;
            }
            Err(e) => {
                let ticket = feed.begin_refresh();
                feed.complete(ticket, Err(e));
            }
        }
    }

    if let Some(notice) = feed.notice() {
        eprintln!("{}: {}", "warning".yellow().bold(), notice);
    }
    feed
}

fn http_source(ctx: &Context) -> EmiResult<HttpRateSource> {
    let config = RateSourceConfig::load(ctx.config_path.as_deref())?;
    HttpRateSource::new(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emi_core::rates::{FeedStatus, FETCH_FAILED_NOTICE};
    use emi_core::types::Currency;

    #[tokio::test]
    async fn test_bad_config_falls_back_instead_of_failing() {
        let ctx = Context {
            config_path: Some(PathBuf::from("/nonexistent/emi-rates.yaml")),
            offline: false,
        };
        let feed = load_feed(&ctx).await;
        assert!(matches!(feed.status(), FeedStatus::Failed { .. }));
        assert_eq!(feed.notice(), Some(FETCH_FAILED_NOTICE));
        assert_eq!(feed.rate(Currency::USD), 1.0);
        assert_eq!(feed.rate(Currency::INR), 83.14);
    }

    #[tokio::test]
    async fn test_offline_uses_fallback_without_notice() {
        let ctx = Context {
            config_path: None,
            offline: true,
        };
        let feed = load_feed(&ctx).await;
        assert_eq!(feed.status(), &FeedStatus::Ready);
        assert_eq!(feed.notice(), None);
        assert_eq!(feed.rate(Currency::EUR), 0.92);
    }
}

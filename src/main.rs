//! FLIPSCAN — CardTrader marketplace deal scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! verifies catalog credentials, and runs either a single-expansion
//! scan (expansion id as the sole argument) or a full batch scan,
//! window by window.

use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::{error, info, warn};

use flipscan::catalog::cardtrader::CardTraderClient;
use flipscan::config::AppConfig;
use flipscan::engine::orchestrator::{DealEngine, EngineConfig};
use flipscan::engine::ranker::ScanReport;
use flipscan::engine::scanner::DealScanner;

const BANNER: &str = r#"
  _____ _     ___ ____  ____   ____    _    _   _
 |  ___| |   |_ _|  _ \/ ___| / ___|  / \  | \ | |
 | |_  | |    | || |_) \___ \| |     / _ \ |  \| |
 |  _| | |___ | ||  __/ ___) | |___ / ___ \| |\  |
 |_|   |_____|___|_|   |____/ \____/_/   \_\_| \_|

  Marketplace Deal Scanner
  v0.1.0
"#;

/// Card page on the marketplace itself.
const CARDTRADER_BASE_URL: &str = "https://cardtrader.com/cards/";
/// CardMarket singles page, reachable through the blueprint's external id.
const CARDMARKET_BASE_URL: &str = "https://www.cardmarket.com/it/Magic/Products/Singles/";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        game_id = cfg.catalog.game_id,
        category_id = cfg.catalog.category_id,
        window_size = cfg.batch.window_size,
        "FLIPSCAN starting up"
    );

    // -- Initialise components -------------------------------------------

    let token = AppConfig::resolve_env(&cfg.catalog.auth_token_env)?;
    let catalog = CardTraderClient::new(SecretString::new(token), cfg.catalog.game_id)?;

    catalog
        .check_credentials()
        .await
        .context("CardTrader rejected the configured token")?;

    let scanner = DealScanner::new(cfg.scan.scan_config()?);
    info!(
        max_quotient = %scanner.config().max_quotient,
        min_cents = scanner.config().min_cents,
        max_cents = scanner.config().max_cents,
        max_cards = scanner.config().max_cards,
        min_condition = %scanner.config().min_condition,
        "Scan policy loaded"
    );

    let engine = DealEngine::connect(
        catalog,
        scanner,
        EngineConfig {
            category_id: cfg.catalog.category_id,
            window_size: cfg.batch.window_size,
            excluded_expansion_codes: cfg.catalog.excluded_expansion_codes.clone(),
        },
    )
    .await?;

    // -- Run ---------------------------------------------------------------

    match std::env::args().nth(1) {
        Some(arg) => {
            let expansion_id: u64 = arg
                .parse()
                .with_context(|| format!("Expected a numeric expansion id, got: {arg}"))?;
            let report = engine.scan_expansion(expansion_id).await?;
            print_report(&report);
        }
        None => {
            // Windows run one after another; each window's expansions are
            // fetched concurrently. A failed window doesn't stop the run.
            for window in engine.windows() {
                match engine.scan_window(window).await {
                    Ok(report) => print_report(&report),
                    Err(e) => {
                        error!(
                            start = window.start,
                            end = window.end,
                            error = %e,
                            "Window failed — continuing with the next"
                        );
                    }
                }
            }
        }
    }

    info!("FLIPSCAN done.");
    Ok(())
}

/// Log every ranked deal with its marketplace deep links.
fn print_report(report: &ScanReport) {
    if report.nothing_to_do {
        info!("Nothing to do — no deals in this scan");
        return;
    }

    info!(deals = report.candidates.len(), "Ranked deals (best first)");
    for deal in &report.candidates {
        let cardmarket_url = deal
            .external_market_id
            .map(|id| format!("{CARDMARKET_BASE_URL}{id}"));
        info!(
            ratio = %deal.price_ratio,
            discount_pct = %deal.discount_pct().round(),
            listing = %deal.best_listing,
            fast_checkout = deal.has_fast_checkout_seller,
            cardtrader = format!("{CARDTRADER_BASE_URL}{}", deal.best_listing.blueprint_id),
            cardmarket = cardmarket_url.as_deref().unwrap_or("-"),
            "Deal"
        );
        if deal.best_listing.altered || deal.best_listing.signed {
            warn!(
                listing_id = deal.best_listing.id,
                "Listing is altered or signed — inspect before buying"
            );
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("flipscan=info"));

    let json_logging = std::env::var("FLIPSCAN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

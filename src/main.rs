use std::sync::Arc;

use log::{error, info};

use quotehub::config::Config;
use quotehub::engine::{QuoteCallback, QuoteHub, SubscriptionBroker};
use quotehub::fetch::HttpQuoteFetcher;
use quotehub::quote::Quote;
use quotehub::render::{render_field, ChangePrefix, FieldKind};

/// Demo watcher: subscribes to the configured symbols and logs rendered
/// close/change/change-ratio values on every refresh until Ctrl-C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    config.log_config();

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e.into());
    }

    let fetcher = Arc::new(HttpQuoteFetcher::new(&config.upstream_url));
    let hub = Arc::new(QuoteHub::new(fetcher));
    let broker = SubscriptionBroker::new(Arc::clone(&hub));

    let mut subscriptions: Vec<(String, QuoteCallback)> = Vec::new();
    for symbol in &config.watch_symbols {
        let tag = symbol.clone();
        let callback: QuoteCallback = Arc::new(move |quote: &Quote| {
            let (close, color) = render_field(quote, FieldKind::Close, ChangePrefix::None);
            let (change, _) = render_field(quote, FieldKind::Change, ChangePrefix::PlusMinus);
            let (ratio, _) = render_field(quote, FieldKind::ChangeRatio, ChangePrefix::None);
            let (time, _) = render_field(quote, FieldKind::Time, ChangePrefix::None);
            info!(
                "{} [{}] close={} ({:?}) change={} ratio={}",
                tag, time, close, color, change, ratio
            );
        });

        let snapshot = broker.subscribe(symbol, Arc::clone(&callback));
        info!("watching {} (cached name: {})", symbol, snapshot.name);
        subscriptions.push((symbol.clone(), callback));
    }

    info!("quote watcher running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    // Dropping every subscription empties the polled set; the poll loop
    // notices on its next cycle and stops on its own.
    for (symbol, callback) in &subscriptions {
        broker.unsubscribe(symbol, callback);
    }
    info!("shutting down");

    Ok(())
}

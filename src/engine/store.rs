use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info};

use crate::config::{INITIAL_POLL_DELAY_MS, POLL_INTERVAL_MS};
use crate::engine::registry::ChannelRegistry;
use crate::fetch::QuoteFetcher;
use crate::quote::Quote;

/// Poll loop state. The loop is created lazily on the first symbol reference
/// anywhere in the system and tears itself down the moment the polled set
/// becomes empty, so zero interested consumers means zero background activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Scheduled,
    Fetching,
}

/// Owns the last-known snapshot per symbol and the background poll timer.
/// The only component that talks to the upstream data source.
pub struct QuoteStore {
    quotes: Mutex<HashMap<String, Quote>>,
    fetcher: Arc<dyn QuoteFetcher>,
    poll: Mutex<PollState>,
    initial_delay: Duration,
    interval: Duration,
}

impl QuoteStore {
    pub fn new(fetcher: Arc<dyn QuoteFetcher>) -> Self {
        Self {
            quotes: Mutex::new(HashMap::new()),
            fetcher,
            poll: Mutex::new(PollState::Idle),
            initial_delay: Duration::from_millis(INITIAL_POLL_DELAY_MS),
            interval: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }

    /// Cache-only synchronous read; never touches the network. Unknown
    /// symbols get the empty placeholder.
    pub fn get_quote(&self, symbol_id: &str) -> Quote {
        let quotes = match self.quotes.lock() {
            Ok(quotes) => quotes,
            Err(_) => return Quote::empty(symbol_id),
        };

        match quotes.get(&symbol_id.to_lowercase()) {
            Some(quote) => quote.clone(),
            None => Quote::empty(symbol_id),
        }
    }

    pub fn poll_state(&self) -> PollState {
        self.poll.lock().map(|s| *s).unwrap_or(PollState::Idle)
    }

    /// Start the poll loop if it is not already running. Called after every
    /// successful symbol reference; only the `Idle -> Scheduled` transition
    /// spawns a task, so repeated references are cheap.
    pub fn ensure_polling(self: Arc<Self>, registry: Arc<ChannelRegistry>) {
        {
            let mut state = match self.poll.lock() {
                Ok(state) => state,
                Err(e) => {
                    error!("poll state lock poisoned: {}", e);
                    return;
                }
            };
            if *state != PollState::Idle {
                return;
            }
            *state = PollState::Scheduled;
        }

        tokio::spawn(async move {
            self.run_poll_loop(registry).await;
        });
        info!("quote poll loop started");
    }

    async fn run_poll_loop(self: Arc<Self>, registry: Arc<ChannelRegistry>) {
        tokio::time::sleep(self.initial_delay).await;

        loop {
            let symbols = match self.begin_cycle(&registry) {
                Some(symbols) => symbols,
                None => {
                    info!("polled set empty, quote poll loop stopped");
                    return;
                }
            };

            debug!("fetching batch of {} symbols", symbols.len());
            match self.fetcher.fetch_quotes(&symbols).await {
                Ok(quotes) => {
                    for quote in quotes {
                        self.insert(quote.clone());

                        // Every symbol in the batch counts as changed;
                        // callbacks run with no engine lock held.
                        let watchers = registry.watchers(&quote.symbol_id);
                        for callback in watchers {
                            callback(&quote);
                        }
                    }
                }
                Err(e) => {
                    // Cache stays stale; the next cycle retries.
                    error!("quote fetch failed, will retry next cycle: {}", e);
                }
            }

            self.finish_cycle();
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Compute the polled set and transition to `Fetching`, or to `Idle`
    /// (returning `None`) if nothing is referenced anymore. The emptiness
    /// check and the state transition share the poll mutex with
    /// `ensure_polling`, so a concurrent first reference either lands in the
    /// set this cycle observes or finds the state `Idle` and respawns.
    fn begin_cycle(&self, registry: &ChannelRegistry) -> Option<Vec<String>> {
        let mut state = match self.poll.lock() {
            Ok(state) => state,
            Err(e) => {
                error!("poll state lock poisoned, stopping poll loop: {}", e);
                return None;
            }
        };

        let symbols = registry.polled_symbols();
        if symbols.is_empty() {
            *state = PollState::Idle;
            None
        } else {
            *state = PollState::Fetching;
            Some(symbols)
        }
    }

    fn finish_cycle(&self) {
        if let Ok(mut state) = self.poll.lock() {
            *state = PollState::Scheduled;
        }
    }

    fn insert(&self, quote: Quote) {
        if let Ok(mut quotes) = self.quotes.lock() {
            quotes.insert(quote.symbol_id.to_lowercase(), quote);
        }
    }
}

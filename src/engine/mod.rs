pub mod broker;
pub mod registry;
pub mod store;

use std::sync::Arc;

use crate::error::HubError;
use crate::fetch::QuoteFetcher;
use crate::quote::Quote;

pub use broker::SubscriptionBroker;
pub use registry::ChannelRegistry;
pub use store::{PollState, QuoteStore};

/// Consumer callback receiving each refreshed quote. Compared by pointer
/// identity where distinctness matters (the broker tier).
pub type QuoteCallback = Arc<dyn Fn(&Quote) + Send + Sync>;

/// The subscription engine: quote cache + poll loop (`QuoteStore`) composed
/// with channel-level reference counting (`ChannelRegistry`).
///
/// Explicitly constructed and passed by reference; tests build isolated
/// instances with their own mock fetcher.
pub struct QuoteHub {
    store: Arc<QuoteStore>,
    registry: Arc<ChannelRegistry>,
}

impl QuoteHub {
    pub fn new(fetcher: Arc<dyn QuoteFetcher>) -> Self {
        Self {
            store: Arc::new(QuoteStore::new(fetcher)),
            registry: Arc::new(ChannelRegistry::new()),
        }
    }

    /// Create a subscription channel, or replace its callback if it exists.
    pub fn create_or_update_channel(&self, channel_id: &str, callback: QuoteCallback) {
        self.registry.create_or_update_channel(channel_id, callback);
    }

    /// Reference a symbol on a channel and make sure the poll loop is
    /// running. The channel must have been created first.
    pub fn ref_symbol(&self, channel_id: &str, symbol_id: &str) -> Result<(), HubError> {
        self.registry.ref_symbol(channel_id, symbol_id)?;
        Arc::clone(&self.store).ensure_polling(Arc::clone(&self.registry));
        Ok(())
    }

    /// Drop a symbol reference. The poll loop notices an empty polled set on
    /// its next cycle and stops by itself; there is no explicit cancel.
    pub fn unref_symbol(&self, channel_id: &str, symbol_id: &str) -> Result<(), HubError> {
        self.registry.unref_symbol(channel_id, symbol_id)
    }

    /// Cache-only snapshot read; empty placeholder for unknown symbols.
    pub fn get_quote(&self, symbol_id: &str) -> Quote {
        self.store.get_quote(symbol_id)
    }

    pub fn poll_state(&self) -> PollState {
        self.store.poll_state()
    }

    /// Current polled set, mainly for diagnostics and tests.
    pub fn polled_symbols(&self) -> Vec<String> {
        self.registry.polled_symbols()
    }
}

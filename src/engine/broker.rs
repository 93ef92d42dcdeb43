use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{error, warn};
use uuid::Uuid;

use crate::engine::{QuoteCallback, QuoteHub};
use crate::error::HubError;
use crate::quote::Quote;

/// Second reference-counting tier: many independent consumers of one symbol
/// share a single channel, so the polled set only grows when a symbol goes
/// from zero to one total subscriber and shrinks only when it returns to
/// zero. Channel references per symbol are always `min(1, subscribers)`.
pub struct SubscriptionBroker {
    hub: Arc<QuoteHub>,
    channel_id: String,
    // symbol (case-folded) -> distinct subscriber callbacks, by Arc identity
    subs: Arc<Mutex<HashMap<String, Vec<QuoteCallback>>>>,
    channel_ready: Mutex<bool>,
}

impl SubscriptionBroker {
    pub fn new(hub: Arc<QuoteHub>) -> Self {
        Self {
            hub,
            channel_id: format!("broker:{}", Uuid::new_v4()),
            subs: Arc::new(Mutex::new(HashMap::new())),
            channel_ready: Mutex::new(false),
        }
    }

    /// Register a callback for a symbol. The first subscriber opens the one
    /// shared channel reference; everyone else piggybacks on it. Returns the
    /// currently cached quote so the caller can render immediately.
    pub fn subscribe(&self, symbol_id: &str, callback: QuoteCallback) -> Quote {
        self.ensure_channel();

        {
            let mut subs = match self.subs.lock() {
                Ok(subs) => subs,
                Err(e) => {
                    error!("subscriber map lock poisoned: {}", e);
                    return self.hub.get_quote(symbol_id);
                }
            };

            let entry = subs.entry(symbol_id.to_lowercase()).or_default();
            let first = entry.is_empty();
            if !entry.iter().any(|cb| Arc::ptr_eq(cb, &callback)) {
                entry.push(callback);
            }

            // The first-in decision and the channel ref must be atomic with
            // respect to other subscribers of this symbol, so the ref happens
            // under the subs lock. Safe: ref_symbol never invokes consumer
            // callbacks.
            if first {
                if let Err(e) = self.hub.ref_symbol(&self.channel_id, symbol_id) {
                    error!("broker failed to ref {}: {}", symbol_id, e);
                }
            }
        }

        self.hub.get_quote(symbol_id)
    }

    /// Remove a callback (matched by Arc identity). Unknown symbols or
    /// callbacks are warned no-ops; the last subscriber out closes the shared
    /// channel reference.
    pub fn unsubscribe(&self, symbol_id: &str, callback: &QuoteCallback) {
        let mut subs = match self.subs.lock() {
            Ok(subs) => subs,
            Err(e) => {
                error!("subscriber map lock poisoned: {}", e);
                return;
            }
        };

        let key = symbol_id.to_lowercase();
        let entry = match subs.get_mut(&key) {
            Some(entry) => entry,
            None => {
                let err = HubError::UnknownSubscription(format!("no subscribers for {}", symbol_id));
                warn!("unsubscribe ignored: {}", err);
                return;
            }
        };

        match entry.iter().position(|cb| Arc::ptr_eq(cb, callback)) {
            Some(pos) => {
                entry.remove(pos);
            }
            None => {
                let err = HubError::UnknownSubscription(format!("unknown callback for {}", symbol_id));
                warn!("unsubscribe ignored: {}", err);
                return;
            }
        }

        // Last one out closes the shared channel reference, still under the
        // subs lock so the decision cannot interleave with a concurrent
        // subscriber's first-in ref.
        if entry.is_empty() {
            subs.remove(&key);
            if let Err(e) = self.hub.unref_symbol(&self.channel_id, symbol_id) {
                error!("broker failed to unref {}: {}", symbol_id, e);
            }
        }
    }

    pub fn subscriber_count(&self, symbol_id: &str) -> usize {
        self.subs
            .lock()
            .ok()
            .and_then(|subs| subs.get(&symbol_id.to_lowercase()).map(|e| e.len()))
            .unwrap_or(0)
    }

    /// Open the shared channel on first use. Its callback fans each refreshed
    /// quote out to the symbol's current subscribers; the set is cloned under
    /// the lock and invoked after it is released, so a callback may
    /// re-subscribe or unsubscribe without deadlocking.
    fn ensure_channel(&self) {
        let mut ready = match self.channel_ready.lock() {
            Ok(ready) => ready,
            Err(e) => {
                error!("broker channel lock poisoned: {}", e);
                return;
            }
        };
        if *ready {
            return;
        }

        let subs = Arc::clone(&self.subs);
        let fan_out: QuoteCallback = Arc::new(move |quote: &Quote| {
            let watchers = match subs.lock() {
                Ok(subs) => subs
                    .get(&quote.symbol_id.to_lowercase())
                    .cloned()
                    .unwrap_or_default(),
                Err(_) => Vec::new(),
            };
            for callback in watchers {
                callback(quote);
            }
        });

        self.hub.create_or_update_channel(&self.channel_id, fan_out);
        *ready = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{sample_quote, MockFetcher};
    use crate::engine::PollState;
    use std::time::Duration;

    fn recording_callback() -> (QuoteCallback, Arc<Mutex<Vec<Quote>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let callback: QuoteCallback = Arc::new(move |quote: &Quote| {
            sink.lock().unwrap().push(quote.clone());
        });
        (callback, received)
    }

    fn hub_with_quote() -> (Arc<QuoteHub>, Arc<MockFetcher>) {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.put_quote(sample_quote("2330.TW", 105.0));
        (Arc::new(QuoteHub::new(fetcher.clone())), fetcher)
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_returns_cached_snapshot_synchronously() {
        let (hub, _fetcher) = hub_with_quote();
        let broker = SubscriptionBroker::new(hub);

        let (callback, _received) = recording_callback();
        let snapshot = broker.subscribe("2330.TW", callback);

        // Nothing fetched yet, so this is the placeholder.
        assert_eq!(snapshot.close, 0.0);
        assert_eq!(snapshot.name, "2330");
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_subscribers_share_one_channel_reference() {
        let (hub, fetcher) = hub_with_quote();
        let broker = SubscriptionBroker::new(Arc::clone(&hub));

        let (cb1, received1) = recording_callback();
        let (cb2, received2) = recording_callback();
        broker.subscribe("2330.TW", Arc::clone(&cb1));
        broker.subscribe("2330.tw", Arc::clone(&cb2));

        // Two subscribers, one symbol in the polled set.
        assert_eq!(broker.subscriber_count("2330.TW"), 2);
        assert_eq!(hub.polled_symbols(), vec!["2330.tw".to_string()]);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(received1.lock().unwrap().len(), 1);
        assert_eq!(received2.lock().unwrap().len(), 1);

        // Dropping one subscriber keeps the channel reference alive.
        broker.unsubscribe("2330.TW", &cb1);
        assert_eq!(hub.polled_symbols(), vec!["2330.tw".to_string()]);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(received1.lock().unwrap().len(), 1);
        assert_eq!(received2.lock().unwrap().len(), 2);

        // Last one out closes the reference; the loop then stops.
        broker.unsubscribe("2330.tw", &cb2);
        assert!(hub.polled_symbols().is_empty());
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(hub.poll_state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_subscribe_is_idempotent() {
        let (hub, _fetcher) = hub_with_quote();
        let broker = SubscriptionBroker::new(hub);

        let (callback, received) = recording_callback();
        broker.subscribe("2330.TW", Arc::clone(&callback));
        broker.subscribe("2330.TW", Arc::clone(&callback));
        assert_eq!(broker.subscriber_count("2330.TW"), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_unknown_is_warned_noop() {
        let (hub, _fetcher) = hub_with_quote();
        let broker = SubscriptionBroker::new(Arc::clone(&hub));

        let (cb1, _received1) = recording_callback();
        let (stranger, _received2) = recording_callback();

        // Unknown symbol.
        broker.unsubscribe("1101.TW", &cb1);
        assert!(hub.polled_symbols().is_empty());

        // Known symbol, unknown callback: subscriber set unchanged.
        broker.subscribe("2330.TW", Arc::clone(&cb1));
        broker.unsubscribe("2330.TW", &stranger);
        assert_eq!(broker.subscriber_count("2330.TW"), 1);
        assert_eq!(hub.polled_symbols(), vec!["2330.tw".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_handover_keeps_symbol_referenced() {
        let (hub, _fetcher) = hub_with_quote();
        let broker = Arc::new(SubscriptionBroker::new(Arc::clone(&hub)));

        let (cb1, _r1) = recording_callback();
        let (cb2, _r2) = recording_callback();
        broker.subscribe("2330.TW", Arc::clone(&cb1));

        let barrier = Arc::new(std::sync::Barrier::new(2));
        const ROUNDS: usize = 300;

        // One side drops the last old subscriber while the other adds a new
        // one. Whatever the interleaving, a symbol with a live subscriber
        // must stay in the polled set.
        let leaver = {
            let broker = Arc::clone(&broker);
            let barrier = Arc::clone(&barrier);
            let cb1 = Arc::clone(&cb1);
            let cb2 = Arc::clone(&cb2);
            tokio::task::spawn_blocking(move || {
                for _ in 0..ROUNDS {
                    barrier.wait();
                    broker.unsubscribe("2330.TW", &cb1);
                    barrier.wait();
                    // The joiner asserts between these two waits.
                    barrier.wait();
                    // Reset for the next round: cb2 out, cb1 back as the
                    // sole subscriber. The joiner is parked at the next
                    // round's first wait while this runs.
                    broker.unsubscribe("2330.TW", &cb2);
                    broker.subscribe("2330.TW", Arc::clone(&cb1));
                }
            })
        };

        let joiner = {
            let hub = Arc::clone(&hub);
            let broker = Arc::clone(&broker);
            let barrier = Arc::clone(&barrier);
            let cb2 = Arc::clone(&cb2);
            tokio::task::spawn_blocking(move || {
                for round in 0..ROUNDS {
                    barrier.wait();
                    broker.subscribe("2330.TW", Arc::clone(&cb2));
                    barrier.wait();
                    assert_eq!(broker.subscriber_count("2330.TW"), 1);
                    assert_eq!(
                        hub.polled_symbols(),
                        vec!["2330.tw".to_string()],
                        "live subscriber but symbol missing from polled set (round {})",
                        round
                    );
                    barrier.wait();
                }
            })
        };

        leaver.await.unwrap();
        joiner.await.unwrap();
    }
}

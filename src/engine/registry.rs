use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use log::warn;

use crate::engine::QuoteCallback;
use crate::error::HubError;

/// One named subscription endpoint: a callback plus the set of symbols it
/// currently references. Symbols are held case-folded, each at most once.
struct Channel {
    callback: QuoteCallback,
    symbols: HashSet<String>,
}

/// First reference-counting tier: groups symbol interest by caller-chosen
/// channel identity and fans refreshed quotes out to every channel
/// referencing the symbol.
pub struct ChannelRegistry {
    channels: Mutex<HashMap<String, Channel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Create a channel, or replace its callback if it already exists (the
    /// symbol set is preserved, e.g. across a consumer re-mount).
    pub fn create_or_update_channel(&self, channel_id: &str, callback: QuoteCallback) {
        let mut channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(e) => {
                warn!("channel registry lock poisoned: {}", e);
                return;
            }
        };

        if let Some(channel) = channels.get_mut(channel_id) {
            channel.callback = callback;
        } else {
            channels.insert(
                channel_id.to_string(),
                Channel {
                    callback,
                    symbols: HashSet::new(),
                },
            );
        }
    }

    /// Add a symbol reference on a channel. Idempotent if already referenced.
    pub fn ref_symbol(&self, channel_id: &str, symbol_id: &str) -> Result<(), HubError> {
        let mut channels = self.channels.lock()?;

        match channels.get_mut(channel_id) {
            Some(channel) => {
                channel.symbols.insert(symbol_id.to_lowercase());
                Ok(())
            }
            None => Err(HubError::UnknownChannel(channel_id.to_string())),
        }
    }

    /// Remove a symbol reference from a channel. A symbol never referenced by
    /// this channel is a warned no-op.
    pub fn unref_symbol(&self, channel_id: &str, symbol_id: &str) -> Result<(), HubError> {
        let mut channels = self.channels.lock()?;

        match channels.get_mut(channel_id) {
            Some(channel) => {
                if !channel.symbols.remove(&symbol_id.to_lowercase()) {
                    warn!(
                        "unref of symbol {} not referenced on channel {}",
                        symbol_id, channel_id
                    );
                }
                Ok(())
            }
            None => Err(HubError::UnknownChannel(channel_id.to_string())),
        }
    }

    /// Union of referenced symbols across all channels (the polled set),
    /// case-folded. Recomputed on every call.
    pub fn polled_symbols(&self) -> Vec<String> {
        let channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(_) => return Vec::new(),
        };

        let mut all_symbols = HashSet::new();
        for channel in channels.values() {
            for symbol in &channel.symbols {
                all_symbols.insert(symbol.clone());
            }
        }
        all_symbols.into_iter().collect()
    }

    /// Callbacks of every channel referencing the symbol; one entry per
    /// channel, collected under the lock but intended to be invoked after it
    /// is released.
    pub fn watchers(&self, symbol_id: &str) -> Vec<QuoteCallback> {
        let key = symbol_id.to_lowercase();

        let channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(_) => return Vec::new(),
        };

        channels
            .values()
            .filter(|channel| channel.symbols.contains(&key))
            .map(|channel| channel.callback.clone())
            .collect()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

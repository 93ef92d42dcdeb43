//! Real-time market-quote distribution: a two-level reference-counted
//! subscription registry, a demand-driven coalescing poll loop, and pure
//! display-field rendering on top of the cached snapshots.
//!
//! At most one batched upstream fetch happens per polling interval, no
//! matter how many widgets watch a symbol or how many call sites subscribe
//! to it independently.

pub mod appsvc;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod quote;
pub mod render;
pub mod ui;

pub use engine::{ChannelRegistry, PollState, QuoteCallback, QuoteHub, QuoteStore, SubscriptionBroker};
pub use error::HubError;
pub use fetch::{HttpQuoteFetcher, QuoteFetcher};
pub use quote::{base_code, Quote, Tick};
pub use render::{render_field, ChangePrefix, ColorClass, FieldKind};

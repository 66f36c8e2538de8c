//! Relay of extracted media back to Telegram.
//!
//! - `service` - admission (validation, rate limiting), queue slots and cached extraction
//! - `direct` - direct messages and retry button presses
//! - `inline` - inline queries

pub mod direct;
pub mod inline;
pub mod queue;
pub mod service;

pub use direct::{deliver, relay_admitted, relay_retry, relay_text, DeliveryReport};
pub use inline::inline_results;
pub use queue::{RelayQueue, RelaySlot};
pub use service::{RelayService, RequestSource};

//! Core module: per-connection buffer dan subscription table
//!
//! Prinsip desain:
//! - Bounded: buffer per connection punya kapasitas tetap, dialokasikan sekali
//! - Index-based: read/write cursor eksplisit, tidak ada growable buffer
//! - Weak references: subscription table tidak memiliki connection

mod stream_buffer;
mod subscriptions;

pub use stream_buffer::StreamBuffer;
pub use subscriptions::{Subscription, SubscriptionTable};

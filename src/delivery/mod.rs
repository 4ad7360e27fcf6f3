//! Notification delivery.
//!
//! Renders new feed items into chat messages and sends them to subscribers
//! at a bounded rate.

pub mod gate;
pub mod render;
pub mod throttle;
pub mod transport;

pub use gate::{DeliveryGate, DeliveryReport};
pub use render::{MessageRenderer, MAX_MESSAGE_CHARS};
pub use throttle::Throttle;
pub use transport::ChatTransport;

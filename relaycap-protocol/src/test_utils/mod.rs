//! In-process transport double and provider-side event helpers for tests.
//!
//! Available behind the `test-utils` feature flag.

mod events;
mod mock_transport;

pub use events::{notification, payment_required, response};
pub use mock_transport::{MockTransport, TransportOp};

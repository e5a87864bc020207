//! Typed wrappers for event ids, public keys and subscription ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex strings on the wire all look alike; these wrappers keep an event id
/// from being passed where a public key is expected. No format is enforced
/// here, the signer and the relays own validation.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(EventId, "Content-derived identifier of a signed event (lowercase hex SHA-256).");
typed_id!(PublicKey, "x-only secp256k1 public key of an event author, lowercase hex.");
typed_id!(SubscriptionId, "Transport-assigned identifier of an open subscription.");

/// The id of an in-flight execution is the id of its signed request event.
pub type ExecutionId = EventId;

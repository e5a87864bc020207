//! The signing seam.

use crate::error::SignerError;
use crate::event::{Event, UnsignedEvent};
use crate::id::PublicKey;
use async_trait::async_trait;

/// Authors events.
///
/// Implementations:
/// - `KeySigner` (relaycap-signer): a local secp256k1 key, possibly ephemeral
/// - remote signers (browser extension, bunker) live with the host application
///
/// Signing is where an event's id comes into existence, since the id covers
/// the author's public key.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The public key events will be authored under.
    async fn public_key(&self) -> Result<PublicKey, SignerError>;

    /// Compute the id of `unsigned` under this signer's key and sign it.
    async fn sign(&self, unsigned: UnsignedEvent) -> Result<Event, SignerError>;
}

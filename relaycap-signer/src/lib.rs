#![deny(missing_docs)]
//! Local key signing for relaycap.
//!
//! [`KeySigner`] holds a secp256k1 key pair and produces BIP-340 Schnorr
//! signatures over event ids. Capability calls do not need a stable
//! identity, so [`KeySigner::generate`] (an ephemeral key) is a valid
//! signer for anonymous callers.
//!
//! The secret key never leaves the signer; callers only see public keys
//! and signed events.

use async_trait::async_trait;
use relaycap_protocol::{Event, EventId, PublicKey, Signer, SignerError, UnsignedEvent};
use secp256k1::schnorr::Signature;
use secp256k1::{Keypair, Message, SECP256K1, SecretKey, XOnlyPublicKey};
use std::str::FromStr;

/// Signs events with a local secp256k1 key.
pub struct KeySigner {
    keypair: Keypair,
    public_key: PublicKey,
}

impl KeySigner {
    /// A signer with a freshly generated key.
    pub fn generate() -> Self {
        Self::from_keypair(Keypair::new_global(&mut secp256k1::rand::thread_rng()))
    }

    /// A signer for a hex-encoded 32-byte secret key.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::InvalidKey`] if `secret` is not a valid key.
    pub fn from_secret_hex(secret: &str) -> Result<Self, SignerError> {
        let secret =
            SecretKey::from_str(secret).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        Ok(Self::from_keypair(Keypair::from_secret_key(SECP256K1, &secret)))
    }

    fn from_keypair(keypair: Keypair) -> Self {
        let (xonly, _parity) = keypair.x_only_public_key();
        Self {
            keypair,
            public_key: PublicKey::new(xonly.to_string()),
        }
    }

    /// The public key, without going through the async trait.
    pub fn public_key_hex(&self) -> &PublicKey {
        &self.public_key
    }
}

impl std::fmt::Debug for KeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySigner")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for KeySigner {
    async fn public_key(&self) -> Result<PublicKey, SignerError> {
        Ok(self.public_key.clone())
    }

    async fn sign(&self, unsigned: UnsignedEvent) -> Result<Event, SignerError> {
        let digest = unsigned.id_digest(&self.public_key);
        let signature = SECP256K1.sign_schnorr(&Message::from_digest(digest), &self.keypair);
        Ok(unsigned.into_signed(
            self.public_key.clone(),
            EventId::new(hex::encode(digest)),
            signature.to_string(),
        ))
    }
}

/// Check that `event`'s id matches its content and its signature is valid
/// for its author.
///
/// # Errors
///
/// Returns [`SignerError::InvalidKey`] if the author key or signature cannot
/// be decoded.
pub fn verify(event: &Event) -> Result<bool, SignerError> {
    if event.compute_id() != event.id {
        return Ok(false);
    }
    let digest: [u8; 32] = hex::decode(event.id.as_str())
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| SignerError::InvalidKey(format!("malformed event id {}", event.id)))?;
    let author = XOnlyPublicKey::from_str(event.pubkey.as_str())
        .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
    let signature =
        Signature::from_str(&event.sig).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
    Ok(SECP256K1
        .verify_schnorr(&signature, &Message::from_digest(digest), &author)
        .is_ok())
}

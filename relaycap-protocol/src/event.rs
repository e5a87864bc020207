//! Relay events, kinds and tags.
//!
//! An event's id is the SHA-256 of the compact JSON array
//! `[0, pubkey, created_at, kind, tags, content]`, so it only exists once
//! the author's public key is known. [`UnsignedEvent`] is everything but
//! the author; a [`Signer`](crate::Signer) fills in `pubkey`, `id` and `sig`.

use crate::id::{EventId, PublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Event kind number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(pub u16);

impl Kind {
    /// Capability request published by a client.
    pub const REQUEST: Kind = Kind(25910);
    /// Final response published by a provider.
    pub const RESPONSE: Kind = Kind(26910);
    /// Out-of-band status (errors, payment) published by a provider.
    pub const NOTIFICATION: Kind = Kind(21316);

    /// The raw kind number.
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Well-known tag names.
pub mod tag {
    /// Request method (`tools/call`, ...).
    pub const METHOD: &str = "method";
    /// Public key the event is addressed to or concerns.
    pub const PUBKEY: &str = "p";
    /// Server identifier within a provider.
    pub const SERVER: &str = "s";
    /// Referenced event id; correlates responses with requests.
    pub const EVENT: &str = "e";
    /// Notification status.
    pub const STATUS: &str = "status";
    /// Payment amount, with an optional unit as third element.
    pub const AMOUNT: &str = "amount";
    /// Payment invoice.
    pub const INVOICE: &str = "invoice";
}

/// A single tag: a name followed by positional string values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub Vec<String>);

impl Tag {
    /// Build a tag from its parts, name first.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// `["e", <id>]`
    pub fn event(id: &EventId) -> Self {
        Self::new([tag::EVENT, id.as_str()])
    }

    /// `["p", <pubkey>]`
    pub fn pubkey(pk: &PublicKey) -> Self {
        Self::new([tag::PUBKEY, pk.as_str()])
    }

    /// The tag name, if the tag is not empty.
    pub fn name(&self) -> Option<&str> {
        self.get(0)
    }

    /// The first value after the name.
    pub fn value(&self) -> Option<&str> {
        self.get(1)
    }

    /// Element at `index`, the name being index 0.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }
}

/// An event without author, id or signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    /// Unix timestamp in seconds.
    pub created_at: i64,
    /// Event kind.
    pub kind: Kind,
    /// Tags in order.
    pub tags: Vec<Tag>,
    /// Content, usually a JSON document.
    pub content: String,
}

impl UnsignedEvent {
    /// A new event stamped with the current time.
    pub fn new(kind: Kind, content: impl Into<String>) -> Self {
        Self {
            created_at: chrono::Utc::now().timestamp(),
            kind,
            tags: Vec::new(),
            content: content.into(),
        }
    }

    /// Append a tag.
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// The 32-byte digest that becomes the id once `pubkey` authors this event.
    pub fn id_digest(&self, pubkey: &PublicKey) -> [u8; 32] {
        let canonical = serde_json::json!([
            0,
            pubkey.as_str(),
            self.created_at,
            self.kind.0,
            self.tags,
            self.content,
        ]);
        Sha256::digest(canonical.to_string().as_bytes()).into()
    }

    /// The id this event will have once `pubkey` authors it.
    pub fn compute_id(&self, pubkey: &PublicKey) -> EventId {
        EventId(hex::encode(self.id_digest(pubkey)))
    }

    /// Attach author, id and signature.
    pub fn into_signed(self, pubkey: PublicKey, id: EventId, sig: String) -> Event {
        Event {
            id,
            pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig,
        }
    }
}

/// A signed, content-addressed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Content-derived id.
    pub id: EventId,
    /// Author.
    pub pubkey: PublicKey,
    /// Unix timestamp in seconds.
    pub created_at: i64,
    /// Event kind.
    pub kind: Kind,
    /// Tags in order.
    pub tags: Vec<Tag>,
    /// Content.
    pub content: String,
    /// Schnorr signature over `id`, lowercase hex.
    pub sig: String,
}

impl Event {
    /// First tag named `name`.
    pub fn find_tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name() == Some(name))
    }

    /// Value of the first tag named `name`.
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.find_tag(name).and_then(Tag::value)
    }

    /// Whether any `e` tag points at `id`.
    pub fn references(&self, id: &EventId) -> bool {
        self.tags
            .iter()
            .any(|t| t.name() == Some(tag::EVENT) && t.value() == Some(id.as_str()))
    }

    /// Recompute the id from the event's fields.
    pub fn compute_id(&self) -> EventId {
        UnsignedEvent {
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags.clone(),
            content: self.content.clone(),
        }
        .compute_id(&self.pubkey)
    }
}

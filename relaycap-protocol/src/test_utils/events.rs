//! Events a provider would publish in reply to a request.
//!
//! Ids are derived from content so duplicates compare equal; signatures are
//! left empty because [`MockTransport`](super::MockTransport) does not check them.

use crate::event::{Event, Kind, Tag, UnsignedEvent, tag};
use crate::id::{EventId, PublicKey};

const PROVIDER: &str = "provider-pubkey";

fn finish(unsigned: UnsignedEvent) -> Event {
    let pubkey = PublicKey::new(PROVIDER);
    let id = unsigned.compute_id(&pubkey);
    unsigned.into_signed(pubkey, id, String::new())
}

/// A response event to `request` with the given JSON body.
pub fn response(request: &EventId, body: serde_json::Value) -> Event {
    finish(UnsignedEvent::new(Kind::RESPONSE, body.to_string()).tag(Tag::event(request)))
}

/// A notification to `request` with a `status` tag, extra tags and content.
pub fn notification(
    request: &EventId,
    status: &str,
    extra: Vec<Tag>,
    content: impl Into<String>,
) -> Event {
    let mut unsigned = UnsignedEvent::new(Kind::NOTIFICATION, content)
        .tag(Tag::new([tag::STATUS, status]))
        .tag(Tag::event(request));
    unsigned.tags.extend(extra);
    finish(unsigned)
}

/// A complete `payment-required` notification to `request`.
pub fn payment_required(request: &EventId, amount: &str, invoice: &str) -> Event {
    notification(
        request,
        "payment-required",
        vec![
            Tag::new([tag::AMOUNT, amount, "sats"]),
            Tag::new([tag::INVOICE, invoice]),
            Tag::new([tag::PUBKEY, PROVIDER]),
        ],
        "",
    )
}

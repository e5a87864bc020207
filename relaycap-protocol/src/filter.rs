//! Subscription filters.

use crate::event::{Event, Kind};
use crate::id::EventId;
use serde::{Deserialize, Serialize};

/// Selects events by kind and by `e`-tag reference.
///
/// Serializes to the relay filter shape, e.g.
/// `{"kinds":[26910,21316],"#e":["<id>"]}`. Empty lists match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Accepted kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<Kind>,
    /// Accepted `e`-tag values.
    #[serde(rename = "#e", default, skip_serializing_if = "Vec::is_empty")]
    pub event_refs: Vec<EventId>,
}

impl Filter {
    /// A filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given kinds.
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = Kind>) -> Self {
        self.kinds.extend(kinds);
        self
    }

    /// Restrict to events that reference `id` through an `e` tag.
    pub fn referencing(mut self, id: EventId) -> Self {
        self.event_refs.push(id);
        self
    }

    /// Whether `event` passes this filter.
    pub fn matches(&self, event: &Event) -> bool {
        let kind_ok = self.kinds.is_empty() || self.kinds.contains(&event.kind);
        let ref_ok =
            self.event_refs.is_empty() || self.event_refs.iter().any(|id| event.references(id));
        kind_ok && ref_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Tag, UnsignedEvent};
    use crate::id::PublicKey;

    fn event(kind: Kind, reference: &str) -> Event {
        UnsignedEvent::new(kind, "")
            .tag(Tag::event(&EventId::new(reference)))
            .into_signed(PublicKey::new("pk"), EventId::new("id"), String::new())
    }

    #[test]
    fn serializes_to_relay_shape() {
        let filter = Filter::new()
            .kinds([Kind::RESPONSE, Kind::NOTIFICATION])
            .referencing(EventId::new("abc"));
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kinds": [26910, 21316], "#e": ["abc"]})
        );
    }

    #[test]
    fn matches_kind_and_reference() {
        let filter = Filter::new()
            .kinds([Kind::RESPONSE])
            .referencing(EventId::new("req"));
        assert!(filter.matches(&event(Kind::RESPONSE, "req")));
        assert!(!filter.matches(&event(Kind::NOTIFICATION, "req")));
        assert!(!filter.matches(&event(Kind::RESPONSE, "other")));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&event(Kind(1), "x")));
    }
}

//! Building and signing request events.

use crate::error::ExecutionError;
use relaycap_protocol::event::tag;
use relaycap_protocol::{
    CapabilityCall, Event, Kind, RequestError, ResourceSpec, Signer, Tag, Target, UnsignedEvent,
};
use relaycap_signer::KeySigner;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// The signer an executor signs requests with.
///
/// Either configured up front, or provisioned on first use with an
/// ephemeral [`KeySigner`]. Capability calls do not need a stable identity.
pub struct SignerSlot {
    signer: OnceCell<Arc<dyn Signer>>,
}

impl SignerSlot {
    /// A slot that provisions an ephemeral key on first use.
    pub fn ephemeral() -> Self {
        Self {
            signer: OnceCell::new(),
        }
    }

    /// A slot holding `signer`.
    pub fn configured(signer: Arc<dyn Signer>) -> Self {
        Self {
            signer: OnceCell::new_with(Some(signer)),
        }
    }

    /// Whether a signer exists yet.
    pub fn is_provisioned(&self) -> bool {
        self.signer.initialized()
    }

    /// The signer, provisioning one if needed.
    pub async fn get(&self) -> Arc<dyn Signer> {
        self.signer
            .get_or_init(|| async {
                let signer = KeySigner::generate();
                tracing::info!(pubkey = %signer.public_key_hex(), "provisioned ephemeral signer");
                Arc::new(signer) as Arc<dyn Signer>
            })
            .await
            .clone()
    }
}

impl Default for SignerSlot {
    fn default() -> Self {
        Self::ephemeral()
    }
}

/// Turns capability calls into request events.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder {
    kind: Kind,
}

impl RequestBuilder {
    /// A builder emitting events of `kind`.
    pub fn new(kind: Kind) -> Self {
        Self { kind }
    }

    /// The unsigned request for `call` addressed to `target`.
    ///
    /// Content is the call's JSON body. Tags: `method`, `p` with the
    /// provider key, and `s` when a server id is set.
    pub fn build(
        &self,
        call: &CapabilityCall,
        target: &Target,
    ) -> Result<UnsignedEvent, RequestError> {
        let body =
            serde_json::to_string(call).map_err(|e| RequestError::Encode(e.to_string()))?;
        let mut unsigned = UnsignedEvent::new(self.kind, body)
            .tag(Tag::new([tag::METHOD, call.method().as_str()]))
            .tag(Tag::pubkey(&target.provider));
        if let Some(server) = &target.server_id {
            unsigned = unsigned.tag(Tag::new([tag::SERVER, server.as_str()]));
        }
        Ok(unsigned)
    }

    /// Build and sign. The signed event's id is the execution id.
    pub async fn sign(
        &self,
        call: &CapabilityCall,
        target: &Target,
        signer: &dyn Signer,
    ) -> Result<Event, ExecutionError> {
        let unsigned = self.build(call, target)?;
        Ok(signer.sign(unsigned).await?)
    }
}

/// Drop optional arguments that carry no value.
///
/// An argument is optional when the schema's `required` array does not
/// list it. Optional arguments equal to `null`, `""` or `[]` are removed;
/// required ones are kept as given.
pub fn normalize_arguments(
    arguments: Map<String, Value>,
    input_schema: &Value,
) -> Map<String, Value> {
    let required: Vec<&str> = input_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    arguments
        .into_iter()
        .filter(|(name, value)| required.contains(&name.as_str()) || !is_blank(value))
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Fill `{name}` placeholders in a resource URI template with
/// percent-encoded values. Placeholders without a value are left alone.
///
/// Values are encoded as a URI component: everything but ASCII
/// alphanumerics and `-_.!~*'()` is escaped.
pub fn populate_uri_template<K, V>(
    template: &str,
    values: impl IntoIterator<Item = (K, V)>,
) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut uri = template.to_owned();
    for (name, value) in values {
        let placeholder = format!("{{{}}}", name.as_ref());
        uri = uri.replace(&placeholder, &encode_component(value.as_ref()));
    }
    uri
}

// `urlencoding` also escapes the unreserved marks.
const MARKS: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

fn encode_component(value: &str) -> String {
    MARKS
        .iter()
        .fold(urlencoding::encode(value).into_owned(), |encoded, (escaped, mark)| {
            encoded.replace(escaped, mark)
        })
}

/// A [`ResourceSpec`] for a concrete URI of a templated resource.
pub fn resource_from_template<K, V>(
    name: impl Into<String>,
    template: &str,
    values: impl IntoIterator<Item = (K, V)>,
) -> ResourceSpec
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    ResourceSpec::new(name, populate_uri_template(template, values))
}

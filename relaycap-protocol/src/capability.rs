//! Capability calls, their identities, and the targets they are sent to.
//!
//! A [`CapabilityCall`] is exactly the JSON body of a request event:
//! `{"method": "tools/call", "params": {...}}`.

use crate::error::RequestError;
use crate::id::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three kinds of capability a provider can announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityType {
    /// A callable tool.
    Tool,
    /// A readable resource.
    Resource,
    /// A prompt template.
    Prompt,
}

impl fmt::Display for CapabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
            Self::Prompt => "prompt",
        })
    }
}

/// Key of the observable state for one logical capability.
///
/// The name is the tool or prompt name, or the resource URI. Every
/// invocation of the same capability maps to the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapabilityIdentity {
    /// Tool, resource or prompt.
    pub capability_type: CapabilityType,
    /// Tool/prompt name or resource URI.
    pub name: String,
}

impl CapabilityIdentity {
    /// Create an identity.
    pub fn new(capability_type: CapabilityType, name: impl Into<String>) -> Self {
        Self {
            capability_type,
            name: name.into(),
        }
    }

    /// Identity of a tool.
    pub fn tool(name: impl Into<String>) -> Self {
        Self::new(CapabilityType::Tool, name)
    }

    /// Identity of a resource, keyed by URI.
    pub fn resource(uri: impl Into<String>) -> Self {
        Self::new(CapabilityType::Resource, uri)
    }

    /// Identity of a prompt.
    pub fn prompt(name: impl Into<String>) -> Self {
        Self::new(CapabilityType::Prompt, name)
    }
}

impl fmt::Display for CapabilityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.capability_type, self.name)
    }
}

/// Request method discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityMethod {
    /// `tools/call`
    CallTool,
    /// `resources/read`
    ReadResource,
    /// `prompts/get`
    GetPrompt,
}

impl CapabilityMethod {
    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CallTool => "tools/call",
            Self::ReadResource => "resources/read",
            Self::GetPrompt => "prompts/get",
        }
    }

    /// Parse a wire method name.
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "tools/call" => Some(Self::CallTool),
            "resources/read" => Some(Self::ReadResource),
            "prompts/get" => Some(Self::GetPrompt),
            _ => None,
        }
    }
}

impl fmt::Display for CapabilityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Params of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Tool name.
    pub name: String,
    /// Tool arguments.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

/// Params of `resources/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResourceParams {
    /// Resource URI.
    pub uri: String,
}

/// Params of `prompts/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPromptParams {
    /// Prompt name.
    pub name: String,
    /// Prompt arguments; prompts only take strings.
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
}

/// One capability request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum CapabilityCall {
    /// Invoke a tool.
    #[serde(rename = "tools/call")]
    CallTool(CallToolParams),
    /// Read a resource.
    #[serde(rename = "resources/read")]
    ReadResource(ReadResourceParams),
    /// Render a prompt.
    #[serde(rename = "prompts/get")]
    GetPrompt(GetPromptParams),
}

impl CapabilityCall {
    /// `tools/call` with the given arguments.
    pub fn tool(
        name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self::CallTool(CallToolParams {
            name: name.into(),
            arguments,
        })
    }

    /// `resources/read` of `uri`.
    pub fn resource(uri: impl Into<String>) -> Self {
        Self::ReadResource(ReadResourceParams { uri: uri.into() })
    }

    /// `prompts/get` with the given arguments.
    pub fn prompt(name: impl Into<String>, arguments: BTreeMap<String, String>) -> Self {
        Self::GetPrompt(GetPromptParams {
            name: name.into(),
            arguments,
        })
    }

    /// Parse an arbitrary request body.
    ///
    /// Unknown methods are rejected with [`RequestError::UnknownMethod`]
    /// before anything else is looked at.
    pub fn from_value(body: serde_json::Value) -> Result<Self, RequestError> {
        let method = body
            .get("method")
            .and_then(serde_json::Value::as_str)
            .ok_or(RequestError::MissingMethod)?
            .to_owned();
        if CapabilityMethod::parse(&method).is_none() {
            return Err(RequestError::UnknownMethod(method));
        }
        serde_json::from_value(body).map_err(|e| RequestError::InvalidParams {
            method,
            message: e.to_string(),
        })
    }

    /// The request method.
    pub fn method(&self) -> CapabilityMethod {
        match self {
            Self::CallTool(_) => CapabilityMethod::CallTool,
            Self::ReadResource(_) => CapabilityMethod::ReadResource,
            Self::GetPrompt(_) => CapabilityMethod::GetPrompt,
        }
    }

    /// Which kind of capability this call targets.
    pub fn capability_type(&self) -> CapabilityType {
        match self {
            Self::CallTool(_) => CapabilityType::Tool,
            Self::ReadResource(_) => CapabilityType::Resource,
            Self::GetPrompt(_) => CapabilityType::Prompt,
        }
    }

    /// Tool/prompt name or resource URI.
    pub fn capability_name(&self) -> &str {
        match self {
            Self::CallTool(p) => &p.name,
            Self::ReadResource(p) => &p.uri,
            Self::GetPrompt(p) => &p.name,
        }
    }

    /// The state key this call updates.
    pub fn identity(&self) -> CapabilityIdentity {
        CapabilityIdentity::new(self.capability_type(), self.capability_name())
    }

    /// The `params` object as JSON.
    pub fn params(&self) -> serde_json::Value {
        let encoded = match self {
            Self::CallTool(p) => serde_json::to_value(p),
            Self::ReadResource(p) => serde_json::to_value(p),
            Self::GetPrompt(p) => serde_json::to_value(p),
        };
        encoded.unwrap_or(serde_json::Value::Null)
    }
}

/// Where a call is sent: a provider, optionally narrowed to one of its servers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Provider public key.
    pub provider: PublicKey,
    /// Server identifier within the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
}

impl Target {
    /// Address a provider.
    pub fn new(provider: impl Into<PublicKey>) -> Self {
        Self {
            provider: provider.into(),
            server_id: None,
        }
    }

    /// Narrow to one server of the provider.
    pub fn with_server(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }
}

/// A tool as announced by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    /// Tool name.
    pub name: String,
    /// Announcement-level id, when the provider assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// JSON Schema of the arguments.
    #[serde(default = "empty_object_schema")]
    pub input_schema: serde_json::Value,
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({"type": "object"})
}

impl ToolSpec {
    /// A tool with an open object schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            input_schema: empty_object_schema(),
        }
    }

    /// Set the input schema.
    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Set the announcement id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A resource as announced by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Display name.
    pub name: String,
    /// URI to read.
    pub uri: String,
}

impl ResourceSpec {
    /// Create a resource descriptor.
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
        }
    }
}

/// A prompt as announced by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSpec {
    /// Prompt name.
    pub name: String,
}

impl PromptSpec {
    /// Create a prompt descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

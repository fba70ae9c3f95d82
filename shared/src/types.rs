use std::fmt;
use indexmap::IndexMap;
use serde::{Serialize, Deserialize};

/// The registry as served: node id -> node descriptor.
/// Key order is the order of appearance in the source document.
pub type RegistryDocument = IndexMap<String, serde_json::Value>;

/// A registry document together with the exact bytes it was decoded from.
///
/// The bytes are what gets cached, so numbers beyond `f64` precision,
/// whitespace and escapes survive the round trip untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    bytes: Vec<u8>,
    document: RegistryDocument,
}

impl RawDocument {
    /// Decode `bytes`, which must hold a JSON object.
    pub fn parse(bytes: impl Into<Vec<u8>>) -> serde_json::Result<Self> {
        let bytes = bytes.into();
        let document = serde_json::from_slice(&bytes)?;
        Ok(Self { bytes, document })
    }

    /// Encode an in-memory document.
    pub fn from_document(document: RegistryDocument) -> serde_json::Result<Self> {
        let bytes = serde_json::to_vec(&document)?;
        Ok(Self { bytes, document })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn document(&self) -> &RegistryDocument {
        &self.document
    }

    pub fn into_document(self) -> RegistryDocument {
        self.document
    }
}

/// Geographic position of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Reported state of a node.
/// Unrecognised values are preserved rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Online,
    Offline,
    Other(String),
}

impl NodeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            NodeStatus::Online => "online",
            NodeStatus::Offline => "offline",
            NodeStatus::Other(s) => s,
        }
    }
}

impl From<&str> for NodeStatus {
    fn from(s: &str) -> Self {
        match s {
            "online" => NodeStatus::Online,
            "offline" => NodeStatus::Offline,
            other => NodeStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

use indexmap::IndexMap;
use shared::types::RegistryDocument;
use crate::error::{RegistryError, Result};
use crate::model::node::Node;

/// The parsed registry: every node, keyed and ordered as in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    document: RegistryDocument,
    nodes: IndexMap<String, Node>,
}

impl Registry {
    /// Build the entity graph. Fails on the first missing or invalid
    /// required field, naming the node (and service) it belongs to.
    pub fn from_document(document: RegistryDocument) -> Result<Self> {
        let nodes = document
            .iter()
            .map(|(id, value)| Node::from_json(id, value).map(|node| (id.clone(), node)))
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Self { document, nodes })
    }

    /// The document the graph was built from
    pub fn document(&self) -> &RegistryDocument {
        &self.document
    }

    pub fn node(&self, id: &str) -> Result<&Node> {
        self.nodes.get(id).ok_or_else(|| RegistryError::UnknownNode {
            node: id.to_string(),
        })
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

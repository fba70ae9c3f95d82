use std::fmt;
use serde_json::Value;
use shared::protocol::rel;
use crate::error::RegistryError;
use crate::model::fields::{self, Site};
use crate::model::links::Links;

/// A named capability exposed by a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    name: String,
    node_id: String,
    description: String,
    keywords: Vec<String>,
    links: Links,
}

impl Service {
    /// Parse the `position`-th service entry of `node_id`.
    pub(crate) fn from_json(node_id: &str, position: usize, value: &Value) -> Result<Self, RegistryError> {
        // Until the name is known, the service is identified by its position
        let placeholder = format!("#{position}");
        let site = Site::Service {
            node: node_id,
            service: &placeholder,
        };
        let obj = fields::as_object(value, site, "services")?;
        let name = fields::string(obj, site, "name")?;

        let site = Site::Service {
            node: node_id,
            service: &name,
        };
        let keywords = fields::strings(obj, site, "keywords")?;
        let description = fields::string(obj, site, "description")?;
        let links = Links::parse(fields::array(obj, site, "links")?, site)?;

        Ok(Self {
            node_id: node_id.to_string(),
            name,
            description,
            keywords,
            links,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the node offering this service
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    /// The service endpoint itself
    pub fn url(&self) -> Option<&str> {
        self.links.get(rel::SERVICE)
    }

    pub fn doc_url(&self) -> Option<&str> {
        self.links.get(rel::SERVICE_DOC)
    }

    pub fn description_url(&self) -> Option<&str> {
        self.links.get(rel::SERVICE_DESC)
    }

    pub fn conformance_url(&self) -> Option<&str> {
        self.links.get(rel::CONFORMANCE)
    }

    pub fn links(&self) -> &Links {
        &self.links
    }
}

/// `{}` names the service; `{:#}` gives its endpoint, or the name when it
/// publishes no `service` link.
impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(self.url().unwrap_or(&self.name))
        } else {
            write!(f, "service: {}", self.name)
        }
    }
}

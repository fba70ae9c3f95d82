use indexmap::IndexMap;
use serde_json::Value;
use crate::error::RegistryError;
use crate::model::fields::{self, Site};

/// Link relations of a node or service, keyed by `rel`.
///
/// Named accessors on [`Node`](crate::Node) and [`Service`](crate::Service)
/// cover the relations this crate knows about; [`Links::get`] reaches the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    by_rel: IndexMap<String, String>,
}

impl Links {
    /// Build from `[{"rel": ..., "href": ...}, ...]`. A repeated `rel` keeps
    /// its first position and its last `href`.
    pub(crate) fn parse(items: &[Value], site: Site<'_>) -> Result<Self, RegistryError> {
        let mut by_rel = IndexMap::with_capacity(items.len());
        for item in items {
            let link = fields::as_object(item, site, "links")?;
            let rel = link
                .get("rel")
                .and_then(Value::as_str)
                .ok_or_else(|| site.error("links", "link without a string 'rel'"))?;
            let href = link
                .get("href")
                .and_then(Value::as_str)
                .ok_or_else(|| site.error("links", format!("link '{rel}' without a string 'href'")))?;
            by_rel.insert(rel.to_string(), href.to_string());
        }
        Ok(Self { by_rel })
    }

    pub fn get(&self, rel: &str) -> Option<&str> {
        self.by_rel.get(rel).map(String::as_str)
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.by_rel.contains_key(rel)
    }

    /// `(rel, href)` pairs in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_rel.iter().map(|(rel, href)| (rel.as_str(), href.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_rel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_rel.is_empty()
    }
}

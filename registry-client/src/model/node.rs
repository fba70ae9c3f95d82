use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use shared::protocol::rel;
use shared::types::{Location, NodeStatus};
use crate::error::{RegistryError, Result};
use crate::model::fields::{self, Site};
use crate::model::links::Links;
use crate::model::service::Service;

/// A service-hosting endpoint in the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    description: String,
    affiliation: String,
    contact: String,
    location: Location,
    date_added: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    version: String,
    status: NodeStatus,
    links: Links,
    services: IndexMap<String, Service>,
}

impl Node {
    pub(crate) fn from_json(id: &str, value: &Value) -> Result<Self> {
        let site = Site::Node(id);
        let obj = fields::as_object(value, site, "node")?;

        let location = serde_json::from_value::<Location>(fields::required(obj, site, "location")?.clone())
            .map_err(|e| site.error("location", e.to_string()))?;

        let mut services = IndexMap::new();
        for (position, entry) in fields::array(obj, site, "services")?.iter().enumerate() {
            let service = Service::from_json(id, position, entry)?;
            if services.contains_key(service.name()) {
                return Err(site.error(
                    "services",
                    format!("service '{}' is listed more than once", service.name()),
                ));
            }
            services.insert(service.name().to_string(), service);
        }

        Ok(Self {
            id: id.to_string(),
            description: fields::string(obj, site, "description")?,
            affiliation: fields::string(obj, site, "affiliation")?,
            contact: fields::string(obj, site, "contact")?,
            location,
            date_added: fields::timestamp(obj, site, "date_added")?,
            last_updated: fields::timestamp(obj, site, "last_updated")?,
            version: fields::string(obj, site, "version")?,
            status: NodeStatus::from(fields::string(obj, site, "status")?.as_str()),
            links: Links::parse(fields::array(obj, site, "links")?, site)?,
            services,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn affiliation(&self) -> &str {
        &self.affiliation
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn date_added(&self) -> DateTime<Utc> {
        self.date_added
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Version of the software stack the node runs
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn status(&self) -> &NodeStatus {
        &self.status
    }

    pub fn is_online(&self) -> bool {
        self.status == NodeStatus::Online
    }

    /// Public entry point of the node
    pub fn url(&self) -> Option<&str> {
        self.links.get(rel::SERVICE)
    }

    pub fn collection_url(&self) -> Option<&str> {
        self.links.get(rel::COLLECTION)
    }

    pub fn version_url(&self) -> Option<&str> {
        self.links.get(rel::VERSION)
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn service(&self, name: &str) -> Result<&Service> {
        self.services
            .get(name)
            .ok_or_else(|| RegistryError::ServiceNotAvailable {
                node: self.id.clone(),
                service: name.to_string(),
            })
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Services in the order the registry lists them
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn node_json() -> Value {
        json!({
            "description": "Node A",
            "affiliation": "University A",
            "location": {"latitude": 45.5, "longitude": -73.6},
            "contact": "admin@a.example",
            "date_added": "2023-01-01T00:00:00Z",
            "last_updated": "2023-06-01T12:30:00Z",
            "version": "1.26.0",
            "status": "online",
            "links": [
                {"rel": "service", "href": "https://a.example/"},
                {"rel": "collection", "href": "https://a.example/services"},
                {"rel": "version", "href": "https://a.example/version"},
            ],
            "services": [
                {"name": "wps", "keywords": ["processing"], "description": "WPS",
                 "links": [{"rel": "service", "href": "https://a.example/wps"}]},
                {"name": "thredds", "keywords": ["data"], "description": "THREDDS",
                 "links": [{"rel": "service", "href": "https://a.example/thredds"}]},
            ]
        })
    }

    #[test]
    fn test_parse_node() {
        let node = Node::from_json("nodeA", &node_json()).unwrap();

        assert_eq!(node.id(), "nodeA");
        assert_eq!(node.description(), "Node A");
        assert_eq!(node.affiliation(), "University A");
        assert_eq!(node.contact(), "admin@a.example");
        assert_eq!(node.location(), Location { latitude: 45.5, longitude: -73.6 });
        assert_eq!(node.date_added(), Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(node.last_updated(), Utc.with_ymd_and_hms(2023, 6, 1, 12, 30, 0).unwrap());
        assert_eq!(node.version(), "1.26.0");
        assert!(node.is_online());
        assert_eq!(node.url(), Some("https://a.example/"));
        assert_eq!(node.collection_url(), Some("https://a.example/services"));
        assert_eq!(node.version_url(), Some("https://a.example/version"));
    }

    #[test]
    fn test_service_lookup() {
        let node = Node::from_json("nodeA", &node_json()).unwrap();

        assert_eq!(node.service("wps").unwrap().name(), "wps");
        assert!(node.has_service("thredds"));
        assert!(!node.has_service("wcs"));

        match node.service("wcs").unwrap_err() {
            RegistryError::ServiceNotAvailable { node, service } => {
                assert_eq!(node, "nodeA");
                assert_eq!(service, "wcs");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_services_keep_document_order() {
        let node = Node::from_json("nodeA", &node_json()).unwrap();
        assert_eq!(node.service_names().collect::<Vec<_>>(), vec!["wps", "thredds"]);
        assert!(node.services().all(|s| s.node_id() == "nodeA"));
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let mut value = node_json();
        value["status"] = json!("maintenance");

        let node = Node::from_json("nodeA", &value).unwrap();
        assert!(!node.is_online());
        assert_eq!(node.status().as_str(), "maintenance");
    }

    #[test]
    fn test_missing_required_field_names_node_and_field() {
        for field in [
            "description",
            "affiliation",
            "location",
            "contact",
            "date_added",
            "last_updated",
            "version",
            "status",
            "links",
            "services",
        ] {
            let mut value = node_json();
            value.as_object_mut().unwrap().remove(field);

            match Node::from_json("nodeA", &value).unwrap_err() {
                RegistryError::MalformedNode { node, field: f, .. } => {
                    assert_eq!(node, "nodeA");
                    assert_eq!(f, field);
                }
                other => panic!("unexpected error for {field}: {other}"),
            }
        }
    }

    #[test]
    fn test_bad_timestamp() {
        let mut value = node_json();
        value["date_added"] = json!("last tuesday");

        let err = Node::from_json("nodeA", &value).unwrap_err();
        assert!(err.to_string().contains("date_added"));
        assert!(err.to_string().contains("last tuesday"));
    }

    #[test]
    fn test_reduced_precision_timestamps() {
        let mut value = node_json();
        value["date_added"] = json!("2023-06-01T10:00Z");
        value["last_updated"] = json!("2023-06");

        let node = Node::from_json("nodeA", &value).unwrap();
        assert_eq!(node.date_added(), Utc.with_ymd_and_hms(2023, 6, 1, 10, 0, 0).unwrap());
        assert_eq!(node.last_updated(), Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_duplicate_service_names_rejected() {
        let mut value = node_json();
        value["services"][1]["name"] = json!("wps");

        let err = Node::from_json("nodeA", &value).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedNode { ref field, .. } if field == "services"));
    }

    #[test]
    fn test_malformed_service_propagates() {
        let mut value = node_json();
        value["services"][0].as_object_mut().unwrap().remove("keywords");

        let err = Node::from_json("nodeA", &value).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedService { ref service, .. } if service == "wps"));
    }
}

//! Typed view of the registry document.

pub(crate) mod fields;
pub mod links;
pub mod node;
pub mod registry;
pub mod service;
pub mod timestamp;

pub use links::Links;
pub use node::Node;
pub use registry::Registry;
pub use service::Service;

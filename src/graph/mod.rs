//! Core graph data structures

mod model;
mod node;
mod relationship;

pub use model::GraphModel;
pub use node::{Node, NodeId, NodeKey, Properties, ROW_KEY_PROPERTY};
pub use relationship::Relationship;

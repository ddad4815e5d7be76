//! Relationship graph: construction, layered layout and selection overlay.

mod builder;
mod changes;
mod highlight;
mod layout;
mod types;

pub use builder::build_from_snapshot;
pub use changes::{EdgeChange, NodeChange, apply_edge_changes, apply_node_changes};
pub use highlight::{Highlighter, Selection};
pub use layout::{DagreLayout, Direction, NodeSize, layout};
pub use types::{Graph, GraphEdge, GraphNode, HandleSide, Position, RelationKind};

#[cfg(test)]
pub use types::NodeKind;

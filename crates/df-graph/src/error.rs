//! Graph-specific error types.

use df_core::{CoreError, EdgeId, GridKey, NodeId};

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An edge refers to a node that doesn't exist.
    InvalidNodeRef { edge: EdgeId, node: NodeId },

    /// An edge starts and ends at the same node.
    SelfLoop { node: NodeId },

    /// Two nodes share the same grid position.
    DuplicatePosition { node: NodeId, other: NodeId },

    /// Adjacency list is inconsistent (edge in node's list but edge doesn't touch node).
    InconsistentAdjacency { edge: EdgeId, node: NodeId },

    /// No node at the requested grid position.
    PositionNotFound { key: GridKey },

    /// Node id not present in the graph.
    NodeNotFound { node: NodeId },

    /// The graph was expected to be a tree.
    NotATree { nodes: usize, edges: usize },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidNodeRef { edge, node } => {
                write!(f, "Edge {} refers to non-existent node {}", edge, node)
            }
            GraphError::SelfLoop { node } => {
                write!(f, "Edge would connect node {} to itself", node)
            }
            GraphError::DuplicatePosition { node, other } => {
                write!(f, "Nodes {} and {} share the same grid position", node, other)
            }
            GraphError::InconsistentAdjacency { edge, node } => {
                write!(
                    f,
                    "Edge {} in node {}'s adjacency list but doesn't touch that node",
                    edge, node
                )
            }
            GraphError::PositionNotFound { key } => {
                write!(f, "No node at grid position ({}, {}, {})", key.x, key.y, key.z)
            }
            GraphError::NodeNotFound { node } => write!(f, "Node {} not found", node),
            GraphError::NotATree { nodes, edges } => {
                write!(
                    f,
                    "Graph with {} nodes and {} edges is not a connected tree",
                    nodes, edges
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for CoreError {
    fn from(err: GraphError) -> Self {
        CoreError::Invariant {
            what: Box::leak(err.to_string().into_boxed_str()),
        }
    }
}

//! df-graph: graph/model layer for ductflow.
//!
//! Provides:
//! - Arena graph data structures (Node, Edge, DuctGraph)
//! - Incremental graph builder with validation
//! - Level trees and the composed, oriented `Network` with edge annotations
//!
//! # Example
//!
//! ```
//! use df_core::Point;
//! use df_graph::{GraphBuilder, NodeRole};
//!
//! let mut builder = GraphBuilder::new();
//! let a = builder.add_node(Point::new(0.0, 0.0, 0.0), NodeRole::Trunk);
//! let b = builder.add_node(Point::new(4.0, 0.0, 0.0), NodeRole::Intersection);
//! builder.add_edge(a, b).unwrap();
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.nodes().len(), 2);
//! assert_eq!(graph.edges().len(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod network;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{Capabilities, Demand, DuctGraph, Edge, Node, NodeRole};
pub use network::{EdgeAnnotation, FlowDirection, LevelTree, Network};
pub use validate::is_tree;

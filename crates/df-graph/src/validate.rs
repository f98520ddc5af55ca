//! Graph validation logic.

use std::collections::{HashMap, HashSet};

use df_core::{EdgeId, GridKey, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{DuctGraph, Edge, Node};

/// Validate the graph structure: all references exist, positions are unique, etc.
pub(crate) fn validate_structure(nodes: &[Node], edges: &[Edge]) -> GraphResult<()> {
    // Node ids are contiguous and unique by position
    let mut seen: HashMap<GridKey, NodeId> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        if node.id.idx() != i {
            return Err(GraphError::InconsistentAdjacency {
                edge: EdgeId::from_index(0),
                node: node.id,
            });
        }
        if let Some(&other) = seen.get(&node.key()) {
            return Err(GraphError::DuplicatePosition {
                node: node.id,
                other,
            });
        }
        seen.insert(node.key(), node.id);
    }

    for (i, edge) in edges.iter().enumerate() {
        if edge.id.idx() != i {
            return Err(GraphError::InconsistentAdjacency {
                edge: edge.id,
                node: edge.a,
            });
        }
        for node in [edge.a, edge.b] {
            if node.idx() >= nodes.len() {
                return Err(GraphError::InvalidNodeRef {
                    edge: edge.id,
                    node,
                });
            }
        }
        if edge.a == edge.b {
            return Err(GraphError::SelfLoop { node: edge.a });
        }
    }

    Ok(())
}

/// Validate adjacency lists for consistency.
pub(crate) fn validate_adjacency(
    nodes: &[Node],
    edges: &[Edge],
    node_edge_offsets: &[usize],
    node_edges: &[EdgeId],
) -> GraphResult<()> {
    if node_edge_offsets.len() != nodes.len() + 1 {
        return Err(GraphError::InconsistentAdjacency {
            edge: EdgeId::from_index(0),
            node: nodes.first().map_or(NodeId::from_index(0), |n| n.id),
        });
    }

    for node in nodes {
        let idx = node.id.idx();
        let start = node_edge_offsets[idx];
        let end = node_edge_offsets[idx + 1];

        for &edge_id in &node_edges[start..end] {
            let Some(edge) = edges.get(edge_id.idx()) else {
                return Err(GraphError::InconsistentAdjacency {
                    edge: edge_id,
                    node: node.id,
                });
            };
            if !edge.touches(node.id) {
                return Err(GraphError::InconsistentAdjacency {
                    edge: edge_id,
                    node: node.id,
                });
            }
        }
    }

    // Every edge appears exactly twice (once per endpoint)
    let mut counts: HashMap<EdgeId, usize> = HashMap::new();
    for &edge_id in node_edges {
        *counts.entry(edge_id).or_default() += 1;
    }
    let listed: HashSet<EdgeId> = counts.keys().copied().collect();
    for edge in edges {
        if !listed.contains(&edge.id) || counts[&edge.id] != 2 {
            return Err(GraphError::InconsistentAdjacency {
                edge: edge.id,
                node: edge.a,
            });
        }
    }

    Ok(())
}

/// Whether the graph is a single connected tree.
pub fn is_tree(graph: &DuctGraph) -> bool {
    let n = graph.nodes().len();
    if n == 0 || graph.edges().len() != n - 1 {
        return false;
    }
    petgraph::algo::connected_components(&graph.to_petgraph()) == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::graph::NodeRole;
    use df_core::{Id, Point};
    use df_core::units::m;

    #[test]
    fn validate_empty_graph() {
        assert!(validate_structure(&[], &[]).is_ok());
    }

    #[test]
    fn validate_invalid_node_ref() {
        let nodes = vec![Node {
            id: Id::from_index(0),
            position: Point::new(0.0, 0.0, 0.0),
            role: NodeRole::Trunk,
            demand: None,
        }];
        let edges = vec![Edge {
            id: Id::from_index(0),
            a: Id::from_index(0),
            b: Id::from_index(99),
            length: m(1.0),
            axis: None,
        }];

        let result = validate_structure(&nodes, &edges);
        assert!(matches!(result, Err(GraphError::InvalidNodeRef { .. })));
    }

    #[test]
    fn validate_duplicate_positions() {
        let nodes = vec![
            Node {
                id: Id::from_index(0),
                position: Point::new(0.0, 0.0, 0.0),
                role: NodeRole::Trunk,
                demand: None,
            },
            Node {
                id: Id::from_index(1),
                position: Point::new(0.0, 0.0, 0.0),
                role: NodeRole::Intersection,
                demand: None,
            },
        ];
        let result = validate_structure(&nodes, &[]);
        assert!(matches!(result, Err(GraphError::DuplicatePosition { .. })));
    }

    #[test]
    fn tree_detection() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_node(Point::new(0.0, 0.0, 0.0), NodeRole::Trunk);
        let b = builder.add_node(Point::new(1.0, 0.0, 0.0), NodeRole::Intersection);
        let c = builder.add_node(Point::new(1.0, 1.0, 0.0), NodeRole::Intersection);
        builder.add_edge(a, b).unwrap();
        builder.add_edge(b, c).unwrap();
        let chain = builder.build().unwrap();
        assert!(is_tree(&chain));

        let mut builder = GraphBuilder::new();
        let a = builder.add_node(Point::new(0.0, 0.0, 0.0), NodeRole::Trunk);
        let b = builder.add_node(Point::new(1.0, 0.0, 0.0), NodeRole::Intersection);
        let c = builder.add_node(Point::new(1.0, 1.0, 0.0), NodeRole::Intersection);
        let d = builder.add_node(Point::new(0.0, 1.0, 0.0), NodeRole::Intersection);
        builder.add_edge(a, b).unwrap();
        builder.add_edge(c, d).unwrap();
        builder.add_edge(a, c).unwrap();
        builder.add_edge(b, c).unwrap();
        let cyclic = builder.build().unwrap();
        assert!(!is_tree(&cyclic));
    }
}

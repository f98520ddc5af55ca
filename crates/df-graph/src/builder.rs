//! Incremental graph builder.

use std::collections::HashMap;

use df_core::units::m;
use df_core::{EdgeId, GridKey, NodeId, Point};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Demand, DuctGraph, Edge, Node, NodeRole};
use crate::validate;

/// Builder for constructing a graph incrementally.
///
/// Use `add_node` and `add_edge` to build up the graph,
/// then call `build()` to validate and freeze it into an immutable `DuctGraph`.
/// Nodes are identified by their rounded position: adding a node twice at the
/// same grid key returns the existing id.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    by_key: HashMap<GridKey, NodeId>,
    edge_index: HashMap<(NodeId, NodeId), EdgeId>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node (or return the one already at that position).
    ///
    /// An existing `Intersection` is promoted when re-added as a `Terminal`;
    /// every other role is kept as first assigned.
    pub fn add_node(&mut self, position: Point, role: NodeRole) -> NodeId {
        let position = position.snapped();
        let key = position.key();
        if let Some(&id) = self.by_key.get(&key) {
            let node = &mut self.nodes[id.idx()];
            if node.role == NodeRole::Intersection && role == NodeRole::Terminal {
                node.role = NodeRole::Terminal;
            }
            return id;
        }
        let id = NodeId::from_usize(self.nodes.len());
        self.nodes.push(Node {
            id,
            position,
            role,
            demand: None,
        });
        self.by_key.insert(key, id);
        id
    }

    /// Add a terminal node carrying a demand.
    pub fn add_terminal(&mut self, position: Point, demand: Demand) -> NodeId {
        let id = self.add_node(position, NodeRole::Terminal);
        let node = &mut self.nodes[id.idx()];
        if node.role == NodeRole::Terminal && node.demand.is_none() {
            node.demand = Some(demand);
        }
        id
    }

    /// Copy a node from another graph, keeping its role and demand.
    pub fn add_node_like(&mut self, node: &Node) -> NodeId {
        let id = self.add_node(node.position, node.role);
        if self.nodes[id.idx()].demand.is_none() {
            self.nodes[id.idx()].demand = node.demand.clone();
        }
        id
    }

    /// Connect two nodes with a straight segment; returns the existing edge if
    /// the pair is already connected.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> GraphResult<EdgeId> {
        let next = EdgeId::from_usize(self.edges.len());
        for node in [a, b] {
            if node.idx() >= self.nodes.len() {
                return Err(GraphError::InvalidNodeRef { edge: next, node });
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop { node: a });
        }
        let pair = if a < b { (a, b) } else { (b, a) };
        if let Some(&existing) = self.edge_index.get(&pair) {
            return Ok(existing);
        }

        let pa = self.nodes[a.idx()].position;
        let pb = self.nodes[b.idx()].position;
        self.edges.push(Edge {
            id: next,
            a,
            b,
            length: m(pa.distance(&pb)),
            axis: pa.axis_to(&pb),
        });
        self.edge_index.insert(pair, next);
        Ok(next)
    }

    /// Whether a node already sits at `position`.
    pub fn find(&self, position: &Point) -> Option<NodeId> {
        self.by_key.get(&position.key()).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Build and validate the graph, returning an immutable `DuctGraph`.
    ///
    /// This performs validation and constructs compact adjacency lists.
    pub fn build(self) -> GraphResult<DuctGraph> {
        validate::validate_structure(&self.nodes, &self.edges)?;

        let (node_edge_offsets, node_edges) = Self::build_adjacency(&self.nodes, &self.edges);

        validate::validate_adjacency(&self.nodes, &self.edges, &node_edge_offsets, &node_edges)?;

        Ok(DuctGraph {
            nodes: self.nodes,
            edges: self.edges,
            node_edge_offsets,
            node_edges,
            by_key: self.by_key,
        })
    }

    /// Build compact adjacency lists: for each node, collect its incident edges.
    fn build_adjacency(nodes: &[Node], edges: &[Edge]) -> (Vec<usize>, Vec<EdgeId>) {
        let mut node_to_edges: HashMap<NodeId, Vec<EdgeId>> = HashMap::new();
        for edge in edges {
            node_to_edges.entry(edge.a).or_default().push(edge.id);
            node_to_edges.entry(edge.b).or_default().push(edge.id);
        }

        // Sort each node's edge list for determinism
        for list in node_to_edges.values_mut() {
            list.sort_by_key(|e| e.index());
        }

        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        let mut flat = Vec::new();
        offsets.push(0);

        for node in nodes {
            if let Some(list) = node_to_edges.get(&node.id) {
                flat.extend_from_slice(list);
            }
            offsets.push(flat.len());
        }

        (offsets, flat)
    }
}

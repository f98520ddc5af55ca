//! Core graph data structures.

use std::collections::HashMap;
use std::ops::BitOr;

use df_core::units::{Length, VolumeRate};
use df_core::{Axis, EdgeId, GridKey, NodeId, Point};
use petgraph::graph::{NodeIndex, UnGraph};

/// What a node stands for in the duct network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// A room outlet with a fixed demand.
    Terminal,
    /// A synthetic grid crossing of two terminal rows/columns.
    Intersection,
    /// The point where a level's tree joins the vertical riser.
    Trunk,
    /// The air-handling unit.
    Source,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Terminal => "terminal",
            NodeRole::Intersection => "intersection",
            NodeRole::Trunk => "trunk",
            NodeRole::Source => "source",
        }
    }

    /// Roles a tree must never drop during pruning.
    pub fn is_anchor(&self) -> bool {
        matches!(self, NodeRole::Terminal | NodeRole::Trunk | NodeRole::Source)
    }
}

/// Cross-cutting node traits, resolved once when junctions are classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    /// Draws or injects a fixed flow.
    pub const DEMAND: Capabilities = Capabilities(1);
    /// Joins three or more duct segments.
    pub const JUNCTION: Capabilities = Capabilities(1 << 1);
    /// A fitting that needs a local loss coefficient.
    pub const LOSS_FITTING: Capabilities = Capabilities(1 << 2);
    /// Holds the external pressure reference.
    pub const REFERENCE: Capabilities = Capabilities(1 << 3);

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Capabilities) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

/// Fixed demand attached to a terminal node.
#[derive(Debug, Clone, PartialEq)]
pub struct Demand {
    /// Room name or number from the geometry source.
    pub room: String,
    /// Required flow magnitude; the sign follows the network direction.
    pub flow: VolumeRate,
    /// Usage classification (office, toilet, ...).
    pub usage: String,
}

/// A point of the routing graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
    pub role: NodeRole,
    pub demand: Option<Demand>,
}

impl Node {
    pub fn key(&self) -> GridKey {
        self.position.key()
    }

    pub fn is_terminal(&self) -> bool {
        self.role == NodeRole::Terminal
    }
}

/// A straight duct segment between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub a: NodeId,
    pub b: NodeId,
    pub length: Length,
    /// `None` for oblique segments (only the source link may be oblique).
    pub axis: Option<Axis>,
}

impl Edge {
    /// The endpoint opposite to `node`, if `node` is an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.a == node {
            Some(self.b)
        } else if self.b == node {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.a == node || self.b == node
    }
}

/// The graph: a validated, immutable arena of nodes and edges.
///
/// The graph stores:
/// - All nodes and edges in vectors (indexed by their IDs).
/// - Compact adjacency: for each node, which edges are incident.
/// - A position index from grid key to node.
///
/// Refinement never mutates a `DuctGraph`; it builds a new one.
#[derive(Debug, Clone)]
pub struct DuctGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,

    /// Offsets for node->edge adjacency: node i's edges are in node_edges[node_edge_offsets[i]..node_edge_offsets[i+1]].
    pub(crate) node_edge_offsets: Vec<usize>,

    /// Flat list of edge IDs incident to nodes (sorted by node ID then edge ID for determinism).
    pub(crate) node_edges: Vec<EdgeId>,

    pub(crate) by_key: HashMap<GridKey, NodeId>,
}

impl DuctGraph {
    /// Return all nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return all edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get a node by ID (returns None if ID out of bounds).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    /// Get an edge by ID (returns None if ID out of bounds).
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.idx())
    }

    /// All edge IDs incident to a given node.
    pub fn node_edges(&self, node_id: NodeId) -> &[EdgeId] {
        let idx = node_id.idx();
        if idx >= self.nodes.len() {
            return &[];
        }
        let start = self.node_edge_offsets[idx];
        let end = self.node_edge_offsets[idx + 1];
        &self.node_edges[start..end]
    }

    pub fn degree(&self, node_id: NodeId) -> usize {
        self.node_edges(node_id).len()
    }

    /// `(edge, neighbour)` pairs around a node.
    pub fn neighbors(&self, node_id: NodeId) -> impl Iterator<Item = (EdgeId, NodeId)> + '_ {
        self.node_edges(node_id).iter().filter_map(move |&e| {
            let other = self.edges[e.idx()].other(node_id)?;
            Some((e, other))
        })
    }

    /// Node at a position (after grid rounding).
    pub fn find(&self, position: &Point) -> Option<NodeId> {
        self.by_key.get(&position.key()).copied()
    }

    pub fn find_key(&self, key: GridKey) -> Option<NodeId> {
        self.by_key.get(&key).copied()
    }

    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.node_edges(a)
            .iter()
            .copied()
            .find(|&e| self.edges[e.idx()].other(a) == Some(b))
    }

    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.node(id).map(|n| n.position)
    }

    pub fn role(&self, id: NodeId) -> Option<NodeRole> {
        self.node(id).map(|n| n.role)
    }

    /// Nodes of degree one.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| self.degree(n.id) == 1)
            .map(|n| n.id)
            .collect()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|n| n.is_terminal())
    }

    /// Sum of all segment lengths.
    pub fn total_length(&self) -> Length {
        self.edges
            .iter()
            .fold(Length::default(), |acc, e| acc + e.length)
    }

    /// Undirected petgraph view weighted by segment length in metres.
    ///
    /// Petgraph node index `i` is arena node `i`, so indices convert with
    /// [`NodeIndex::new`] / [`NodeIndex::index`].
    pub fn to_petgraph(&self) -> UnGraph<NodeId, f64> {
        let mut g = UnGraph::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            g.add_node(node.id);
        }
        for edge in &self.edges {
            g.add_edge(
                NodeIndex::new(edge.a.idx()),
                NodeIndex::new(edge.b.idx()),
                edge.length.value,
            );
        }
        g
    }
}

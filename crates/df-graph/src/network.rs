//! Level trees and the composed, source-oriented duct network.

use std::collections::VecDeque;

use df_core::units::{Area, Length, Pressure, VolumeRate};
use df_core::{CrossSection, EdgeId, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Capabilities, DuctGraph, Node, NodeRole};
use crate::validate::is_tree;

/// Which way air moves through the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowDirection {
    /// Source → terminals.
    Supply,
    /// Terminals → source.
    Exhaust,
}

impl FlowDirection {
    /// +1 for supply, -1 for exhaust.
    pub fn sign(self) -> f64 {
        match self {
            FlowDirection::Supply => 1.0,
            FlowDirection::Exhaust => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowDirection::Supply => "supply",
            FlowDirection::Exhaust => "exhaust",
        }
    }
}

/// Spanning tree of one building level.
#[derive(Debug, Clone)]
pub struct LevelTree {
    pub elevation: f64,
    pub trunk: NodeId,
    pub graph: DuctGraph,
}

impl LevelTree {
    pub fn new(elevation: f64, trunk: NodeId, graph: DuctGraph) -> GraphResult<Self> {
        if !is_tree(&graph) {
            return Err(GraphError::NotATree {
                nodes: graph.nodes().len(),
                edges: graph.edges().len(),
            });
        }
        Ok(Self {
            elevation,
            trunk,
            graph,
        })
    }

    pub fn terminal_count(&self) -> usize {
        self.graph.terminals().count()
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.graph.leaves()
    }

    pub fn total_length(&self) -> Length {
        self.graph.total_length()
    }
}

/// Per-edge results filled in by sizing and hydraulics. Topology never changes
/// once a `Network` exists; only these attributes are added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeAnnotation {
    pub flow: VolumeRate,
    pub section: Option<CrossSection>,
    pub equivalent_diameter: Option<Length>,
    pub wetted_perimeter: Option<Length>,
    pub surface_area: Option<Area>,
    pub loss_coefficient: Option<f64>,
    pub friction_loss: Option<Pressure>,
    pub fitting_loss: Option<Pressure>,
}

/// The composed multi-level tree, oriented away from the source.
#[derive(Debug, Clone)]
pub struct Network {
    graph: DuctGraph,
    source: NodeId,
    direction: FlowDirection,
    /// Per node: the edge leading towards the source (None for the source).
    parent_edge: Vec<Option<EdgeId>>,
    /// Per edge: the endpoint nearer the source.
    upstream: Vec<NodeId>,
    /// Nodes in breadth-first order from the source.
    order: Vec<NodeId>,
    annotations: Vec<EdgeAnnotation>,
    capabilities: Vec<Capabilities>,
}

impl Network {
    /// Orient a tree from `source`.
    pub fn new(graph: DuctGraph, source: NodeId, direction: FlowDirection) -> GraphResult<Self> {
        if !is_tree(&graph) {
            return Err(GraphError::NotATree {
                nodes: graph.nodes().len(),
                edges: graph.edges().len(),
            });
        }
        if graph.node(source).is_none() {
            return Err(GraphError::NodeNotFound { node: source });
        }

        let n = graph.nodes().len();
        let mut parent_edge = vec![None; n];
        let mut upstream = vec![source; graph.edges().len()];
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut queue = VecDeque::from([source]);
        visited[source.idx()] = true;

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for (edge, next) in graph.neighbors(node) {
                if visited[next.idx()] {
                    continue;
                }
                visited[next.idx()] = true;
                parent_edge[next.idx()] = Some(edge);
                upstream[edge.idx()] = node;
                queue.push_back(next);
            }
        }

        let annotations = vec![EdgeAnnotation::default(); graph.edges().len()];
        let capabilities = vec![Capabilities::NONE; n];
        Ok(Self {
            graph,
            source,
            direction,
            parent_edge,
            upstream,
            order,
            annotations,
            capabilities,
        })
    }

    pub fn graph(&self) -> &DuctGraph {
        &self.graph
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn direction(&self) -> FlowDirection {
        self.direction
    }

    /// Nodes in breadth-first order from the source (parents before children).
    pub fn bfs_order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn parent_edge(&self, node: NodeId) -> Option<EdgeId> {
        self.parent_edge.get(node.idx()).copied().flatten()
    }

    /// Endpoint of `edge` nearer the source.
    pub fn upstream_node(&self, edge: EdgeId) -> NodeId {
        self.upstream[edge.idx()]
    }

    /// Endpoint of `edge` farther from the source.
    pub fn downstream_node(&self, edge: EdgeId) -> NodeId {
        let e = &self.graph.edges()[edge.idx()];
        if e.a == self.upstream[edge.idx()] { e.b } else { e.a }
    }

    /// `(from, to)` in the direction air actually moves.
    pub fn flow_endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        let up = self.upstream_node(edge);
        let down = self.downstream_node(edge);
        match self.direction {
            FlowDirection::Supply => (up, down),
            FlowDirection::Exhaust => (down, up),
        }
    }

    /// Edges hanging below `node`, in adjacency order.
    pub fn child_edges(&self, node: NodeId) -> Vec<EdgeId> {
        self.graph
            .node_edges(node)
            .iter()
            .copied()
            .filter(|&e| self.upstream[e.idx()] == node)
            .collect()
    }

    /// Edges from `node` up to the source.
    pub fn path_to_source(&self, node: NodeId) -> Vec<EdgeId> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(edge) = self.parent_edge(current) {
            path.push(edge);
            current = self.upstream_node(edge);
        }
        path
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.terminals()
    }

    /// Sum of all terminal demands.
    pub fn total_demand(&self) -> VolumeRate {
        self.terminals()
            .filter_map(|n| n.demand.as_ref())
            .fold(VolumeRate::default(), |acc, d| acc + d.flow)
    }

    pub fn trunk_nodes(&self) -> Vec<NodeId> {
        self.graph
            .nodes()
            .iter()
            .filter(|n| n.role == NodeRole::Trunk)
            .map(|n| n.id)
            .collect()
    }

    pub fn annotation(&self, edge: EdgeId) -> &EdgeAnnotation {
        &self.annotations[edge.idx()]
    }

    pub fn annotation_mut(&mut self, edge: EdgeId) -> &mut EdgeAnnotation {
        &mut self.annotations[edge.idx()]
    }

    pub fn annotations(&self) -> &[EdgeAnnotation] {
        &self.annotations
    }

    pub fn capabilities(&self, node: NodeId) -> Capabilities {
        self.capabilities[node.idx()]
    }

    pub fn set_capabilities(&mut self, node: NodeId, caps: Capabilities) {
        self.capabilities[node.idx()] = caps;
    }
}

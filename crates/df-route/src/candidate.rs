//! Candidate routing graph for one level.
//!
//! Nodes are the terminals, the trunk connector and every crossing of a
//! terminal row with a terminal column. Each node links to its nearest
//! neighbour along shared x and shared y, so every candidate edge is
//! axis-aligned.

use std::collections::BTreeMap;

use df_core::{GridKey, NodeId, Point};
use df_graph::{Demand, DuctGraph, GraphBuilder, NodeRole};
use petgraph::unionfind::UnionFind;
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::error::{RouteError, RouteResult};
use crate::terminal::LevelTerminals;

/// Plan position of the vertical riser; each level gets a trunk node here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trunk {
    pub x: f64,
    pub y: f64,
}

impl Trunk {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn at(&self, elevation: f64) -> Point {
        Point::new(self.x, self.y, elevation).snapped()
    }
}

/// Routing graph of one level, ready for tree synthesis.
#[derive(Debug, Clone)]
pub struct CandidateGraph {
    pub elevation: f64,
    pub graph: DuctGraph,
    pub trunk: NodeId,
    /// Dropped edges put back to reconnect the level.
    pub repairs: usize,
}

impl CandidateGraph {
    /// Terminal and trunk nodes: what every level tree must span.
    pub fn anchors(&self) -> Vec<NodeId> {
        self.graph
            .nodes()
            .iter()
            .filter(|n| matches!(n.role, NodeRole::Terminal | NodeRole::Trunk))
            .map(|n| n.id)
            .collect()
    }
}

struct DraftNode {
    position: Point,
    role: NodeRole,
    demand: Option<Demand>,
    present: bool,
}

struct DraftEdge {
    a: usize,
    b: usize,
    length: f64,
    kept: bool,
}

/// Build the candidate graph of a level and reconnect it if envelope filtering
/// split it apart.
pub fn build_candidate_graph(
    level: &LevelTerminals,
    trunk: Trunk,
    envelope: &dyn Envelope,
    max_repair_iterations: usize,
) -> RouteResult<CandidateGraph> {
    let elevation = level.elevation;
    let trunk_position = trunk.at(elevation);

    let mut points: BTreeMap<GridKey, DraftNode> = BTreeMap::new();
    for t in &level.terminals {
        if t.position.key() == trunk_position.key() {
            return Err(RouteError::InvalidTerminal {
                room: t.room.clone(),
                reason: format!("coincides with the trunk connector at {trunk_position}"),
            });
        }
        if !envelope.is_point_inside_level(elevation, &t.position) {
            return Err(RouteError::EnvelopeViolation {
                room: t.room.clone(),
                position: t.position,
                elevation,
            });
        }
        points.insert(
            t.position.key(),
            DraftNode {
                position: t.position,
                role: NodeRole::Terminal,
                demand: Some(t.demand()),
                present: true,
            },
        );
    }
    if !envelope.is_point_inside_level(elevation, &trunk_position) {
        return Err(RouteError::EnvelopeViolation {
            room: "trunk".into(),
            position: trunk_position,
            elevation,
        });
    }
    points.insert(
        trunk_position.key(),
        DraftNode {
            position: trunk_position,
            role: NodeRole::Trunk,
            demand: None,
            present: true,
        },
    );

    let anchors: Vec<Point> = points.values().map(|n| n.position).collect();
    for (i, p) in anchors.iter().enumerate() {
        for q in &anchors[i + 1..] {
            for crossing in [Point::new(p.x, q.y, elevation), Point::new(q.x, p.y, elevation)] {
                let crossing = crossing.snapped();
                points.entry(crossing.key()).or_insert_with(|| DraftNode {
                    position: crossing,
                    role: NodeRole::Intersection,
                    demand: None,
                    present: true,
                });
            }
        }
    }

    let mut nodes: Vec<DraftNode> = points.into_values().collect();
    let mut dropped_nodes = 0usize;
    for node in nodes.iter_mut().filter(|n| n.role == NodeRole::Intersection) {
        if !envelope.is_point_inside_level(elevation, &node.position) {
            debug!(elevation, position = %node.position, "dropping intersection outside envelope");
            node.present = false;
            dropped_nodes += 1;
        }
    }

    let mut edges = neighbour_edges(&nodes);
    let mut dropped_edges = 0usize;
    for edge in edges.iter_mut() {
        let (a, b) = (&nodes[edge.a], &nodes[edge.b]);
        edge.kept = a.present
            && b.present
            && envelope.is_edge_inside_level(elevation, &a.position, &b.position);
        if !edge.kept {
            dropped_edges += 1;
            if a.present && b.present {
                debug!(elevation, a = %a.position, b = %b.position, "dropping edge outside envelope");
            }
        }
    }

    let repairs = repair_connectivity(elevation, &mut nodes, &mut edges, max_repair_iterations)?;

    let mut builder = GraphBuilder::new();
    let mut ids: Vec<Option<NodeId>> = Vec::with_capacity(nodes.len());
    for node in &nodes {
        ids.push(node.present.then(|| match &node.demand {
            Some(demand) => builder.add_terminal(node.position, demand.clone()),
            None => builder.add_node(node.position, node.role),
        }));
    }
    for edge in edges.iter().filter(|e| e.kept) {
        if let (Some(a), Some(b)) = (ids[edge.a], ids[edge.b]) {
            builder.add_edge(a, b)?;
        }
    }
    let graph = builder.build()?;
    let trunk_id = graph
        .find(&trunk_position)
        .ok_or(df_graph::GraphError::PositionNotFound {
            key: trunk_position.key(),
        })?;

    debug!(
        elevation,
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        dropped_nodes,
        dropped_edges,
        repairs,
        "candidate graph built"
    );

    Ok(CandidateGraph {
        elevation,
        graph,
        trunk: trunk_id,
        repairs,
    })
}

/// Nearest-neighbour links along every shared row (y) and column (x).
fn neighbour_edges(nodes: &[DraftNode]) -> Vec<DraftEdge> {
    let mut rows: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    let mut cols: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        let key = node.position.key();
        rows.entry(key.y).or_default().push(i);
        cols.entry(key.x).or_default().push(i);
    }

    let mut edges = Vec::new();
    for mut row in rows.into_values() {
        row.sort_by_key(|&i| nodes[i].position.key().x);
        edges.extend(row.windows(2).map(|w| draft_edge(nodes, w[0], w[1])));
    }
    for mut col in cols.into_values() {
        col.sort_by_key(|&i| nodes[i].position.key().y);
        edges.extend(col.windows(2).map(|w| draft_edge(nodes, w[0], w[1])));
    }
    edges
}

fn draft_edge(nodes: &[DraftNode], a: usize, b: usize) -> DraftEdge {
    DraftEdge {
        a,
        b,
        length: nodes[a].position.distance(&nodes[b].position),
        kept: true,
    }
}

/// Reinstate the shortest dropped edges joining separate components until
/// every anchor shares the trunk's component.
fn repair_connectivity(
    elevation: f64,
    nodes: &mut [DraftNode],
    edges: &mut [DraftEdge],
    max_iterations: usize,
) -> RouteResult<usize> {
    let trunk = nodes
        .iter()
        .position(|n| n.role == NodeRole::Trunk)
        .unwrap_or_default();

    // Edges whose endpoints are both in the envelope go first
    let mut order: Vec<usize> = (0..edges.len()).filter(|&i| !edges[i].kept).collect();
    order.sort_by(|&i, &j| {
        let absent = |e: &DraftEdge| usize::from(!nodes[e.a].present) + usize::from(!nodes[e.b].present);
        let (ei, ej) = (&edges[i], &edges[j]);
        absent(ei)
            .cmp(&absent(ej))
            .then(ei.length.total_cmp(&ej.length))
            .then(ei.a.cmp(&ej.a))
            .then(ei.b.cmp(&ej.b))
    });

    let mut iterations = 0;
    loop {
        let mut uf = UnionFind::<usize>::new(nodes.len());
        for edge in edges.iter().filter(|e| e.kept) {
            uf.union(edge.a, edge.b);
        }
        let root = uf.find(trunk);
        let stranded: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(i, n)| n.role != NodeRole::Intersection && uf.find(*i) != root)
            .map(|(i, _)| i)
            .collect();
        if stranded.is_empty() {
            return Ok(iterations);
        }

        let candidate = (iterations < max_iterations)
            .then(|| {
                order
                    .iter()
                    .copied()
                    .find(|&i| !edges[i].kept && uf.find(edges[i].a) != uf.find(edges[i].b))
            })
            .flatten();
        let Some(index) = candidate else {
            return Err(RouteError::Topology {
                elevation,
                unreachable: stranded.len(),
                first: nodes[stranded[0]].position,
                iterations,
            });
        };

        let edge = &mut edges[index];
        edge.kept = true;
        nodes[edge.a].present = true;
        nodes[edge.b].present = true;
        iterations += 1;
        warn!(
            elevation,
            a = %nodes[edge.a].position,
            b = %nodes[edge.b].position,
            length = edge.length,
            "reinstating dropped edge to reconnect level"
        );
    }
}

//! Approximate Steiner tree over a candidate graph (metric-closure heuristic).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use df_core::NodeId;
use df_graph::{DuctGraph, GraphBuilder};
use petgraph::algo::dijkstra;
use petgraph::graph::{EdgeReference, NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::candidate::CandidateGraph;
use crate::error::{RouteError, RouteResult};

/// Spanning tree of `required`, built from shortest candidate paths.
///
/// 1. metric closure over the required nodes,
/// 2. minimum spanning tree of the closure,
/// 3. every closure edge expanded to its shortest candidate path; among
///    equally short paths the one laying the least new duct wins,
/// 4. minimum spanning tree of that union,
/// 5. non-required leaves pruned until none remain.
///
/// The trunk comes first among the required nodes and the rest follow node
/// id, which is coordinate order; equal weights go to the lower position.
/// Node ids of the returned graph are fresh; map back through positions.
pub fn steiner_tree(candidate: &CandidateGraph, required: &BTreeSet<NodeId>) -> RouteResult<DuctGraph> {
    let graph = &candidate.graph;
    let pg = graph.to_petgraph();
    let mut required: Vec<NodeId> = required.iter().copied().collect();
    if let Some(pos) = required.iter().position(|&id| id == candidate.trunk) {
        required[..=pos].rotate_right(1);
    }

    let mut closure: Vec<(f64, usize, usize)> = Vec::new();
    for (i, &from) in required.iter().enumerate() {
        let distances = dijkstra(&pg, NodeIndex::new(from.idx()), None, |e| *e.weight());
        for (j, &to) in required.iter().enumerate().skip(i + 1) {
            let Some(&d) = distances.get(&NodeIndex::new(to.idx())) else {
                return Err(unreachable(candidate, to));
            };
            closure.push((d, i, j));
        }
    }

    let mut union: BTreeSet<(NodeId, NodeId)> = BTreeSet::new();
    for (_, i, j) in kruskal(required.len(), closure) {
        let path = expand_path(&pg, &union, required[i], required[j])
            .ok_or_else(|| unreachable(candidate, required[j]))?;
        for w in path.windows(2) {
            union.insert(ordered(w[0], w[1]));
        }
    }

    // Second spanning tree over the expanded paths
    let mut index: BTreeMap<NodeId, usize> = BTreeMap::new();
    for &(a, b) in &union {
        let next = index.len();
        index.entry(a).or_insert(next);
        let next = index.len();
        index.entry(b).or_insert(next);
    }
    let nodes_by_index: Vec<NodeId> = {
        let mut v = vec![NodeId::from_index(0); index.len()];
        for (&id, &i) in &index {
            v[i] = id;
        }
        v
    };
    let weighted: Vec<(f64, usize, usize)> = union
        .iter()
        .filter_map(|&(a, b)| {
            let e = graph.edge_between(a, b)?;
            Some((graph.edges()[e.idx()].length.value, index[&a], index[&b]))
        })
        .collect();

    let mut adjacency: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    for &id in &required {
        adjacency.entry(id).or_default();
    }
    for (_, i, j) in kruskal(index.len(), weighted) {
        let (a, b) = (nodes_by_index[i], nodes_by_index[j]);
        adjacency.entry(a).or_default().insert(b);
        adjacency.entry(b).or_default().insert(a);
    }

    let required_set: BTreeSet<NodeId> = required.iter().copied().collect();
    prune_leaves(&mut adjacency, &required_set);

    let mut builder = GraphBuilder::new();
    let mut ids: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    for &id in adjacency.keys() {
        if let Some(node) = graph.node(id) {
            ids.insert(id, builder.add_node_like(node));
        }
    }
    for (&a, neighbours) in &adjacency {
        for &b in neighbours.iter().filter(|&&b| a < b) {
            builder.add_edge(ids[&a], ids[&b])?;
        }
    }
    Ok(builder.build()?)
}

/// Shortest candidate path `from → to`.
///
/// Among equally short paths the one with the least length outside `laid`
/// wins, so later paths share runs already laid; remaining ties take the
/// neighbour with the lowest id at each step.
fn expand_path(
    pg: &UnGraph<NodeId, f64>,
    laid: &BTreeSet<(NodeId, NodeId)>,
    from: NodeId,
    to: NodeId,
) -> Option<Vec<NodeId>> {
    let goal = NodeIndex::new(to.idx());
    let start = NodeIndex::new(from.idx());
    let dist: HashMap<NodeIndex, f64> = dijkstra(pg, goal, None, |e| *e.weight()).into_iter().collect();
    dist.get(&start)?;

    let fresh = |e: EdgeReference<'_, f64>| {
        if laid.contains(&ordered(pg[e.source()], pg[e.target()])) {
            0.0
        } else {
            *e.weight()
        }
    };
    // New duct still to lay from each node, in order of rising distance
    let mut order: Vec<(NodeIndex, f64)> = dist.iter().map(|(&n, &d)| (n, d)).collect();
    order.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    let mut new_length = vec![f64::INFINITY; pg.node_count()];
    new_length[goal.index()] = 0.0;
    for &(n, _) in &order {
        if n == goal {
            continue;
        }
        let best = downhill(pg, &dist, n)
            .map(|(e, m)| new_length[m.index()] + fresh(e))
            .fold(f64::INFINITY, f64::min);
        new_length[n.index()] = best;
    }

    let mut current = start;
    let mut path = vec![from];
    while current != goal {
        let remaining = new_length[current.index()];
        let tol = 1e-9 * remaining.max(1.0);
        let next = downhill(pg, &dist, current)
            .filter(|&(e, m)| (new_length[m.index()] + fresh(e) - remaining).abs() <= tol)
            .map(|(_, m)| (pg[m], m))
            .min_by_key(|&(id, _)| id)?;
        path.push(next.0);
        current = next.1;
    }
    Some(path)
}

/// Edges from `n` that lie on some shortest path to the node `dist` is
/// measured from.
fn downhill<'a>(
    pg: &'a UnGraph<NodeId, f64>,
    dist: &'a HashMap<NodeIndex, f64>,
    n: NodeIndex,
) -> impl Iterator<Item = (EdgeReference<'a, f64>, NodeIndex)> + 'a {
    let here = dist.get(&n).copied().unwrap_or(f64::INFINITY);
    let tol = 1e-9 * here.max(1.0);
    pg.edges(n).filter_map(move |e| {
        let m = if e.source() == n { e.target() } else { e.source() };
        let d = *dist.get(&m)?;
        ((d + *e.weight() - here).abs() <= tol && d < here).then_some((e, m))
    })
}

fn ordered(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Kruskal over `(weight, u, v)` edges; ties go to the lower endpoints.
fn kruskal(n: usize, mut edges: Vec<(f64, usize, usize)>) -> Vec<(f64, usize, usize)> {
    edges.sort_by(|x, y| {
        x.0.total_cmp(&y.0)
            .then(x.1.cmp(&y.1))
            .then(x.2.cmp(&y.2))
    });
    let mut uf = UnionFind::<usize>::new(n);
    edges.into_iter().filter(|&(_, u, v)| uf.union(u, v)).collect()
}

/// Drop leaves outside `keep` until every leaf is kept.
fn prune_leaves(adjacency: &mut BTreeMap<NodeId, BTreeSet<NodeId>>, keep: &BTreeSet<NodeId>) {
    let mut stack: Vec<NodeId> = adjacency
        .iter()
        .filter(|(id, n)| n.len() <= 1 && !keep.contains(*id))
        .map(|(&id, _)| id)
        .collect();
    while let Some(leaf) = stack.pop() {
        let Some(neighbours) = adjacency.remove(&leaf) else {
            continue;
        };
        for other in neighbours {
            if let Some(set) = adjacency.get_mut(&other) {
                set.remove(&leaf);
                if set.len() <= 1 && !keep.contains(&other) {
                    stack.push(other);
                }
            }
        }
    }
}

fn unreachable(candidate: &CandidateGraph, node: NodeId) -> RouteError {
    RouteError::Topology {
        elevation: candidate.elevation,
        unreachable: 1,
        first: candidate.graph.position(node).unwrap_or_default(),
        iterations: candidate.repairs,
    }
}

//! Level tree synthesis: base Steiner tree plus the three clean-up passes.

use std::collections::{BTreeSet, HashSet, VecDeque};

use df_core::{NodeId, Point, axis_straight};
use df_graph::{DuctGraph, GraphError, LevelTree};
use tracing::debug;

use crate::candidate::CandidateGraph;
use crate::error::RouteResult;
use crate::steiner::steiner_tree;

/// Synthesise the tree of one level from its candidate graph.
pub fn synthesize_level(candidate: &CandidateGraph) -> RouteResult<LevelTree> {
    let elevation = candidate.elevation;
    let mut required: BTreeSet<NodeId> = candidate.anchors().into_iter().collect();
    let mut tree = steiner_tree(candidate, &required)?;
    debug!(elevation, nodes = tree.nodes().len(), "base tree");

    let added = straighten_paths(candidate, &tree, &mut required);
    if added > 0 {
        tree = steiner_tree(candidate, &required)?;
    }
    debug!(elevation, added, nodes = tree.nodes().len(), "de-diagonalised");

    let added = eliminate_kinks(candidate, &tree, &mut required);
    if added > 0 {
        tree = steiner_tree(candidate, &required)?;
    }
    debug!(elevation, added, nodes = tree.nodes().len(), "kinks eliminated");

    let mut rounds = 0;
    loop {
        let artifacts: Vec<NodeId> = tree
            .leaves()
            .into_iter()
            .filter(|&leaf| tree.role(leaf).is_some_and(|r| !r.is_anchor()))
            .filter_map(|leaf| tree.position(leaf).and_then(|p| candidate.graph.find(&p)))
            .filter(|id| required.contains(id))
            .collect();
        if artifacts.is_empty() {
            break;
        }
        for id in &artifacts {
            required.remove(id);
        }
        tree = steiner_tree(candidate, &required)?;
        rounds += 1;
    }
    debug!(elevation, rounds, nodes = tree.nodes().len(), "artifact leaves pruned");

    let trunk_position = candidate
        .graph
        .position(candidate.trunk)
        .ok_or(GraphError::NodeNotFound {
            node: candidate.trunk,
        })?;
    let trunk = tree.find(&trunk_position).ok_or(GraphError::PositionNotFound {
        key: trunk_position.key(),
    })?;
    Ok(LevelTree::new(elevation, trunk, tree)?)
}

/// Make the interior of every axis-straight path between two required nodes
/// required as well. Returns how many nodes were added.
fn straighten_paths(
    candidate: &CandidateGraph,
    tree: &DuctGraph,
    required: &mut BTreeSet<NodeId>,
) -> usize {
    let required_in_tree: Vec<NodeId> = tree
        .nodes()
        .iter()
        .filter(|n| candidate.graph.find(&n.position).is_some_and(|c| required.contains(&c)))
        .map(|n| n.id)
        .collect();
    let is_required: HashSet<NodeId> = required_in_tree.iter().copied().collect();

    let mut additions = BTreeSet::new();
    for &start in &required_in_tree {
        // BFS parents from `start`; paths to other required nodes follow them back
        let mut parent: Vec<Option<NodeId>> = vec![None; tree.nodes().len()];
        let mut seen = vec![false; tree.nodes().len()];
        seen[start.idx()] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for (_, next) in tree.neighbors(node) {
                if !seen[next.idx()] {
                    seen[next.idx()] = true;
                    parent[next.idx()] = Some(node);
                    queue.push_back(next);
                }
            }
        }

        for &end in required_in_tree.iter().filter(|&&e| e > start) {
            let mut path = vec![end];
            let mut current = end;
            while let Some(p) = parent[current.idx()] {
                path.push(p);
                current = p;
            }
            if path.len() < 3 {
                continue;
            }
            let points: Vec<Point> = path.iter().filter_map(|&n| tree.position(n)).collect();
            if !axis_straight(&points) {
                continue;
            }
            for &inner in &path[1..path.len() - 1] {
                if is_required.contains(&inner) {
                    continue;
                }
                if let Some(id) = tree.position(inner).and_then(|p| candidate.graph.find(&p)) {
                    additions.insert(id);
                }
            }
        }
    }

    let before = required.len();
    required.extend(additions);
    required.len() - before
}

/// For every degree-2 pass-through node whose walk to a stop node bends, require
/// the L-corner between the two. Returns how many nodes were added.
fn eliminate_kinks(
    candidate: &CandidateGraph,
    tree: &DuctGraph,
    required: &mut BTreeSet<NodeId>,
) -> usize {
    let is_required = |id: NodeId| {
        tree.position(id)
            .and_then(|p| candidate.graph.find(&p))
            .is_some_and(|c| required.contains(&c))
    };
    let is_stop = |id: NodeId| tree.degree(id) != 2 || is_required(id);

    let mut visited = vec![false; tree.nodes().len()];
    let mut additions: BTreeSet<NodeId> = BTreeSet::new();

    for node in tree.nodes() {
        if visited[node.id.idx()] || is_stop(node.id) {
            continue;
        }
        visited[node.id.idx()] = true;
        let start = node.position;

        // Walk each side to its nearest stop node
        let sides: Vec<NodeId> = tree.neighbors(node.id).map(|(_, n)| n).collect();
        for first in sides {
            let mut walked = vec![start];
            let mut prev = node.id;
            let mut current = first;
            loop {
                walked.extend(tree.position(current));
                if is_stop(current) || visited[current.idx()] {
                    break;
                }
                visited[current.idx()] = true;
                let Some((_, next)) = tree.neighbors(current).find(|&(_, n)| n != prev) else {
                    break;
                };
                prev = current;
                current = next;
            }
            if axis_straight(&walked) {
                continue;
            }
            if let Some(stop) = walked.last() {
                additions.extend(corner_nodes(candidate, &start, stop, required));
            }
        }
    }

    let before = required.len();
    required.extend(additions);
    required.len() - before
}

/// Candidate nodes that straighten the route between two stop nodes.
///
/// Aligned stops get every candidate node on their segment; otherwise the first
/// L-corner in coordinate order that exists in the candidate graph.
fn corner_nodes(
    candidate: &CandidateGraph,
    a: &Point,
    b: &Point,
    required: &BTreeSet<NodeId>,
) -> Vec<NodeId> {
    let (ka, kb) = (a.key(), b.key());
    if ka.x == kb.x || ka.y == kb.y {
        let (lo, hi) = if ka < kb { (ka, kb) } else { (kb, ka) };
        return candidate
            .graph
            .nodes()
            .iter()
            .filter(|n| {
                let k = n.key();
                k > lo && k < hi && ((ka.x == kb.x && k.x == ka.x) || (ka.y == kb.y && k.y == ka.y))
            })
            .map(|n| n.id)
            .filter(|id| !required.contains(id))
            .collect();
    }

    let mut corners = [Point::new(a.x, b.y, a.z), Point::new(b.x, a.y, a.z)];
    corners.sort_by_key(|p| p.key());
    corners
        .iter()
        .filter_map(|p| candidate.graph.find(p))
        .find(|id| !required.contains(id))
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Trunk, build_candidate_graph};
    use crate::envelope::Unbounded;
    use crate::terminal::{LevelTerminals, Terminal};
    use df_core::units::m3ph;
    use df_graph::{GraphBuilder, is_tree};

    fn level(points: &[(f64, f64)]) -> LevelTerminals {
        LevelTerminals {
            elevation: 3.0,
            terminals: points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| Terminal {
                    room: format!("R{i}"),
                    position: Point::new(x, y, 3.0),
                    flow: m3ph(100.0),
                    usage: "office".into(),
                })
                .collect(),
        }
    }

    fn synthesize(points: &[(f64, f64)], trunk: (f64, f64)) -> LevelTree {
        let cg = build_candidate_graph(&level(points), Trunk::new(trunk.0, trunk.1), &Unbounded, 200)
            .unwrap();
        synthesize_level(&cg).unwrap()
    }

    fn at(cg: &CandidateGraph, x: f64, y: f64) -> NodeId {
        cg.graph.find(&Point::new(x, y, 3.0)).unwrap()
    }

    /// Tree over candidate nodes, given as plan-position segments.
    fn hand_tree(cg: &CandidateGraph, segments: &[((f64, f64), (f64, f64))]) -> DuctGraph {
        let mut builder = GraphBuilder::new();
        for &((ax, ay), (bx, by)) in segments {
            let a = builder.add_node_like(cg.graph.node(at(cg, ax, ay)).unwrap());
            let b = builder.add_node_like(cg.graph.node(at(cg, bx, by)).unwrap());
            builder.add_edge(a, b).unwrap();
        }
        builder.build().unwrap()
    }

    fn assert_level_tree(tree: &LevelTree, terminals: usize) {
        assert!(is_tree(&tree.graph));
        assert_eq!(tree.terminal_count(), terminals);
        assert_eq!(tree.graph.edges().len(), tree.graph.nodes().len() - 1);
        for leaf in tree.leaves() {
            assert!(tree.graph.role(leaf).unwrap().is_anchor(), "artifact leaf {leaf}");
        }
        assert!(tree.graph.edges().iter().all(|e| e.axis.is_some()));
    }

    #[test]
    fn four_corners() {
        let tree = synthesize(&[(0.0, 0.0), (0.0, 10.0), (10.0, 0.0), (10.0, 10.0)], (5.0, 5.0));
        assert_level_tree(&tree, 4);
        let leaves: Vec<_> = tree.leaves();
        assert_eq!(leaves.len(), 4);
        assert!(leaves.iter().all(|&l| tree.graph.node(l).unwrap().is_terminal()));
        assert_eq!(tree.graph.position(tree.trunk).unwrap(), Point::new(5.0, 5.0, 3.0));
    }

    #[test]
    fn scattered_offices() {
        let tree = synthesize(
            &[(1.0, 2.0), (4.0, 7.5), (9.0, 2.0), (12.5, 6.0), (6.0, 11.0), (2.0, 9.0)],
            (6.0, 4.0),
        );
        assert_level_tree(&tree, 6);
    }

    #[test]
    fn trunk_as_only_branch_point() {
        let tree = synthesize(&[(0.0, 0.0), (8.0, 0.0)], (4.0, 0.0));
        assert_level_tree(&tree, 2);
        assert_eq!(tree.graph.degree(tree.trunk), 2);
        assert!((tree.total_length().value - 8.0).abs() < 1e-9);
    }

    #[test]
    fn corner_prefers_lowest_coordinate() {
        let cg = build_candidate_graph(
            &level(&[(0.0, 0.0), (6.0, 6.0)]),
            Trunk::new(0.0, 6.0),
            &Unbounded,
            200,
        )
        .unwrap();
        let required = BTreeSet::new();
        let corners = corner_nodes(&cg, &Point::new(0.0, 0.0, 3.0), &Point::new(6.0, 6.0, 3.0), &required);
        assert_eq!(corners.len(), 1);
        assert_eq!(cg.graph.position(corners[0]).unwrap(), Point::new(0.0, 6.0, 3.0));
    }

    #[test]
    fn straight_run_between_terminals_becomes_required() {
        let cg = build_candidate_graph(
            &level(&[(0.0, 0.0), (10.0, 0.0), (5.0, 5.0)]),
            Trunk::new(0.0, 5.0),
            &Unbounded,
            200,
        )
        .unwrap();
        // Trunk down to the first terminal, along the row to the second, with a
        // branch up from the midpoint to the third
        let tree = hand_tree(
            &cg,
            &[
                ((0.0, 5.0), (0.0, 0.0)),
                ((0.0, 0.0), (5.0, 0.0)),
                ((5.0, 0.0), (10.0, 0.0)),
                ((5.0, 0.0), (5.0, 5.0)),
            ],
        );
        let mut required: BTreeSet<NodeId> = cg.anchors().into_iter().collect();

        assert_eq!(straighten_paths(&cg, &tree, &mut required), 1);
        assert!(required.contains(&at(&cg, 5.0, 0.0)));

        let rebuilt = steiner_tree(&cg, &required).unwrap();
        assert!(is_tree(&rebuilt));
        assert!(rebuilt.find(&Point::new(5.0, 0.0, 3.0)).is_some());
    }

    #[test]
    fn zig_zag_is_replaced_by_l_corner() {
        let cg = build_candidate_graph(
            &level(&[(0.0, 0.0), (10.0, 6.0), (20.0, 3.0)]),
            Trunk::new(20.0, 0.0),
            &Unbounded,
            200,
        )
        .unwrap();
        // Up, across at y=3, up again: the walk from (0,3) to the terminal at
        // (10,6) bends at (10,3)
        let zig_zag = hand_tree(
            &cg,
            &[
                ((0.0, 0.0), (0.0, 3.0)),
                ((0.0, 3.0), (10.0, 3.0)),
                ((10.0, 3.0), (10.0, 6.0)),
                ((10.0, 6.0), (20.0, 6.0)),
                ((20.0, 6.0), (20.0, 3.0)),
                ((20.0, 3.0), (20.0, 0.0)),
            ],
        );
        let mut required: BTreeSet<NodeId> = cg.anchors().into_iter().collect();

        assert_eq!(eliminate_kinks(&cg, &zig_zag, &mut required), 1);
        assert!(required.contains(&at(&cg, 0.0, 6.0)));

        let rebuilt = steiner_tree(&cg, &required).unwrap();
        assert!(is_tree(&rebuilt));
        let corner = rebuilt.find(&Point::new(0.0, 6.0, 3.0)).unwrap();
        assert_eq!(rebuilt.degree(corner), 2);
        // The run across y=3 between the first column and the terminal is gone
        let low = rebuilt.find(&Point::new(0.0, 3.0, 3.0)).unwrap();
        if let Some(mid) = rebuilt.find(&Point::new(10.0, 3.0, 3.0)) {
            assert!(rebuilt.edge_between(low, mid).is_none());
        }
        assert!(rebuilt.total_length().value <= zig_zag.total_length().value + 1e-9);
    }
}

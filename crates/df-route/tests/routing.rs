//! End-to-end routing tests: raw terminals to a composed network.

use df_core::Point;
use df_core::units::{in_m3ph, m3ph};
use df_graph::{FlowDirection, NodeRole, is_tree};
use df_route::{
    RawTerminal, Rect, RectEnvelope, RouteConfig, RouteError, RouteRequest, Trunk, Unbounded,
    build_candidate_graph, derive_terminals, route_levels, route_network, split_levels,
    synthesize_level,
};
use proptest::prelude::*;

fn raw(room: &str, x: f64, y: f64, z: f64, flow: f64) -> RawTerminal {
    RawTerminal {
        room: room.into(),
        position: Point::new(x, y, z),
        flow: m3ph(flow),
        usage: "office".into(),
    }
}

fn four_corners() -> Vec<RawTerminal> {
    vec![
        raw("1.01", 0.0, 0.0, 0.0, 100.0),
        raw("1.02", 0.0, 10.0, 0.0, 100.0),
        raw("1.03", 10.0, 0.0, 0.0, 100.0),
        raw("1.04", 10.0, 10.0, 0.0, 100.0),
    ]
}

#[test]
fn four_corner_level_has_terminal_leaves() {
    let config = RouteConfig::default();
    let terminals = derive_terminals(&four_corners(), &config.deriver).unwrap();
    let levels = split_levels(&terminals);
    let trees = route_levels(&levels, Trunk::new(5.0, 5.0), &Unbounded, &config).unwrap();
    assert_eq!(trees.len(), 1);

    let tree = &trees[0];
    let leaves = tree.leaves();
    assert_eq!(leaves.len(), 4);
    for leaf in leaves {
        assert_eq!(tree.graph.role(leaf), Some(NodeRole::Terminal));
    }
    assert_eq!(tree.graph.edges().len(), tree.graph.nodes().len() - 1);
}

#[test]
fn four_corner_network_carries_total_demand() {
    let terminals = four_corners();
    let request = RouteRequest {
        terminals: &terminals,
        trunk: Trunk::new(5.0, 5.0),
        source: Point::new(5.0, 5.0, -3.0),
        direction: FlowDirection::Supply,
    };
    let net = route_network(&request, &Unbounded, &RouteConfig::default()).unwrap();
    assert!(is_tree(net.graph()));
    assert!((in_m3ph(net.total_demand()) - 400.0).abs() < 1e-9);
    assert_eq!(net.graph().degree(net.source()), 1);
}

#[test]
fn rooms_merged_onto_one_cell_never_lose_demand() {
    let terminals = vec![
        raw("A", 0.0, 0.0, 0.0, 100.0),
        raw("B", 0.2, 0.1, 0.0, 100.0),
        raw("C", 5.0, 5.0, 0.0, 100.0),
    ];
    let request = RouteRequest {
        terminals: &terminals,
        trunk: Trunk::new(2.0, 2.0),
        source: Point::new(2.0, 2.0, -3.0),
        direction: FlowDirection::Supply,
    };
    let err = route_network(&request, &Unbounded, &RouteConfig::default()).unwrap_err();
    assert!(matches!(err, RouteError::InvalidTerminal { ref room, .. } if room == "B"));

    // Apart, every room keeps its own outlet and its demand reaches the source
    let mut apart = terminals.clone();
    apart[1].position = Point::new(3.0, 0.0, 0.0);
    let request = RouteRequest {
        terminals: &apart,
        trunk: Trunk::new(2.0, 2.0),
        source: Point::new(2.0, 2.0, -3.0),
        direction: FlowDirection::Supply,
    };
    let net = route_network(&request, &Unbounded, &RouteConfig::default()).unwrap();
    assert!((in_m3ph(net.total_demand()) - 300.0).abs() < 1e-9);
}

#[test]
fn multi_level_building_shares_one_riser() {
    let terminals = vec![
        raw("0.01", 0.0, 0.0, 0.0, 80.0),
        raw("0.02", 6.0, 4.0, 0.0, 60.0),
        raw("1.01", 0.0, 0.0, 3.2, 80.0),
        raw("1.02", 7.0, 2.0, 3.2, 60.0),
        raw("2.01", 3.0, 6.0, 6.4, 120.0),
    ];
    let request = RouteRequest {
        terminals: &terminals,
        trunk: Trunk::new(3.0, 3.0),
        source: Point::new(3.0, 3.0, -2.0),
        direction: FlowDirection::Exhaust,
    };
    let net = route_network(&request, &Unbounded, &RouteConfig::default()).unwrap();
    assert!(is_tree(net.graph()));
    assert_eq!(net.trunk_nodes().len(), 3);
    assert_eq!(net.terminals().count(), 5);
    for node in net.graph().nodes() {
        if net.graph().degree(node.id) == 1 {
            assert!(node.role == NodeRole::Terminal || node.role == NodeRole::Source);
        }
    }
}

/// Two rooms in separate wings, joined only through a corridor the
/// nearest-neighbour edges do not follow.
fn split_wings() -> (RectEnvelope, Vec<RawTerminal>) {
    let env = RectEnvelope::new()
        .with_rect(0.0, Rect::new(0.0, 0.0, 2.0, 2.0))
        .with_rect(0.0, Rect::new(8.0, 0.0, 10.0, 2.0));
    let terminals = vec![raw("W", 1.0, 1.0, 0.0, 50.0), raw("E", 9.0, 1.0, 0.0, 50.0)];
    (env, terminals)
}

#[test]
fn envelope_gap_is_repaired() {
    let (env, raw_terminals) = split_wings();
    let config = RouteConfig::default();
    let terminals = derive_terminals(&raw_terminals, &config.deriver).unwrap();
    let levels = split_levels(&terminals);
    let cg = build_candidate_graph(&levels[0], Trunk::new(1.0, 0.5), &env, config.max_repair_iterations)
        .unwrap();
    assert_eq!(cg.repairs, 1);
    let tree = synthesize_level(&cg).unwrap();
    assert_eq!(tree.terminal_count(), 2);
}

#[test]
fn envelope_gap_without_repairs_is_topology_error() {
    let (env, raw_terminals) = split_wings();
    let config = RouteConfig {
        max_repair_iterations: 0,
        ..RouteConfig::default()
    };
    let terminals = derive_terminals(&raw_terminals, &config.deriver).unwrap();
    let levels = split_levels(&terminals);
    let err = route_levels(&levels, Trunk::new(1.0, 0.5), &env, &config).unwrap_err();
    match err {
        RouteError::Topology {
            unreachable,
            first,
            iterations,
            ..
        } => {
            assert_eq!(unreachable, 1);
            assert_eq!(first, Point::new(9.0, 1.0, 0.0));
            assert_eq!(iterations, 0);
        }
        other => panic!("expected topology error, got {other}"),
    }
}

#[test]
fn source_on_trunk_is_rejected() {
    let terminals = four_corners();
    let request = RouteRequest {
        terminals: &terminals,
        trunk: Trunk::new(5.0, 5.0),
        source: Point::new(5.0, 5.0, 0.0),
        direction: FlowDirection::Supply,
    };
    let err = route_network(&request, &Unbounded, &RouteConfig::default()).unwrap_err();
    assert!(matches!(err, RouteError::DuplicateConnection { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn routed_levels_are_spanning_trees(
        cells in prop::collection::btree_set((0_u8..12, 0_u8..12), 1..8)
    ) {
        let terminals: Vec<RawTerminal> = cells
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| raw(&format!("R{i}"), f64::from(x), f64::from(y), 0.0, 100.0))
            .collect();
        let config = RouteConfig::default();
        let derived = derive_terminals(&terminals, &config.deriver).unwrap();
        let levels = split_levels(&derived);
        let trees = route_levels(&levels, Trunk::new(-1.0, -1.0), &Unbounded, &config).unwrap();

        let tree = &trees[0];
        prop_assert!(is_tree(&tree.graph));
        prop_assert_eq!(tree.terminal_count(), derived.len());
        prop_assert_eq!(tree.graph.edges().len(), tree.graph.nodes().len() - 1);
        for leaf in tree.leaves() {
            prop_assert!(tree.graph.role(leaf).is_some_and(|r| r.is_anchor()));
        }
    }
}

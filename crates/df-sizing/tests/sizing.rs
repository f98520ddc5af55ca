//! Sizing over routed networks.

use df_core::Point;
use df_core::units::{in_m3ph, m2, m3ph, mm};
use df_graph::{FlowDirection, Network};
use df_route::{RawTerminal, RouteConfig, RouteRequest, Trunk, Unbounded, route_network};
use df_sizing::{
    DuctCatalog, DuctShape, SizingConfig, SizingError, required_area, select_section, size_network,
};
use proptest::prelude::*;

fn raw(room: &str, x: f64, y: f64, flow: f64) -> RawTerminal {
    RawTerminal {
        room: room.into(),
        position: Point::new(x, y, 0.0),
        flow: m3ph(flow),
        usage: "office".into(),
    }
}

fn four_corner_network(direction: FlowDirection) -> Network {
    let terminals = vec![
        raw("1", 0.0, 0.0, 100.0),
        raw("2", 0.0, 10.0, 100.0),
        raw("3", 10.0, 0.0, 100.0),
        raw("4", 10.0, 10.0, 100.0),
    ];
    let request = RouteRequest {
        terminals: &terminals,
        trunk: Trunk::new(5.0, 5.0),
        source: Point::new(5.0, 5.0, -3.0),
        direction,
    };
    route_network(&request, &Unbounded, &RouteConfig::default()).unwrap()
}

#[test]
fn root_edge_carries_total_demand() {
    let mut net = four_corner_network(FlowDirection::Supply);
    let summary = size_network(&mut net, &DuctCatalog::default(), &SizingConfig::default()).unwrap();
    assert!((in_m3ph(summary.total_flow) - 400.0).abs() < 1e-9);

    let root = net.graph().node_edges(net.source())[0];
    assert!((in_m3ph(net.annotation(root).flow) - 400.0).abs() < 1e-9);
    assert!(net.annotations().iter().all(|a| a.section.is_some()));
}

#[test]
fn flow_is_conserved_at_every_internal_node() {
    for direction in [FlowDirection::Supply, FlowDirection::Exhaust] {
        let mut net = four_corner_network(direction);
        size_network(&mut net, &DuctCatalog::default(), &SizingConfig::default()).unwrap();
        for node in net.graph().nodes() {
            let Some(parent) = net.parent_edge(node.id) else {
                continue;
            };
            let children: f64 = net
                .child_edges(node.id)
                .iter()
                .map(|&e| in_m3ph(net.annotation(e).flow))
                .sum();
            let own = node.demand.as_ref().map_or(0.0, |d| in_m3ph(d.flow));
            let incoming = in_m3ph(net.annotation(parent).flow);
            assert!((incoming - children - own).abs() < 1e-9, "imbalance at {}", node.position);
        }
    }
}

#[test]
fn low_ceiling_is_installation_space_error() {
    let mut net = four_corner_network(FlowDirection::Supply);
    let config = SizingConfig {
        shape: DuctShape::Round,
        clearance: Some(mm(60.0)),
        ..SizingConfig::default()
    };
    let err = size_network(&mut net, &DuctCatalog::default(), &config).unwrap_err();
    assert!(matches!(err, SizingError::NoFit { .. }));
    assert!(err.to_string().contains("Installation space too low"));
}

#[test]
fn surface_area_is_perimeter_times_length() {
    let mut net = four_corner_network(FlowDirection::Supply);
    size_network(&mut net, &DuctCatalog::default(), &SizingConfig::default()).unwrap();
    for edge in net.graph().edges() {
        let a = net.annotation(edge.id);
        let expected = a.wetted_perimeter.unwrap().value * edge.length.value;
        assert!((a.surface_area.unwrap().value - expected).abs() < 1e-12);
    }
}

proptest! {
    #[test]
    fn sizing_is_monotone_and_never_undersized(
        q1 in 0.0_f64..20_000.0,
        q2 in 0.0_f64..20_000.0,
        shape in prop_oneof![Just(DuctShape::Round), Just(DuctShape::Rectangular), Just(DuctShape::Optimal)],
    ) {
        let (lo, hi) = if q1 <= q2 { (q1, q2) } else { (q2, q1) };
        let catalog = DuctCatalog::default();
        let config = SizingConfig { shape, ..SizingConfig::default() };
        let a_lo = required_area(m3ph(lo), &config).unwrap();
        let a_hi = required_area(m3ph(hi), &config).unwrap();
        let s_lo = select_section(a_lo, &catalog, &config);
        let s_hi = select_section(a_hi, &catalog, &config);
        if let (Some(s_lo), Some(s_hi)) = (s_lo, s_hi) {
            prop_assert!(s_lo.area().value >= a_lo.value * (1.0 - 1e-9));
            prop_assert!(s_hi.area().value >= a_hi.value * (1.0 - 1e-9));
            if s_lo.is_round() == s_hi.is_round() {
                prop_assert!(s_hi.area().value >= s_lo.area().value);
            }
        }
    }

    #[test]
    fn exact_catalog_area_is_selected(index in 0_usize..25) {
        let catalog = DuctCatalog::default();
        let entry = catalog.round()[index];
        let config = SizingConfig { shape: DuctShape::Round, ..SizingConfig::default() };
        prop_assert_eq!(select_section(entry.area(), &catalog, &config), Some(entry));
    }
}

#[test]
fn unconstrained_huge_area_has_no_fit() {
    let catalog = DuctCatalog::default();
    let config = SizingConfig::default();
    assert_eq!(select_section(m2(50.0), &catalog, &config), None);
}

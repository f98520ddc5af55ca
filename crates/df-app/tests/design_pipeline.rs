//! Service-level tests: document in, balanced network and export out.

use std::path::PathBuf;

use df_app::{
    AppError, DesignProgressEvent, DesignStage, MemoryWriter, SharedFileWriter, export_node_link, load_design,
    route_design_levels, run_design, run_design_with_progress, validate_design,
};
use df_project::schema::*;

fn four_corners() -> Design {
    let terminal = |room: &str, x: f64, y: f64| TerminalDef {
        room: room.to_string(),
        x,
        y,
        z: 0.0,
        flow_m3ph: 100.0,
        usage: "office".to_string(),
    };
    Design {
        version: 1,
        name: "Four corners".to_string(),
        direction: DirectionDef::Supply,
        trunk: TrunkDef { x: 5.0, y: 5.0 },
        source: PointDef {
            x: 5.0,
            y: 5.0,
            z: -3.0,
        },
        terminals: vec![
            terminal("1.01", 0.0, 0.0),
            terminal("1.02", 0.0, 10.0),
            terminal("1.03", 10.0, 0.0),
            terminal("1.04", 10.0, 10.0),
        ],
        design: DesignParamsDef::default(),
        catalog: None,
        envelope: vec![],
    }
}

fn demo(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop();
    path.pop();
    path.push("demos");
    path.push(name);
    path
}

#[test]
fn four_corner_design_end_to_end() {
    let outcome = run_design(&four_corners()).unwrap();
    let net = &outcome.network;

    assert_eq!(net.graph().edges().len(), net.graph().nodes().len() - 1);
    let root = net.child_edges(net.source())[0];
    assert!((df_core::units::in_m3ph(net.annotation(root).flow) - 400.0).abs() < 1e-9);
    assert!((outcome.balance.min_pressure.value - 100.0).abs() < 1e-6);
    assert_eq!(outcome.levels.len(), 1);
    assert_eq!(outcome.levels[0].terminals, 4);
    assert!((outcome.levels[0].demand_m3ph - 400.0).abs() < 1e-9);
}

#[test]
fn progress_reports_every_stage() {
    let mut stages = Vec::new();
    run_design_with_progress(&four_corners(), Some(&mut |event: DesignProgressEvent| stages.push(event.stage))).unwrap();
    assert_eq!(
        stages,
        vec![
            DesignStage::Compiling,
            DesignStage::Routing,
            DesignStage::Sizing,
            DesignStage::Balancing,
            DesignStage::Completed,
        ]
    );
}

#[test]
fn export_is_node_link_json() {
    let outcome = run_design(&four_corners()).unwrap();
    let writer = MemoryWriter::new();
    export_node_link(&outcome, &writer, "network.json").unwrap();

    let bytes = writer.get("network.json").unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let nodes = doc["nodes"].as_array().unwrap();
    let links = doc["links"].as_array().unwrap();
    assert_eq!(nodes.len(), outcome.network.graph().nodes().len());
    assert_eq!(links.len(), nodes.len() - 1);
    assert_eq!(doc["direction"], "supply");
    assert_eq!(doc["pressure"]["unit"], "Pa");
    assert!(links.iter().all(|l| l["section"].is_object()));
    assert_eq!(
        nodes.iter().filter(|n| n["role"] == "terminal").count(),
        4
    );
}

#[test]
fn export_rejects_path_names() {
    let outcome = run_design(&four_corners()).unwrap();
    let err = export_node_link(&outcome, &MemoryWriter::new(), "../escape.json").unwrap_err();
    assert_eq!(err.stage(), "export");
}

#[test]
fn shared_writer_serializes_concurrent_exports() {
    let outcome = run_design(&four_corners()).unwrap();
    let dir = std::env::temp_dir().join("df_app_shared_writer");
    let writer = SharedFileWriter::new(&dir).unwrap();

    std::thread::scope(|s| {
        for i in 0..4 {
            let writer = &writer;
            let outcome = &outcome;
            s.spawn(move || export_node_link(outcome, writer, &format!("net_{i}.json")).unwrap());
        }
    });

    for i in 0..4 {
        let text = std::fs::read_to_string(dir.join(format!("net_{i}.json"))).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["name"], "Four corners");
    }
}

#[test]
fn routing_failure_names_its_stage() {
    let mut design = four_corners();
    // Trunk placed on a terminal
    design.trunk = TrunkDef { x: 0.0, y: 0.0 };
    design.source = PointDef {
        x: 0.0,
        y: 0.0,
        z: -3.0,
    };
    let err = run_design(&design).unwrap_err();
    assert!(matches!(err, AppError::Route(_)));
    assert_eq!(err.stage(), "routing");
}

#[test]
fn sizing_failure_names_its_stage() {
    let mut design = four_corners();
    design.design.clearance_m = Some(0.05);
    let err = run_design(&design).unwrap_err();
    assert_eq!(err.stage(), "sizing");
    assert!(err.to_string().contains("Installation space too low"));
}

#[test]
fn invalid_design_is_reported_before_running() {
    let mut design = four_corners();
    design.terminals[0].flow_m3ph = -5.0;
    design.design.target_velocity_mps = -1.0;
    let err = validate_design(&design).unwrap_err();
    assert!(matches!(err, AppError::Validation(ref msg) if msg.starts_with("2 validation issues")));
}

#[test]
fn demo_designs_run() {
    for name in ["office_supply.yaml", "two_storey_exhaust.yaml"] {
        let design = load_design(&demo(name)).unwrap();
        validate_design(&design).unwrap();
        let outcome = run_design(&design).unwrap();
        assert!((outcome.balance.min_pressure.value - design.design.safety_margin_pa).abs() < 1e-6);
    }
}

#[test]
fn two_storey_demo_has_two_levels() {
    let design = load_design(&demo("two_storey_exhaust.yaml")).unwrap();
    let levels = route_design_levels(&design).unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels.iter().map(|l| l.terminals).sum::<usize>(), 4);
    assert!(levels[0].elevation < levels[1].elevation);
}

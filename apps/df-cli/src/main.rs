use clap::{Parser, Subcommand};
use df_app::{
    AppResult, DesignOutcome, DesignProgressEvent, SharedFileWriter, design_issues, export_node_link,
    load_design, route_design_levels, run_design_with_progress, validate_design,
};
use df_core::units::in_m3ph;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "df-cli")]
#[command(about = "ductflow CLI - duct network routing, sizing and balancing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a design document and list every issue
    Validate {
        /// Path to the design YAML/JSON file
        design_path: PathBuf,
    },
    /// Route each level and summarise the trees
    Levels {
        /// Path to the design YAML/JSON file
        design_path: PathBuf,
    },
    /// Route, size and balance the whole network
    Design {
        /// Path to the design YAML/JSON file
        design_path: PathBuf,
        /// Write the node-link JSON document here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print every duct segment
        #[arg(long)]
        edges: bool,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { design_path } => cmd_validate(&design_path),
        Commands::Levels { design_path } => cmd_levels(&design_path),
        Commands::Design {
            design_path,
            output,
            edges,
        } => cmd_design(&design_path, output.as_deref(), edges),
    }
}

fn cmd_validate(design_path: &Path) -> AppResult<()> {
    println!("Validating design: {}", design_path.display());
    let design = load_design(design_path)?;
    let issues = design_issues(&design);
    if issues.is_empty() {
        println!("✓ Design is valid");
        println!(
            "  {} terminals, direction {}",
            design.terminals.len(),
            design.direction.as_str()
        );
        return Ok(());
    }
    for issue in &issues {
        println!("  ✗ {issue}");
    }
    validate_design(&design)
}

fn cmd_levels(design_path: &Path) -> AppResult<()> {
    let design = load_design(design_path)?;
    validate_design(&design)?;
    let levels = route_design_levels(&design)?;

    println!("Levels in '{}':", design.name);
    for level in levels {
        println!(
            "  z = {:>7.3} m: {} terminals, {} nodes, {} edges, {:.1} m of duct, {:.0} m³/h",
            level.elevation, level.terminals, level.nodes, level.edges, level.length_m, level.demand_m3ph
        );
    }
    Ok(())
}

fn cmd_design(design_path: &Path, output: Option<&Path>, edges: bool) -> AppResult<()> {
    let design = load_design(design_path)?;
    validate_design(&design)?;
    println!("Designing '{}'", design.name);

    let outcome = run_design_with_progress(&design, Some(&mut render_progress))?;
    print_summary(&outcome);
    if edges {
        print_edges(&outcome);
    }

    if let Some(path) = output {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "network.json".to_string());
        let writer = SharedFileWriter::new(dir)?;
        export_node_link(&outcome, &writer, &name)?;
        println!("✓ Network written to {}", path.display());
    }
    Ok(())
}

fn render_progress(event: DesignProgressEvent) {
    match &event.message {
        Some(message) => println!(
            "  [{:>9}] {:.2}s  {}",
            event.stage.as_str(),
            event.elapsed_wall_s,
            message
        ),
        None => println!("  [{:>9}] {:.2}s", event.stage.as_str(), event.elapsed_wall_s),
    }
}

fn print_summary(outcome: &DesignOutcome) {
    let net = &outcome.network;
    let balance = &outcome.balance;
    println!("✓ Design completed");
    println!(
        "  Network: {} nodes, {} edges, {} levels",
        net.graph().nodes().len(),
        net.graph().edges().len(),
        outcome.levels.len()
    );
    println!(
        "  Flow: {:.0} m³/h, duct length {:.1} m, sheet surface {:.1} m²",
        in_m3ph(outcome.sizing.total_flow),
        outcome.sizing.total_length.value,
        outcome.sizing.total_surface.value
    );
    println!(
        "  Sections: {} round, {} rectangular",
        outcome.sizing.round_edges, outcome.sizing.rectangular_edges
    );
    println!(
        "  Critical path loss: {:.1} Pa (node {})",
        balance.critical_path_loss.value, balance.critical_node
    );
    println!(
        "  Total pressure loss: {:.2} {} ({} solver iterations)",
        balance.reported_total(),
        balance.unit,
        balance.iterations
    );
}

fn print_edges(outcome: &DesignOutcome) {
    let net = &outcome.network;
    println!("  {:>5} {:>5} {:>7} {:>9} {:>12} {:>8} {:>8}", "from", "to", "len m", "m³/h", "section", "ζ", "Δp Pa");
    for edge in net.graph().edges() {
        let (from, to) = net.flow_endpoints(edge.id);
        let ann = net.annotation(edge.id);
        let section = ann.section.map_or_else(|| "-".to_string(), |s| s.to_string());
        let loss = ann.friction_loss.map_or(0.0, |p| p.value) + ann.fitting_loss.map_or(0.0, |p| p.value);
        println!(
            "  {:>5} {:>5} {:>7.2} {:>9.1} {:>12} {:>8.3} {:>8.2}",
            from,
            to,
            edge.length.value,
            in_m3ph(ann.flow),
            section,
            ann.loss_coefficient.unwrap_or(0.0),
            loss
        );
    }
}

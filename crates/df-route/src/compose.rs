//! Stitch level trees, the vertical riser and the source into one network.

use df_core::{NodeId, Point};
use df_graph::{FlowDirection, GraphBuilder, LevelTree, Network, NodeRole};
use petgraph::unionfind::UnionFind;
use tracing::info;

use crate::error::{RouteError, RouteResult};

/// Builder state with cycle detection over every connection made.
struct Composer {
    builder: GraphBuilder,
    components: UnionFind<usize>,
}

impl Composer {
    fn connect(&mut self, a: NodeId, b: NodeId) -> RouteResult<()> {
        if !self.components.union(a.idx(), b.idx()) {
            let position = |id| self.builder.node(id).map(|n| n.position).unwrap_or_default();
            return Err(RouteError::DuplicateConnection {
                a: position(a),
                b: position(b),
            });
        }
        self.builder.add_edge(a, b)?;
        Ok(())
    }
}

/// Join the level trees through a vertical trunk chain and attach the source
/// to the trunk node nearest in elevation (ties go to the lower level).
pub fn compose(levels: &[LevelTree], source: Point, direction: FlowDirection) -> RouteResult<Network> {
    let mut levels: Vec<&LevelTree> = levels.iter().collect();
    levels.sort_by(|a, b| a.elevation.total_cmp(&b.elevation));

    let capacity = levels.iter().map(|l| l.graph.nodes().len()).sum::<usize>() + 1;
    let mut composer = Composer {
        builder: GraphBuilder::new(),
        components: UnionFind::new(capacity),
    };

    let mut trunks: Vec<(f64, NodeId)> = Vec::with_capacity(levels.len());
    for level in &levels {
        let mut ids = Vec::with_capacity(level.graph.nodes().len());
        for node in level.graph.nodes() {
            ids.push(composer.builder.add_node_like(node));
        }
        for edge in level.graph.edges() {
            composer.connect(ids[edge.a.idx()], ids[edge.b.idx()])?;
        }
        trunks.push((level.elevation, ids[level.trunk.idx()]));
    }

    for pair in trunks.windows(2) {
        composer.connect(pair[0].1, pair[1].1)?;
    }

    let source = source.snapped();
    if let Some(existing) = composer.builder.find(&source) {
        let at = composer.builder.node(existing).map_or(source, |n| n.position);
        return Err(RouteError::DuplicateConnection { a: source, b: at });
    }
    let source_id = composer.builder.add_node(source, NodeRole::Source);
    if let Some(&(_, nearest)) = trunks.iter().min_by(|a, b| {
        (a.0 - source.z)
            .abs()
            .total_cmp(&(b.0 - source.z).abs())
            .then(a.0.total_cmp(&b.0))
    }) {
        composer.connect(source_id, nearest)?;
    }

    let graph = composer.builder.build()?;
    info!(
        levels = levels.len(),
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        direction = direction.as_str(),
        "network composed"
    );
    Ok(Network::new(graph, source_id, direction)?)
}

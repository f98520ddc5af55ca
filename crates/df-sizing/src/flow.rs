//! Bottom-up demand aggregation.

use df_core::units::VolumeRate;
use df_graph::Network;

use crate::error::{SizingError, SizingResult};

/// Fill every edge's flow with the sum of terminal demands behind it.
///
/// Nodes are visited children-first (reverse breadth-first order), so each
/// parent edge sees its subtree total. Returns the flow leaving the source.
pub fn aggregate_flows(network: &mut Network) -> SizingResult<VolumeRate> {
    let mut through = vec![VolumeRate::default(); network.graph().nodes().len()];
    let order: Vec<_> = network.bfs_order().to_vec();

    for &node in order.iter().rev() {
        let own = network
            .graph()
            .node(node)
            .and_then(|n| n.demand.as_ref())
            .map(|d| d.flow)
            .unwrap_or_default();
        let total = through[node.idx()] + own;
        if let Some(edge) = network.parent_edge(node) {
            if !total.value.is_finite() || total.value < 0.0 {
                return Err(SizingError::NonPhysicalFlow {
                    edge,
                    value: total.value,
                });
            }
            network.annotation_mut(edge).flow = total;
            let parent = network.upstream_node(edge);
            through[parent.idx()] += total;
        } else {
            through[node.idx()] = total;
        }
    }

    Ok(through[network.source().idx()])
}

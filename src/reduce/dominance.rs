//! Dominance pruning: drop sensors whose coverage is a subset of another's.

use tracing::debug;

use crate::graph::CoverageGraph;
use crate::model::NodeId;
use crate::Result;
use super::{PassOutcome, ReductionRule, ReductionState};

/// Removes every sensor whose demand-point set is contained in another
/// sensor's set and records it as forced off.
///
/// Pairs are visited over a snapshot of the sensor ids taken at pass start,
/// in ascending id order. For equal sets the lower id is removed.
/// Removing a sensor never changes another sensor's adjacency, so one pass
/// leaves no dominated pair behind and a second pass is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct DominanceReducer;

impl ReductionRule for DominanceReducer {
    const NAME: &'static str = "dominance";

    fn apply(&mut self, graph: &mut CoverageGraph, state: &mut ReductionState) -> Result<PassOutcome> {
        let sensors: Vec<NodeId> = graph.sensors().collect();
        let mut outcome = PassOutcome::default();

        for (i, &l1) in sensors.iter().enumerate() {
            for &l2 in &sensors[i + 1..] {
                if !graph.contains(l1) {
                    break;
                }
                if !graph.contains(l2) {
                    continue;
                }

                let adj1 = graph.neighbors(l1)?;
                let adj2 = graph.neighbors(l2)?;
                let dominated = if adj1.is_subset(adj2) {
                    l1
                } else if adj2.is_subset(adj1) {
                    l2
                } else {
                    continue;
                };

                let sensor = graph.remove_sensor(dominated)?;
                state.force_off(sensor);
                outcome.sensors_decided += 1;
            }
        }

        debug!(
            rule = Self::NAME,
            removed = outcome.sensors_decided,
            remaining = graph.sensor_count(),
            "dominance pass finished"
        );
        Ok(outcome)
    }
}

//! Unit propagation: force the sole coverer of a demand point on.

use tracing::debug;

use crate::graph::CoverageGraph;
use crate::model::NodeId;
use crate::{Error, Result};
use super::{PassOutcome, ReductionRule, ReductionState};

/// Forces on every sensor that is the only coverer of some demand point, then
/// removes that sensor together with every demand point it covers.
///
/// One pass only, with degrees read before anything is removed. Shrinking a
/// sensor's coverage can make it dominated, and that in turn can leave new
/// sole coverers; those are only found by running both rules again.
/// A demand point of degree 0 aborts the pass with
/// [`Error::IsolatedDemandPoint`] before the graph is touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitPropagator;

impl ReductionRule for UnitPropagator {
    const NAME: &'static str = "unit-propagation";

    fn apply(&mut self, graph: &mut CoverageGraph, state: &mut ReductionState) -> Result<PassOutcome> {
        let mut sole_coverers: Vec<NodeId> = Vec::new();
        for point in graph.demand_points() {
            let adjacency = graph.neighbors(point)?;
            match adjacency.len() {
                0 => return Err(Error::IsolatedDemandPoint(graph.demand_point(point)?)),
                1 => sole_coverers.extend(adjacency.iter().copied()),
                _ => {}
            }
        }
        sole_coverers.sort_unstable();
        sole_coverers.dedup();

        let mut outcome = PassOutcome::default();
        for sensor_id in sole_coverers {
            for point in graph.sorted_neighbors(sensor_id)? {
                graph.remove_demand_point(point)?;
                outcome.demand_points_removed += 1;
            }
            let sensor = graph.remove_sensor(sensor_id)?;
            state.force_on(sensor);
            outcome.sensors_decided += 1;
        }

        debug!(
            rule = Self::NAME,
            forced_on = outcome.sensors_decided,
            demand_points_removed = outcome.demand_points_removed,
            remaining = graph.sensor_count(),
            "propagation pass finished"
        );
        Ok(outcome)
    }
}

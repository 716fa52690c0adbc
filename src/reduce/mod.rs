//! # Exact Reductions
//!
//! Passes that decide sensors without changing the optimum, shrinking the
//! graph before it is encoded.
//!
//! | Rule | Decides | Removes |
//! |------|---------|---------|
//! | [`DominanceReducer`] | forced off | dominated sensor |
//! | [`UnitPropagator`] | forced on | sole coverer and everything it covers |
//!
//! Each rule is a single pass. [`Reducer`] chains them once or up to a fixed
//! point according to [`ReductionMode`].

pub mod dominance;
pub mod propagation;

use std::time::Instant;

use tracing::{info, warn};

use crate::config::{PipelineConfig, ReductionMode};
use crate::graph::CoverageGraph;
use crate::model::{Sensor, Solution};
use crate::Result;

pub use dominance::DominanceReducer;
pub use propagation::UnitPropagator;

// ============================================================================
// Reduction state
// ============================================================================

/// Decisions taken so far, in the order they were made.
///
/// Together with the sensors still in the graph this partitions the sensor
/// universe: a sensor is removed from the graph exactly when it is forced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReductionState {
    forced_off: Vec<Sensor>,
    forced_on: Vec<Sensor>,
}

impl ReductionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn force_off(&mut self, sensor: Sensor) {
        self.forced_off.push(sensor);
    }

    pub(crate) fn force_on(&mut self, sensor: Sensor) {
        self.forced_on.push(sensor);
    }

    /// Sensors proven never needed.
    pub fn forced_off(&self) -> &[Sensor] {
        &self.forced_off
    }

    /// Sensors proven always needed.
    pub fn forced_on(&self) -> &[Sensor] {
        &self.forced_on
    }

    pub fn is_forced_off(&self, sensor: &Sensor) -> bool {
        self.forced_off.contains(sensor)
    }

    pub fn is_forced_on(&self, sensor: &Sensor) -> bool {
        self.forced_on.contains(sensor)
    }

    /// The still-free sensors: whatever the graph holds, in id order.
    pub fn remaining(&self, graph: &CoverageGraph) -> Result<Vec<Sensor>> {
        graph.sensors().map(|id| graph.sensor(id)).collect()
    }

    /// Write the forced decisions into `solution`, extending a decoded
    /// assignment of the free sensors to the full sensor universe.
    pub fn merge_into(&self, solution: &mut Solution) {
        solution.extend(self.forced_off.iter().map(|s| (*s, false)));
        solution.extend(self.forced_on.iter().map(|s| (*s, true)));
    }
}

// ============================================================================
// Rule contract
// ============================================================================

/// What a single pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Sensors moved out of the graph into a forced set.
    pub sensors_decided: usize,
    /// Demand points removed because they are already satisfied.
    pub demand_points_removed: usize,
}

impl PassOutcome {
    pub fn made_progress(&self) -> bool {
        self.sensors_decided > 0 || self.demand_points_removed > 0
    }
}

/// A reduction pass over the coverage graph.
///
/// A rule may mutate the graph and the state. An error aborts the pass; the
/// caller must not encode the graph afterwards.
pub trait ReductionRule {
    const NAME: &'static str;

    fn apply(&mut self, graph: &mut CoverageGraph, state: &mut ReductionState) -> Result<PassOutcome>;
}

// ============================================================================
// Driver
// ============================================================================

/// Totals over every pass a [`Reducer`] ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReductionReport {
    /// Rounds of dominance + propagation executed.
    pub rounds: usize,
    pub forced_off: usize,
    pub forced_on: usize,
    pub demand_points_removed: usize,
}

/// Runs the reduction rules according to a [`ReductionMode`].
#[derive(Debug, Clone, Copy)]
pub struct Reducer {
    mode: ReductionMode,
    dominance: bool,
}

impl Reducer {
    pub fn new(mode: ReductionMode) -> Self {
        Self { mode, dominance: true }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self { mode: config.reduction, dominance: config.dominance }
    }

    pub fn with_dominance(mut self, dominance: bool) -> Self {
        self.dominance = dominance;
        self
    }

    pub fn run(&self, graph: &mut CoverageGraph, state: &mut ReductionState) -> Result<ReductionReport> {
        let start = Instant::now();
        let mut report = ReductionReport::default();

        let isolated = graph.isolated_demand_points();
        if !isolated.is_empty() {
            warn!(count = isolated.len(), first = %isolated[0], "isolated demand points detected");
        }

        let max_rounds = match self.mode {
            ReductionMode::None => 0,
            ReductionMode::SinglePass => 1,
            ReductionMode::FixedPoint => usize::MAX,
        };

        while report.rounds < max_rounds {
            report.rounds += 1;
            let mut progress = false;

            if self.dominance {
                let outcome = DominanceReducer.apply(graph, state)?;
                report.forced_off += outcome.sensors_decided;
                progress |= outcome.made_progress();
            }

            let outcome = UnitPropagator.apply(graph, state)?;
            report.forced_on += outcome.sensors_decided;
            report.demand_points_removed += outcome.demand_points_removed;
            progress |= outcome.made_progress();

            if !progress {
                break;
            }
        }

        info!(
            mode = ?self.mode,
            rounds = report.rounds,
            forced_off = report.forced_off,
            forced_on = report.forced_on,
            sensors_left = graph.sensor_count(),
            demand_points_left = graph.demand_point_count(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            "reduction finished"
        );
        Ok(report)
    }
}

/// Run dominance and propagation until neither changes the graph.
pub fn reduce_to_fixed_point(graph: &mut CoverageGraph, state: &mut ReductionState) -> Result<ReductionReport> {
    Reducer::new(ReductionMode::FixedPoint).run(graph, state)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DemandPoint;
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn sensor(i: u32) -> Sensor {
        Sensor::new(i as f64, 0.0, 2.5, 0.0, -10.0)
    }

    fn point(i: u32) -> DemandPoint {
        DemandPoint::new(i as f64, 1.0, 0.0)
    }

    /// s0 is the sole coverer of p0. Once s0 takes p1 with it, s1 only sees
    /// p2 and becomes dominated by s2, which a single pass never notices.
    fn cascading_graph() -> CoverageGraph {
        let mut g = CoverageGraph::new();
        g.connect(sensor(0), point(0));
        g.connect(sensor(0), point(1));
        g.connect(sensor(1), point(1));
        g.connect(sensor(1), point(2));
        g.connect(sensor(2), point(2));
        g.connect(sensor(2), point(3));
        g.connect(sensor(3), point(3));
        g.connect(sensor(3), point(4));
        g.connect(sensor(4), point(4));
        g.connect(sensor(4), point(2));
        g
    }

    #[test]
    fn test_single_pass_stops_after_one_round() {
        let mut g = cascading_graph();
        let mut state = ReductionState::new();
        let report = Reducer::new(ReductionMode::SinglePass).run(&mut g, &mut state).unwrap();

        assert_eq!(report.rounds, 1);
        assert_eq!(state.forced_on(), &[sensor(0)]);
        assert!(g.sensor_id(&sensor(1)).is_some());
    }

    #[test]
    fn test_fixed_point_chases_cascade() {
        let mut g = cascading_graph();
        let mut state = ReductionState::new();
        let report = reduce_to_fixed_point(&mut g, &mut state).unwrap();

        assert!(report.rounds >= 2);
        assert!(state.is_forced_on(&sensor(0)));
        assert!(state.is_forced_off(&sensor(1)));

        // nothing left for another round to do
        let again = reduce_to_fixed_point(&mut g, &mut state).unwrap();
        assert_eq!(again.rounds, 1);
        assert_eq!(again.forced_off + again.forced_on, 0);
    }

    #[test]
    fn test_mode_none_leaves_graph_alone() {
        let mut g = cascading_graph();
        let mut state = ReductionState::new();
        let report = Reducer::new(ReductionMode::None).run(&mut g, &mut state).unwrap();

        assert_eq!(report, ReductionReport::default());
        assert_eq!(g.sensor_count(), 5);
    }

    #[test]
    fn test_every_sensor_in_exactly_one_set() {
        let mut g = cascading_graph();
        let universe: Vec<Sensor> = (0..5).map(sensor).collect();
        let mut state = ReductionState::new();
        reduce_to_fixed_point(&mut g, &mut state).unwrap();

        let remaining = state.remaining(&g).unwrap();
        for s in &universe {
            let memberships = [state.is_forced_off(s), state.is_forced_on(s), remaining.contains(s)]
                .iter()
                .filter(|b| **b)
                .count();
            assert_eq!(memberships, 1, "sensor {s} must be in exactly one set");
        }
    }

    #[test]
    fn test_isolated_point_aborts_reduction() {
        let mut g = cascading_graph();
        g.add_demand_point(point(99));
        let mut state = ReductionState::new();
        let err = Reducer::new(ReductionMode::FixedPoint).run(&mut g, &mut state).unwrap_err();
        assert!(matches!(err, Error::IsolatedDemandPoint(p) if p == point(99)));
    }

    #[test]
    fn test_merge_into_solution() {
        let mut state = ReductionState::new();
        state.force_off(sensor(0));
        state.force_on(sensor(1));

        let mut solution: Solution = [(sensor(2), true)].into_iter().collect();
        state.merge_into(&mut solution);

        assert_eq!(solution.len(), 3);
        assert_eq!(solution.get(&sensor(0)), Some(false));
        assert_eq!(solution.get(&sensor(1)), Some(true));
        assert_eq!(solution.get(&sensor(2)), Some(true));
    }
}

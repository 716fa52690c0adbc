//! # lidar-qubo: Sensor Coverage as QUBO
//!
//! Formulates "which lidar sensors must be active so that every street point
//! is observed" as a Quadratic Unconstrained Binary Optimization matrix for
//! annealing-based samplers, after shrinking the problem with exact,
//! objective-preserving graph reductions.
//!
//! ## Pipeline
//!
//! ```text
//! CoverageGraph ─▶ DominanceReducer ─▶ UnitPropagator ─▶ QuboEncoder ─▶ [Sampler] ─▶ SolutionDecoder
//!   (Unreduced)        (optional)                          (Encoded)
//! ```
//!
//! 1. **Reduce**: sensors covering a subset of another sensor's points are
//!    forced off; sole coverers of a point are forced on and removed together
//!    with everything they cover.
//! 2. **Encode**: every remaining covering constraint becomes a quadratic
//!    penalty with binary slack bits; each sensor costs `P1`.
//! 3. **Sample**: done by an external [`Sampler`].
//! 4. **Decode**: the sensor prefix of the sample, merged with the forced
//!    decisions, gives an activation for every sensor.
//!
//! ## Quick Start
//!
//! ```rust
//! use lidar_qubo::{CoverageGraph, CoverageProblem, DemandPoint, PipelineConfig, Sensor};
//!
//! # fn example() -> lidar_qubo::Result<()> {
//! let a = Sensor::new(0.0, 0.0, 2.5, 0.0, -10.0);
//! let b = Sensor::new(4.0, 0.0, 2.5, 180.0, -10.0);
//! let c = Sensor::new(2.0, 0.0, 2.5, 90.0, -10.0);
//! let e = Sensor::new(6.0, 0.0, 2.5, 270.0, -10.0);
//! let p = |x: f64| DemandPoint::new(x, 1.0, 0.0);
//!
//! let mut graph = CoverageGraph::new();
//! graph.connect(a, p(1.0));
//! graph.connect(a, p(2.0));
//! graph.connect(b, p(2.0));
//! graph.connect(b, p(3.0));
//! graph.connect(c, p(3.0));
//! graph.connect(c, p(4.0));
//! graph.connect(e, p(4.0));
//! graph.connect(e, p(2.0));
//!
//! let encoded = CoverageProblem::build(graph, &PipelineConfig::default())?;
//! assert!(encoded.state().is_forced_on(&a));
//! // b, c, e stay free; two constraints with one slack bit each
//! assert_eq!(encoded.matrix().map(|m| m.size()), Some(5));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::time::Duration;

use tracing::info;

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod graph;
pub mod model;
pub mod qubo;
pub mod reduce;
pub mod sampler;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{PenaltyWeights, PipelineConfig, ReductionMode};
pub use graph::CoverageGraph;
pub use model::{DemandPoint, NodeId, NodeKind, Sensor, Solution};
pub use qubo::{slack_bits, QuboEncoder, QuboMatrix, QuboModel, SolutionDecoder};
pub use reduce::{
    reduce_to_fixed_point, DominanceReducer, PassOutcome, Reducer, ReductionReport,
    ReductionRule, ReductionState, UnitPropagator,
};
pub use sampler::{SampleSet, Sampler, SamplerOptions, SolveOutcome};

// ============================================================================
// Top-level problem handle
// ============================================================================

/// One problem instance on its way from graph to matrix.
///
/// Reduction mutates the owned graph in place and may run any number of
/// times; [`CoverageProblem::encode`] consumes the problem, so nothing can
/// touch the graph once a matrix exists.
#[derive(Debug, Clone)]
pub struct CoverageProblem {
    graph: CoverageGraph,
    state: ReductionState,
}

impl CoverageProblem {
    pub fn new(graph: CoverageGraph) -> Self {
        Self { graph, state: ReductionState::new() }
    }

    /// Reduce with `config.reduction` and encode with `config.weights`.
    pub fn build(graph: CoverageGraph, config: &PipelineConfig) -> Result<EncodedProblem> {
        let mut problem = Self::new(graph);
        problem.reduce(&Reducer::from_config(config))?;
        problem.encode(config.weights)
    }

    pub fn graph(&self) -> &CoverageGraph {
        &self.graph
    }

    pub fn state(&self) -> &ReductionState {
        &self.state
    }

    pub fn reduce(&mut self, reducer: &Reducer) -> Result<ReductionReport> {
        reducer.run(&mut self.graph, &mut self.state)
    }

    /// Apply a single rule once.
    pub fn apply<R: ReductionRule>(&mut self, rule: &mut R) -> Result<PassOutcome> {
        rule.apply(&mut self.graph, &mut self.state)
    }

    /// Encode what the reductions left.
    ///
    /// When every sensor was decided by reduction there is nothing to encode;
    /// the result then has no model and its solution is the forced one.
    pub fn encode(self, weights: PenaltyWeights) -> Result<EncodedProblem> {
        let model = match QuboEncoder::new(weights).encode(&self.graph) {
            Ok(model) => Some(model),
            Err(Error::EmptyGraph) => {
                info!(
                    forced_on = self.state.forced_on().len(),
                    forced_off = self.state.forced_off().len(),
                    "every sensor decided by reduction"
                );
                None
            }
            Err(e) => return Err(e),
        };
        Ok(EncodedProblem { model, state: self.state })
    }
}

/// A built matrix together with the decisions the reductions made.
///
/// Immutable; sample and decode as often as needed. Holds no model when the
/// reductions decided every sensor.
#[derive(Debug, Clone)]
pub struct EncodedProblem {
    model: Option<QuboModel>,
    state: ReductionState,
}

impl EncodedProblem {
    pub fn model(&self) -> Option<&QuboModel> {
        self.model.as_ref()
    }

    pub fn matrix(&self) -> Option<&QuboMatrix> {
        self.model.as_ref().map(QuboModel::matrix)
    }

    /// True when no sensor was left to encode.
    pub fn is_fully_forced(&self) -> bool {
        self.model.is_none()
    }

    pub fn state(&self) -> &ReductionState {
        &self.state
    }

    /// The forced decisions alone.
    pub fn forced_solution(&self) -> Solution {
        let mut solution = Solution::new();
        self.state.merge_into(&mut solution);
        solution
    }

    /// Decode a sample and add the forced sensors, covering every sensor of
    /// the original graph.
    ///
    /// Without a model only the empty sample is accepted.
    pub fn decode(&self, sample: &[bool]) -> Result<Solution> {
        let Some(model) = &self.model else {
            if !sample.is_empty() {
                return Err(Error::MalformedSample { expected: 0, got: sample.len() });
            }
            return Ok(self.forced_solution());
        };
        let mut solution = model.decode(sample)?;
        self.state.merge_into(&mut solution);
        Ok(solution)
    }

    /// Sample, decode and merge the forced sensors.
    ///
    /// Without a model the sampler is not called and the forced solution is
    /// returned with zero energy.
    pub fn solve<S: Sampler + ?Sized>(&self, sampler: &S, options: &SamplerOptions) -> Result<SolveOutcome> {
        let Some(model) = &self.model else {
            return Ok(SolveOutcome {
                solution: self.forced_solution(),
                energy: 0.0,
                runtime: Duration::ZERO,
                info: serde_json::Value::Null,
            });
        };
        let mut outcome = model.solve(sampler, options)?;
        self.state.merge_into(&mut outcome.solution);
        Ok(outcome)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid coverage edge: {0}")]
    InvalidEdge(String),

    #[error("Isolated demand point {0}: no sensor can cover it")]
    IsolatedDemandPoint(DemandPoint),

    #[error("Empty graph: no sensors left to encode")]
    EmptyGraph,

    #[error("Malformed sample: expected {expected} bits, got {got}")]
    MalformedSample { expected: usize, got: usize },

    #[error("Sampler error: {0}")]
    SamplerError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

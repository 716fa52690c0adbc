//! Sampling boundary.
//!
//! The minimizer itself lives outside this crate. Anything implementing
//! [`Sampler`] (including a plain closure) can be handed a [`QuboMatrix`];
//! solver options go in and solver metadata comes out as opaque JSON.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::model::Solution;
use crate::qubo::QuboMatrix;
use crate::Result;

/// Solver-specific options, e.g. `{"num_reads": 1000, "num_sweeps": 1000}`.
pub type SamplerOptions = Map<String, Value>;

/// Best sample returned by a sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    /// One bit per matrix index.
    pub sample: Vec<bool>,
    pub energy: f64,
    /// Solver metadata, passed through untouched.
    pub info: Value,
}

/// Minimizes `xᵗQx` over bit vectors.
///
/// Implementations only read the matrix, so one matrix may be sampled from
/// several threads at once.
pub trait Sampler {
    fn sample_qubo(&self, matrix: &QuboMatrix, options: &SamplerOptions) -> Result<SampleSet>;
}

impl<F> Sampler for F
where
    F: Fn(&QuboMatrix, &SamplerOptions) -> Result<SampleSet>,
{
    fn sample_qubo(&self, matrix: &QuboMatrix, options: &SamplerOptions) -> Result<SampleSet> {
        self(matrix, options)
    }
}

/// A decoded sampler answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub solution: Solution,
    pub energy: f64,
    /// Wall time spent inside the sampler.
    pub runtime: Duration,
    pub info: Value,
}

//! QUBO encoder: covering constraints as quadratic penalties.
//!
//! Demand point `p` with adjacent free sensors `adj(p)` must be covered at
//! least once. With `b = slack_bits(|adj(p)|)` slack bits `y_k` this becomes
//!
//! ```text
//! Σ_{l ∈ adj(p)} x_l − Σ_k 2^k y_k − 1 = 0
//! ```
//!
//! and is added to the objective as `P3 · (Σ c_i x_i − 1)²`, expanded with
//! `x² = x` and the constant dropped. Every coverage count in `1..=|adj(p)|`
//! has a slack value giving zero penalty; a count of 0 never does.

use std::time::Instant;

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::config::PenaltyWeights;
use crate::graph::CoverageGraph;
use crate::model::{NodeId, Sensor, Solution};
use crate::sampler::{Sampler, SamplerOptions, SolveOutcome};
use crate::{Error, Result};
use super::{QuboMatrix, SolutionDecoder};

/// Slack bits needed for a demand point covered by `degree` sensors:
/// 0 for degree 0 or 1, else `⌈log2(degree)⌉`.
pub fn slack_bits(degree: usize) -> usize {
    if degree <= 1 {
        0
    } else {
        (usize::BITS - (degree - 1).leading_zeros()) as usize
    }
}

// ============================================================================
// SlackGroup
// ============================================================================

/// Variables of one demand point's covering constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlackGroup {
    /// Matrix indices of the adjacent free sensors, ascending.
    pub sensors: SmallVec<[usize; 8]>,
    /// Matrix index of slack bit 0.
    pub offset: usize,
    /// Number of slack bits; bit `k` weighs `2^k`.
    pub bits: usize,
}

impl SlackGroup {
    /// `(index, coefficient)` of every variable in the constraint expression.
    fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        let sensors = self.sensors.iter().map(|i| (*i, 1.0));
        let slack = (0..self.bits).map(|k| (self.offset + k, -((1u64 << k) as f64)));
        sensors.chain(slack)
    }

    /// Add `weight · (Σ c_i x_i − 1)²` minus its constant to `matrix`.
    fn apply_penalty(&self, matrix: &mut QuboMatrix, weight: f64) {
        let terms: SmallVec<[(usize, f64); 16]> = self.terms().collect();
        for &(i, ci) in &terms {
            matrix.add(i, i, -2.0 * weight * ci);
            for &(j, cj) in &terms {
                matrix.add(i, j, weight * ci * cj);
            }
        }
    }
}

// ============================================================================
// QuboModel
// ============================================================================

/// Output of [`QuboEncoder::encode`]: the matrix plus what is needed to read
/// samples back.
#[derive(Debug, Clone, PartialEq)]
pub struct QuboModel {
    matrix: QuboMatrix,
    variables: Vec<Sensor>,
    mandatory: Vec<Sensor>,
    slack_bits: usize,
}

impl QuboModel {
    pub fn matrix(&self) -> &QuboMatrix {
        &self.matrix
    }

    /// Free sensors in matrix index order.
    pub fn variables(&self) -> &[Sensor] {
        &self.variables
    }

    /// Free sensors that are the only coverer of some demand point.
    ///
    /// Unlike forced-on sensors these are still variables; they carry the
    /// `P2` bias instead.
    pub fn mandatory(&self) -> &[Sensor] {
        &self.mandatory
    }

    pub fn sensor_count(&self) -> usize {
        self.variables.len()
    }

    pub fn slack_bits(&self) -> usize {
        self.slack_bits
    }

    pub fn decoder(&self) -> SolutionDecoder<'_> {
        SolutionDecoder::new(&self.variables, self.matrix.size())
    }

    /// Read the sensor prefix of a sample; slack bits are dropped.
    pub fn decode(&self, sample: &[bool]) -> Result<Solution> {
        self.decoder().decode(sample)
    }

    /// Hand the matrix to `sampler` and decode its best sample.
    pub fn solve<S: Sampler + ?Sized>(&self, sampler: &S, options: &SamplerOptions) -> Result<SolveOutcome> {
        let start = Instant::now();
        let set = sampler.sample_qubo(&self.matrix, options)?;
        let runtime = start.elapsed();

        let solution = self.decode(&set.sample)?;
        info!(
            size = self.matrix.size(),
            energy = set.energy,
            active = solution.active_count(),
            runtime_ms = runtime.as_secs_f64() * 1e3,
            "sampling finished"
        );
        Ok(SolveOutcome { solution, energy: set.energy, runtime, info: set.info })
    }
}

// ============================================================================
// QuboEncoder
// ============================================================================

/// Builds a [`QuboModel`] from a (reduced) coverage graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuboEncoder {
    weights: PenaltyWeights,
}

impl QuboEncoder {
    pub fn new(weights: PenaltyWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &PenaltyWeights {
        &self.weights
    }

    /// Fails with [`Error::IsolatedDemandPoint`] when a demand point has no
    /// coverer, then with [`Error::EmptyGraph`] when no sensor is left.
    pub fn encode(&self, graph: &CoverageGraph) -> Result<QuboModel> {
        let start = Instant::now();
        self.weights.validate()?;
        for point in graph.demand_points() {
            if graph.degree(point)? == 0 {
                return Err(Error::IsolatedDemandPoint(graph.demand_point(point)?));
            }
        }
        if graph.sensor_count() == 0 {
            return Err(Error::EmptyGraph);
        }

        let mut index: HashMap<NodeId, usize> = HashMap::with_capacity(graph.sensor_count());
        let mut variables = Vec::with_capacity(graph.sensor_count());
        for id in graph.sensors() {
            index.insert(id, variables.len());
            variables.push(graph.sensor(id)?);
        }

        let sensor_count = variables.len();
        let mut sole_coverer = vec![false; sensor_count];
        let mut groups = Vec::with_capacity(graph.demand_point_count());
        let mut next = sensor_count;

        for point in graph.demand_points() {
            let sensors = graph
                .sorted_neighbors(point)?
                .into_iter()
                .map(|id| index.get(&id).copied().ok_or_else(|| Error::NotFound(format!("Sensor {id}"))))
                .collect::<Result<SmallVec<[usize; 8]>>>()?;

            if let [only] = sensors.as_slice() {
                sole_coverer[*only] = true;
            }

            let bits = slack_bits(sensors.len());
            groups.push(SlackGroup { sensors, offset: next, bits });
            next += bits;
        }

        let mut matrix = QuboMatrix::zeros(next);

        for (i, mandatory) in sole_coverer.iter().enumerate() {
            matrix.add(i, i, self.weights.activation);
            if *mandatory {
                matrix.add(i, i, -self.weights.sole_coverer_bias);
            }
        }

        for group in &groups {
            group.apply_penalty(&mut matrix, self.weights.constraint);
        }

        let mandatory: Vec<Sensor> = variables
            .iter()
            .zip(&sole_coverer)
            .filter(|(_, m)| **m)
            .map(|(s, _)| *s)
            .collect();

        debug!(
            sensors = sensor_count,
            constraints = groups.len(),
            slack_bits = next - sensor_count,
            mandatory = mandatory.len(),
            "variables assigned"
        );
        info!(size = next, elapsed_ms = start.elapsed().as_secs_f64() * 1e3, "QUBO matrix built");

        Ok(QuboModel { matrix, variables, mandatory, slack_bits: next - sensor_count })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DemandPoint;
    use pretty_assertions::assert_eq;

    fn sensor(i: u32) -> Sensor {
        Sensor::new(i as f64, 0.0, 2.5, 0.0, -10.0)
    }

    fn point(i: u32) -> DemandPoint {
        DemandPoint::new(i as f64, 1.0, 0.0)
    }

    #[test]
    fn test_slack_bits() {
        let expected = [(0, 0), (1, 0), (2, 1), (3, 2), (4, 2), (5, 3), (8, 3), (9, 4), (16, 4), (17, 5)];
        for (degree, bits) in expected {
            assert_eq!(slack_bits(degree), bits, "degree {degree}");
        }
    }

    #[test]
    fn test_three_sensors_one_point() {
        let mut g = CoverageGraph::new();
        for s in 0..3 {
            g.connect(sensor(s), point(0));
        }
        let model = QuboEncoder::default().encode(&g).unwrap();

        assert_eq!(model.matrix().size(), 5);
        assert_eq!(model.sensor_count(), 3);
        assert_eq!(model.slack_bits(), 2);
        assert!(model.mandatory().is_empty());
        assert!(model.matrix().is_symmetric());
    }

    #[test]
    fn test_coefficients_single_constraint() {
        // two sensors, one shared point, P1 = 1, P3 = 2
        let mut g = CoverageGraph::new();
        g.connect(sensor(0), point(0));
        g.connect(sensor(1), point(0));
        let model = QuboEncoder::new(PenaltyWeights::new(1.0, 2.0, 2.0)).encode(&g).unwrap();
        let q = model.matrix();

        // terms: x0 (+1), x1 (+1), y0 (−1)
        // sensor diag: P1 + P3·1 − 2·P3·1 = 1 + 2 − 4
        assert_eq!(q[(0, 0)], -1.0);
        assert_eq!(q[(1, 1)], -1.0);
        // slack diag: P3·1 − 2·P3·(−1) = 2 + 4
        assert_eq!(q[(2, 2)], 6.0);
        assert_eq!(q[(0, 1)], 2.0);
        assert_eq!(q[(0, 2)], -2.0);
        assert_eq!(q[(1, 2)], -2.0);
        assert!(q.is_symmetric());
    }

    #[test]
    fn test_penalty_is_zero_exactly_when_covered() {
        let mut g = CoverageGraph::new();
        for s in 0..3 {
            g.connect(sensor(s), point(0));
        }
        // isolate the constraint penalty
        let model = QuboEncoder::new(PenaltyWeights::new(0.0, 0.0, 1.0)).encode(&g).unwrap();
        let q = model.matrix();

        // energy + P3 (the dropped constant) is the squared residual
        for mask in 0u32..32 {
            let bits: Vec<bool> = (0..5).map(|k| mask >> k & 1 == 1).collect();
            let covered = bits[..3].iter().any(|b| *b);
            let best_for_sensors = (0u32..4)
                .map(|slack| {
                    let mut candidate = bits.clone();
                    candidate[3] = slack & 1 == 1;
                    candidate[4] = slack & 2 == 2;
                    q.energy(&candidate).unwrap() + 1.0
                })
                .fold(f64::INFINITY, f64::min);
            if covered {
                assert_eq!(best_for_sensors, 0.0, "bits {bits:?}");
            } else {
                assert!(best_for_sensors >= 1.0, "bits {bits:?}");
            }
        }
    }

    #[test]
    fn test_sole_coverer_gets_bias() {
        let mut g = CoverageGraph::new();
        g.connect(sensor(0), point(0));
        g.connect(sensor(0), point(1));
        g.connect(sensor(1), point(1));
        let weights = PenaltyWeights::new(1.0, 2.0, 2.0);
        let model = QuboEncoder::new(weights).encode(&g).unwrap();
        let q = model.matrix();

        assert_eq!(model.mandatory(), &[sensor(0)]);
        assert_eq!(q.size(), 3);
        // x0: P1 − P2, then p0 (−P3) and p1 (−P3)
        assert_eq!(q[(0, 0)], 1.0 - 2.0 - 2.0 - 2.0);
        // x1: P1, then p1 (−P3)
        assert_eq!(q[(1, 1)], 1.0 - 2.0);
    }

    #[test]
    fn test_uncovering_sensor_is_still_a_variable() {
        let mut g = CoverageGraph::new();
        g.connect(sensor(0), point(0));
        g.connect(sensor(1), point(0));
        g.add_sensor(sensor(2));
        let model = QuboEncoder::default().encode(&g).unwrap();

        assert_eq!(model.variables(), &[sensor(0), sensor(1), sensor(2)]);
        assert_eq!(model.matrix().size(), 4);
        assert_eq!(model.matrix()[(2, 2)], 1.0);
        assert!(model.matrix().row(2).iter().enumerate().all(|(j, v)| j == 2 || *v == 0.0));
    }

    #[test]
    fn test_empty_graph() {
        assert!(matches!(QuboEncoder::default().encode(&CoverageGraph::new()), Err(Error::EmptyGraph)));
    }

    #[test]
    fn test_uncovered_point_without_sensors_is_isolated() {
        let mut g = CoverageGraph::new();
        g.add_demand_point(point(0));
        let err = QuboEncoder::default().encode(&g).unwrap_err();
        assert!(matches!(err, Error::IsolatedDemandPoint(p) if p == point(0)));
    }

    #[test]
    fn test_isolated_point_fails() {
        let mut g = CoverageGraph::new();
        g.connect(sensor(0), point(0));
        g.add_demand_point(point(1));
        let err = QuboEncoder::default().encode(&g).unwrap_err();
        assert!(matches!(err, Error::IsolatedDemandPoint(p) if p == point(1)));
    }

    #[test]
    fn test_slack_groups_are_contiguous_in_point_order() {
        let mut g = CoverageGraph::new();
        // p0: degree 2 → 1 bit, p1: degree 3 → 2 bits, p2: degree 4 → 2 bits
        for s in 0..2 {
            g.connect(sensor(s), point(0));
        }
        for s in 0..3 {
            g.connect(sensor(s), point(1));
        }
        for s in 0..4 {
            g.connect(sensor(s), point(2));
        }
        let model = QuboEncoder::default().encode(&g).unwrap();
        let q = model.matrix();
        assert_eq!(q.size(), 4 + 1 + 2 + 2);

        // p0's slack bit (index 4) only interacts with x0, x1
        assert_eq!(q[(4, 0)], -2.0);
        assert_eq!(q[(4, 2)], 0.0);
        assert_eq!(q[(4, 5)], 0.0);
        // p1's second bit (index 6, weight 2) pairs with its first (index 5, weight 1)
        assert_eq!(q[(5, 6)], 2.0 * 1.0 * 2.0);
        // p2's bits start at 7
        assert_eq!(q[(7, 3)], -2.0);
        assert_eq!(q[(8, 3)], -4.0);
    }
}

//! Pipeline configuration.
//!
//! Penalty weights and reduction settings are explicit values handed to the
//! encoder and reducer; nothing here is process-wide.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ============================================================================
// Penalty weights
// ============================================================================

/// Coefficients of the QUBO objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    /// P1: cost of activating one sensor.
    pub activation: f64,
    /// P2: bias subtracted for a sensor that is some demand point's only
    /// remaining coverer.
    pub sole_coverer_bias: f64,
    /// P3: weight of each covering-constraint penalty.
    pub constraint: f64,
}

impl PenaltyWeights {
    pub fn new(activation: f64, sole_coverer_bias: f64, constraint: f64) -> Self {
        Self { activation, sole_coverer_bias, constraint }
    }

    pub fn validate(&self) -> Result<()> {
        let named = [
            ("activation", self.activation),
            ("sole_coverer_bias", self.sole_coverer_bias),
            ("constraint", self.constraint),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(Error::ConfigError(format!("penalty weight {name} must be finite, got {value}")));
            }
        }
        Ok(())
    }
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self { activation: 1.0, sole_coverer_bias: 2.0, constraint: 2.0 }
    }
}

// ============================================================================
// Reduction settings
// ============================================================================

/// How far the exact reductions run before encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMode {
    /// Encode the graph as given.
    None,
    /// One dominance pass followed by one propagation pass.
    #[default]
    SinglePass,
    /// Repeat dominance + propagation until a round changes nothing.
    FixedPoint,
}

/// Everything needed to go from a coverage graph to a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub weights: PenaltyWeights,
    pub reduction: ReductionMode,
    /// Run dominance pruning as part of each reduction round.
    pub dominance: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights: PenaltyWeights::default(),
            reduction: ReductionMode::default(),
            dominance: true,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        config.weights.validate()?;
        Ok(config)
    }

    pub fn with_weights(mut self, weights: PenaltyWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_reduction(mut self, reduction: ReductionMode) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_dominance(mut self, dominance: bool) -> Self {
        self.dominance = dominance;
        self
    }
}

//! Reading sampler output back into sensor activations.

use crate::model::{Sensor, Solution};
use crate::{Error, Result};

/// Maps a bit vector in matrix index order onto the free sensors.
///
/// Only the first `variables.len()` bits are read; slack bits never reach
/// the [`Solution`]. Forced sensors are not included either, see
/// [`ReductionState::merge_into`](crate::reduce::ReductionState::merge_into).
#[derive(Debug, Clone, Copy)]
pub struct SolutionDecoder<'a> {
    variables: &'a [Sensor],
    size: usize,
}

impl<'a> SolutionDecoder<'a> {
    /// `size` is the full matrix size, sensors plus slack bits.
    pub fn new(variables: &'a [Sensor], size: usize) -> Self {
        Self { variables, size }
    }

    pub fn decode(&self, sample: &[bool]) -> Result<Solution> {
        if sample.len() != self.size {
            return Err(Error::MalformedSample { expected: self.size, got: sample.len() });
        }
        Ok(self.variables.iter().copied().zip(sample.iter().copied()).collect())
    }

    /// The sensor prefix of a bit vector for `solution`; sensors it does not
    /// mention read as off.
    pub fn sensor_bits(&self, solution: &Solution) -> Vec<bool> {
        self.variables.iter().map(|s| solution.is_active(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sensors() -> Vec<Sensor> {
        (0..3).map(|i| Sensor::new(i as f64, 0.0, 0.0, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_slack_bits_are_dropped() {
        let vars = sensors();
        let decoder = SolutionDecoder::new(&vars, 5);
        let solution = decoder.decode(&[true, false, true, true, true]).unwrap();

        assert_eq!(solution.len(), 3);
        assert_eq!(solution.get(&vars[0]), Some(true));
        assert_eq!(solution.get(&vars[1]), Some(false));
        assert_eq!(solution.get(&vars[2]), Some(true));
        assert_eq!(decoder.sensor_bits(&solution), vec![true, false, true]);
    }

    #[test]
    fn test_length_mismatch() {
        let vars = sensors();
        let decoder = SolutionDecoder::new(&vars, 5);
        assert!(matches!(
            decoder.decode(&[true, false, true]),
            Err(Error::MalformedSample { expected: 5, got: 3 })
        ));
        assert!(decoder.decode(&[false; 6]).is_err());
    }
}

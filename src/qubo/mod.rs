//! # QUBO Encoding
//!
//! The dense objective matrix, the encoder that fills it from a reduced
//! coverage graph, and the decoder that reads samples back.
//!
//! ## Index space
//!
//! ```text
//! 0 .. S-1                  free sensors, ascending node id
//! S .. S+b(p0)-1            slack bits of the first demand point
//! S+b(p0) .. ...            slack bits of the next demand point, and so on
//! ```

pub mod decoder;
pub mod encoder;

use std::ops::Index;

use crate::{Error, Result};

pub use decoder::SolutionDecoder;
pub use encoder::{slack_bits, QuboEncoder, QuboModel};

// ============================================================================
// QuboMatrix
// ============================================================================

/// Square, symmetric objective matrix `Q`; a sampler minimizes `xᵗQx`.
///
/// Stored dense and row-major. Read-only once the encoder hands it out, so
/// a shared reference can be given to any number of concurrent samplers.
#[derive(Debug, Clone, PartialEq)]
pub struct QuboMatrix {
    size: usize,
    data: Vec<f64>,
}

impl QuboMatrix {
    /// An all-zero `size × size` matrix.
    pub fn zeros(size: usize) -> Self {
        Self { size, data: vec![0.0; size * size] }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.size && j < self.size {
            Some(self.data[i * self.size + j])
        } else {
            None
        }
    }

    pub(crate) fn add(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.size + j] += value;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics
        self.data.chunks_exact(self.size.max(1)).take(self.size)
    }

    /// Row-major backing storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (i + 1..self.size).all(|j| self[(i, j)] == self[(j, i)]))
    }

    /// `xᵗQx` for a bit vector of matching length.
    pub fn energy(&self, bits: &[bool]) -> Result<f64> {
        if bits.len() != self.size {
            return Err(Error::MalformedSample { expected: self.size, got: bits.len() });
        }
        let mut energy = 0.0;
        for (i, row) in self.rows().enumerate() {
            if !bits[i] {
                continue;
            }
            energy += row
                .iter()
                .zip(bits)
                .filter(|(_, b)| **b)
                .map(|(q, _)| *q)
                .sum::<f64>();
        }
        Ok(energy)
    }

    /// Non-zero coefficients as `(i, j, value)` with `i <= j`, off-diagonal
    /// pairs folded together: the sparse form annealing samplers take.
    pub fn upper_triangle(&self) -> Vec<(usize, usize, f64)> {
        let mut entries = Vec::new();
        for i in 0..self.size {
            let diagonal = self[(i, i)];
            if diagonal != 0.0 {
                entries.push((i, i, diagonal));
            }
            for j in i + 1..self.size {
                let value = self[(i, j)] + self[(j, i)];
                if value != 0.0 {
                    entries.push((i, j, value));
                }
            }
        }
        entries
    }
}

impl Index<(usize, usize)> for QuboMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(i < self.size && j < self.size, "index ({i}, {j}) out of bounds for size {}", self.size);
        &self.data[i * self.size + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_by_two() -> QuboMatrix {
        let mut q = QuboMatrix::zeros(2);
        q.add(0, 0, -1.0);
        q.add(1, 1, -1.0);
        q.add(0, 1, 1.5);
        q.add(1, 0, 1.5);
        q
    }

    #[test]
    fn test_energy() {
        let q = two_by_two();
        assert_eq!(q.energy(&[false, false]).unwrap(), 0.0);
        assert_eq!(q.energy(&[true, false]).unwrap(), -1.0);
        assert_eq!(q.energy(&[true, true]).unwrap(), 1.0);
    }

    #[test]
    fn test_energy_length_mismatch() {
        let q = two_by_two();
        assert!(matches!(
            q.energy(&[true]),
            Err(Error::MalformedSample { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_upper_triangle_folds_pairs() {
        let q = two_by_two();
        assert_eq!(q.upper_triangle(), vec![(0, 0, -1.0), (0, 1, 3.0), (1, 1, -1.0)]);
    }

    #[test]
    fn test_empty_matrix() {
        let q = QuboMatrix::zeros(0);
        assert!(q.is_empty());
        assert_eq!(q.rows().count(), 0);
        assert_eq!(q.energy(&[]).unwrap(), 0.0);
        assert!(q.is_symmetric());
    }

    #[test]
    fn test_get_out_of_range() {
        let q = two_by_two();
        assert_eq!(q.get(0, 1), Some(1.5));
        assert_eq!(q.get(2, 0), None);
    }
}

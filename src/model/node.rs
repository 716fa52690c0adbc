//! Node identities of the coverage graph.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Opaque node identifier: a stable slot index in the graph arena.
///
/// Ids are never reused, so an id taken before a removal keeps pointing at
/// the same (now tombstoned) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the bipartite graph a node lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Sensor,
    DemandPoint,
}

/// Bit pattern used for identity: `-0.0` and `0.0` collapse, every NaN is one NaN.
#[inline]
fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

macro_rules! float_identity {
    ($ty:ident) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.0
                    .iter()
                    .zip(other.0.iter())
                    .all(|(a, b)| canonical_bits(*a) == canonical_bits(*b))
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                for v in self.0 {
                    canonical_bits(v).hash(state);
                }
            }
        }
    };
}

/// A candidate lidar placement: `(x, y, z, pan, tilt)`.
///
/// The fields are opaque to the reduction and encoding code; only equality
/// and hashing matter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sensor(pub [f64; 5]);

float_identity!(Sensor);

impl Sensor {
    pub fn new(x: f64, y: f64, z: f64, pan: f64, tilt: f64) -> Self {
        Self([x, y, z, pan, tilt])
    }

    /// Decision-variable name, e.g. `x_0.0_0.5_2.5_0.0_-10.0`.
    ///
    /// Whole numbers keep one decimal and non-finite values read `nan`,
    /// `inf`, `-inf`. Values that would need an exponent are written out in
    /// full (`1e16` becomes `10000000000000000`).
    pub fn variable_name(&self) -> String {
        self.to_string()
    }
}

/// One coordinate of a variable name.
struct Coordinate(f64);

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            f.write_str("nan")
        } else if v.is_infinite() {
            f.write_str(if v > 0.0 { "inf" } else { "-inf" })
        } else if v.fract() == 0.0 && v.abs() < 1e16 {
            write!(f, "{v:.1}")
        } else {
            write!(f, "{v}")
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("x")?;
        for v in self.0 {
            write!(f, "_{}", Coordinate(v))?;
        }
        Ok(())
    }
}

/// A street point that must be observed by at least one active sensor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DemandPoint(pub [f64; 3]);

float_identity!(DemandPoint);

impl DemandPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }
}

impl fmt::Display for DemandPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.0;
        write!(f, "({x}, {y}, {z})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    #[test]
    fn test_signed_zero_is_one_identity() {
        let a = Sensor::new(0.0, 1.0, 2.5, 0.0, -10.0);
        let b = Sensor::new(-0.0, 1.0, 2.5, 0.0, -10.0);
        assert_eq!(a, b);

        let set: HashSet<Sensor> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_distinct_fields_differ() {
        assert_ne!(DemandPoint::new(1.0, 2.0, 0.0), DemandPoint::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_variable_name() {
        let s = Sensor::new(0.0, 0.5, 2.5, 0.0, -10.0);
        assert_eq!(s.variable_name(), "x_0.0_0.5_2.5_0.0_-10.0");
    }

    #[test]
    fn test_variable_name_special_values() {
        let s = Sensor::new(-0.0, 0.1, f64::NAN, f64::NEG_INFINITY, 12.25);
        assert_eq!(s.variable_name(), "x_-0.0_0.1_nan_-inf_12.25");
    }
}

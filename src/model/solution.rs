//! Solution: sensor activations read back from a sample.

use hashbrown::HashMap;

use super::Sensor;

/// Mapping from sensor identity to its activation.
///
/// A solution decoded from a sample only covers the sensors that were still
/// free variables; merging the reduction decisions extends it to the full
/// sensor universe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    values: HashMap<Sensor, bool>,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a sensor's activation, returning the previous value if any.
    pub fn insert(&mut self, sensor: Sensor, active: bool) -> Option<bool> {
        self.values.insert(sensor, active)
    }

    pub fn get(&self, sensor: &Sensor) -> Option<bool> {
        self.values.get(sensor).copied()
    }

    pub fn is_active(&self, sensor: &Sensor) -> bool {
        self.get(sensor).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Sensor, bool)> {
        self.values.iter().map(|(s, v)| (s, *v))
    }

    /// Sensors switched on in this solution.
    pub fn active(&self) -> impl Iterator<Item = &Sensor> {
        self.values.iter().filter(|(_, v)| **v).map(|(s, _)| s)
    }

    pub fn active_count(&self) -> usize {
        self.values.values().filter(|v| **v).count()
    }

    /// The assignment keyed by variable name, sorted by name.
    pub fn named(&self) -> Vec<(String, bool)> {
        let mut named: Vec<(String, bool)> = self
            .values
            .iter()
            .map(|(s, v)| (s.variable_name(), *v))
            .collect();
        named.sort();
        named
    }
}

impl FromIterator<(Sensor, bool)> for Solution {
    fn from_iter<I: IntoIterator<Item = (Sensor, bool)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

impl Extend<(Sensor, bool)> for Solution {
    fn extend<I: IntoIterator<Item = (Sensor, bool)>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

//! # Coverage Graph
//!
//! Bipartite adjacency structure between [`Sensor`] and [`DemandPoint`] nodes.
//! An edge means "this sensor observes this demand point".
//!
//! Nodes live in an arena of stable [`NodeId`] slots. Removing a node
//! tombstones its slot and purges it from every neighbor's adjacency set in
//! the same call, so ids taken before a removal stay valid to test with
//! [`CoverageGraph::contains`] and never alias a different node.
//!
//! ## Limitations
//!
//! - **Single writer**: reductions mutate the graph in place through
//!   `&mut self`; there is no interior locking.
//! - **No edge removal**: edges only disappear together with one of their
//!   endpoints.

use hashbrown::{HashMap, HashSet};

use crate::model::*;
use crate::{Error, Result};

// ============================================================================
// Arena slots
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NodeKey {
    Sensor(Sensor),
    DemandPoint(DemandPoint),
}

impl NodeKey {
    fn kind(&self) -> NodeKind {
        match self {
            NodeKey::Sensor(_) => NodeKind::Sensor,
            NodeKey::DemandPoint(_) => NodeKind::DemandPoint,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    key: NodeKey,
    adjacency: HashSet<NodeId>,
}

// ============================================================================
// CoverageGraph
// ============================================================================

/// Undirected bipartite sensor / demand-point graph.
#[derive(Debug, Clone, Default)]
pub struct CoverageGraph {
    /// `None` marks a removed node.
    slots: Vec<Option<Slot>>,
    /// identity → live node id
    index: HashMap<NodeKey, NodeId>,
    sensor_count: usize,
    demand_point_count: usize,
    edge_count: usize,
}

impl CoverageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Insert a sensor, or return the id it already has.
    pub fn add_sensor(&mut self, sensor: Sensor) -> NodeId {
        self.insert(NodeKey::Sensor(sensor))
    }

    /// Insert a demand point, or return the id it already has.
    pub fn add_demand_point(&mut self, point: DemandPoint) -> NodeId {
        self.insert(NodeKey::DemandPoint(point))
    }

    fn insert(&mut self, key: NodeKey) -> NodeId {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(Slot { key, adjacency: HashSet::new() }));
        self.index.insert(key, id);
        match key.kind() {
            NodeKind::Sensor => self.sensor_count += 1,
            NodeKind::DemandPoint => self.demand_point_count += 1,
        }
        id
    }

    /// Record that `sensor` observes `point`. Adding an existing edge is a no-op.
    pub fn add_coverage(&mut self, sensor: NodeId, point: NodeId) -> Result<()> {
        let sensor_kind = self.slot(sensor).map(|s| s.key.kind());
        let point_kind = self.slot(point).map(|s| s.key.kind());
        match (sensor_kind, point_kind) {
            (Ok(NodeKind::Sensor), Ok(NodeKind::DemandPoint)) => {}
            (Err(_), _) => {
                return Err(Error::InvalidEdge(format!("source node {sensor} does not exist")));
            }
            (_, Err(_)) => {
                return Err(Error::InvalidEdge(format!("target node {point} does not exist")));
            }
            (Ok(a), Ok(b)) => {
                return Err(Error::InvalidEdge(format!(
                    "edges must join a sensor to a demand point, got {a:?} {sensor} -> {b:?} {point}"
                )));
            }
        }

        self.link(sensor, point);
        Ok(())
    }

    /// Insert both endpoints if needed and join them.
    pub fn connect(&mut self, sensor: Sensor, point: DemandPoint) -> (NodeId, NodeId) {
        let s = self.add_sensor(sensor);
        let p = self.add_demand_point(point);
        self.link(s, p);
        (s, p)
    }

    fn link(&mut self, sensor: NodeId, point: NodeId) {
        let inserted = match self.slots.get_mut(sensor.index()) {
            Some(Some(slot)) => slot.adjacency.insert(point),
            _ => false,
        };
        if inserted {
            if let Some(Some(slot)) = self.slots.get_mut(point.index()) {
                slot.adjacency.insert(sensor);
            }
            self.edge_count += 1;
        }
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Delete a sensor node and all of its incident edges.
    pub fn remove_sensor(&mut self, id: NodeId) -> Result<Sensor> {
        let key = self.slot(id)?.key;
        match key {
            NodeKey::Sensor(sensor) => {
                self.remove(id)?;
                Ok(sensor)
            }
            NodeKey::DemandPoint(_) => Err(Error::NotFound(format!("Sensor {id}"))),
        }
    }

    /// Delete a demand point node and all of its incident edges.
    pub fn remove_demand_point(&mut self, id: NodeId) -> Result<DemandPoint> {
        let key = self.slot(id)?.key;
        match key {
            NodeKey::DemandPoint(point) => {
                self.remove(id)?;
                Ok(point)
            }
            NodeKey::Sensor(_) => Err(Error::NotFound(format!("Demand point {id}"))),
        }
    }

    fn remove(&mut self, id: NodeId) -> Result<()> {
        let slot = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| Error::NotFound(format!("Node {id}")))?;

        for neighbor in &slot.adjacency {
            if let Some(Some(other)) = self.slots.get_mut(neighbor.index()) {
                other.adjacency.remove(&id);
            }
        }
        self.edge_count -= slot.adjacency.len();
        self.index.remove(&slot.key);
        match slot.key.kind() {
            NodeKind::Sensor => self.sensor_count -= 1,
            NodeKind::DemandPoint => self.demand_point_count -= 1,
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::NotFound(format!("Node {id}")))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_ok()
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind> {
        Ok(self.slot(id)?.key.kind())
    }

    /// The current adjacency set of a node.
    pub fn neighbors(&self, id: NodeId) -> Result<&HashSet<NodeId>> {
        Ok(&self.slot(id)?.adjacency)
    }

    /// Neighbors in ascending id order.
    pub fn sorted_neighbors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut ids: Vec<NodeId> = self.neighbors(id)?.iter().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Number of current neighbors; for a demand point, how many sensors can still cover it.
    pub fn degree(&self, id: NodeId) -> Result<usize> {
        Ok(self.slot(id)?.adjacency.len())
    }

    pub fn sensor(&self, id: NodeId) -> Result<Sensor> {
        match self.slot(id)?.key {
            NodeKey::Sensor(sensor) => Ok(sensor),
            NodeKey::DemandPoint(_) => Err(Error::NotFound(format!("Sensor {id}"))),
        }
    }

    pub fn demand_point(&self, id: NodeId) -> Result<DemandPoint> {
        match self.slot(id)?.key {
            NodeKey::DemandPoint(point) => Ok(point),
            NodeKey::Sensor(_) => Err(Error::NotFound(format!("Demand point {id}"))),
        }
    }

    pub fn sensor_id(&self, sensor: &Sensor) -> Option<NodeId> {
        self.index.get(&NodeKey::Sensor(*sensor)).copied()
    }

    pub fn demand_point_id(&self, point: &DemandPoint) -> Option<NodeId> {
        self.index.get(&NodeKey::DemandPoint(*point)).copied()
    }

    fn live(&self, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(move |(i, slot)| match slot {
            Some(slot) if slot.key.kind() == kind => Some(NodeId(i as u32)),
            _ => None,
        })
    }

    /// Live sensor ids in ascending (insertion) order.
    pub fn sensors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.live(NodeKind::Sensor)
    }

    /// Live demand point ids in ascending (insertion) order.
    pub fn demand_points(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.live(NodeKind::DemandPoint)
    }

    pub fn sensor_count(&self) -> usize {
        self.sensor_count
    }

    pub fn demand_point_count(&self) -> usize {
        self.demand_point_count
    }

    pub fn node_count(&self) -> usize {
        self.sensor_count + self.demand_point_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Demand points no sensor can cover, in id order.
    ///
    /// Reporting only: isolated points are never removed here.
    pub fn isolated_demand_points(&self) -> Vec<NodeId> {
        self.demand_points()
            .filter(|id| self.degree(*id).map_or(false, |d| d == 0))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

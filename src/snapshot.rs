//! Fixed comparison slots for before/after inspection.

use log::info;
use nalgebra::{Point3, Vector3};

use crate::error::{EditorError, Result};

/// Number of snapshot slots.
pub const SNAPSHOT_SLOTS: usize = 3;

/// What a snapshot's positions describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// 3D mesh vertex positions.
    Mesh,
    /// UV positions per soup vertex, lifted to `z = 0`.
    Uv,
}

/// A saved view state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// What `positions` holds.
    pub source: SnapshotSource,
    /// Saved positions.
    pub positions: Vec<Point3<f64>>,
    /// Camera zoom (orbit distance) at save time.
    pub camera_zoom: f64,
    /// Mesh vertex normals at save time. Empty for UV snapshots.
    pub normals: Vec<Vector3<f64>>,
}

/// Three slots, overwritten only by an explicit save.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    slots: [Option<Snapshot>; SNAPSHOT_SLOTS],
}

fn check(slot: usize) -> Result<()> {
    if slot < SNAPSHOT_SLOTS {
        Ok(())
    } else {
        Err(EditorError::InvalidSnapshotSlot { slot })
    }
}

impl SnapshotStore {
    /// Create a store with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Save into `slot`, replacing whatever it held.
    pub fn save(&mut self, slot: usize, snapshot: Snapshot) -> Result<()> {
        check(slot)?;
        info!("saved snapshot {} ({} positions)", slot, snapshot.positions.len());
        self.slots[slot] = Some(snapshot);
        Ok(())
    }

    /// The snapshot in `slot`, if one was saved.
    pub fn get(&self, slot: usize) -> Result<Option<&Snapshot>> {
        check(slot)?;
        Ok(self.slots[slot].as_ref())
    }

    /// Whether `slot` holds a snapshot. Out-of-range slots are empty.
    pub fn is_occupied(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(Option::is_some)
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(zoom: f64) -> Snapshot {
        Snapshot {
            source: SnapshotSource::Mesh,
            positions: vec![Point3::new(zoom, 0.0, 0.0)],
            camera_zoom: zoom,
            normals: vec![Vector3::z()],
        }
    }

    #[test]
    fn test_save_overwrites_slot() {
        let mut store = SnapshotStore::new();
        store.save(1, snapshot(2.0)).unwrap();
        store.save(1, snapshot(5.0)).unwrap();
        assert_eq!(store.get(1).unwrap().map(|s| s.camera_zoom), Some(5.0));
        assert!(!store.is_occupied(0));
        assert!(store.is_occupied(1));
    }

    #[test]
    fn test_slot_range() {
        let mut store = SnapshotStore::new();
        assert!(matches!(
            store.save(3, snapshot(1.0)),
            Err(EditorError::InvalidSnapshotSlot { slot: 3 })
        ));
        assert!(store.get(7).is_err());
        assert!(!store.is_occupied(3));
        assert_eq!(store.get(2).unwrap(), None);
    }
}

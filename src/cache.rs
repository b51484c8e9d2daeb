//! Per-optimizer memo of pairwise great-circle distances.
//!
//! Keys are unordered pairs of point slots, stored once as `(min, max)`. The
//! table is shared by the parallel tour builders; a racing insert of the same
//! pair writes the same value, so readers never observe a wrong distance.

use std::sync::{PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::haversine::{haversine_km, Coordinates};

/// Index of a point within the optimizer's point table.
pub type PointSlot = usize;

#[derive(Debug, Default)]
pub struct DistanceCache {
    entries: RwLock<FxHashMap<(PointSlot, PointSlot), f64>>,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: PointSlot, b: PointSlot) -> (PointSlot, PointSlot) {
        if a <= b { (a, b) } else { (b, a) }
    }

    /// Distance between two slots, computing and storing it on a miss.
    pub fn distance(&self, a: PointSlot, b: PointSlot, coords: &[Coordinates]) -> f64 {
        if a == b {
            return 0.0;
        }
        let key = Self::key(a, b);

        if let Some(km) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return *km;
        }

        let km = haversine_km(coords[key.0], coords[key.1]);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, km);
        km
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Storage seam for the routing engine.
//!
//! The engine never talks to a database. Callers load candidate points
//! through a [`PointStore`] and hand the resulting list to the optimizer.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::haversine::{haversine_km, Coordinates};
use crate::point::{CrewType, MaintenancePoint, PointStatus, Priority};

/// Query over stored points. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointFilter {
    pub crew: Option<CrewType>,
    pub priority: Option<Priority>,
    pub status: Option<PointStatus>,
    pub neighborhood: Option<String>,
    /// Only points within `radius_km` of this location.
    pub near: Option<(Coordinates, f64)>,
    pub limit: Option<usize>,
}

impl PointFilter {
    /// Open points of one crew type; what route planning fetches by default.
    pub fn open_for(crew: CrewType) -> Self {
        Self {
            crew: Some(crew),
            status: Some(PointStatus::Open),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn in_neighborhood(mut self, neighborhood: impl Into<String>) -> Self {
        self.neighborhood = Some(neighborhood.into());
        self
    }

    pub fn within(mut self, center: Coordinates, radius_km: f64) -> Self {
        self.near = Some((center, radius_km));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `point` passes every set criterion except `limit`.
    pub fn matches(&self, point: &MaintenancePoint) -> bool {
        self.crew.is_none_or(|c| point.team_type == c)
            && self.priority.is_none_or(|p| point.priority == p)
            && self.status.is_none_or(|s| point.status == s)
            && self
                .neighborhood
                .as_deref()
                .is_none_or(|n| point.neighborhood == n)
            && self
                .near
                .is_none_or(|(center, km)| haversine_km(center, point.coordinates()) <= km)
    }
}

/// Source of maintenance points.
///
/// Implementations may be backed by anything; the engine only needs
/// filtered fetches and lookups by id.
pub trait PointStore {
    /// Points matching `filter`, most urgent priority first.
    fn fetch(&self, filter: &PointFilter) -> Result<Vec<MaintenancePoint>>;

    /// Points with the given ids, in request order. Unknown ids are skipped.
    fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<MaintenancePoint>>;
}

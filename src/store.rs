//! In-memory point store and the route request flow on top of it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::haversine::Coordinates;
use crate::optimizer::{OptimizeOptions, RouteOptimizer, RouteResult};
use crate::point::{CrewType, MaintenancePoint};
use crate::traits::{PointFilter, PointStore};

/// Candidates fetched for a route when no explicit ids are given.
pub const DEFAULT_FETCH_LIMIT: usize = 500;

/// Vec-backed store. Ids are assigned on insert when a point has none.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    points: Vec<MaintenancePoint>,
    by_id: HashMap<String, usize>,
    next_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from already loaded points, e.g. a JSON point file.
    pub fn from_points<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = MaintenancePoint>,
    {
        let mut store = Self::new();
        for point in points {
            store.insert(point)?;
        }
        Ok(store)
    }

    /// Stores `point` and returns its id.
    pub fn insert(&mut self, mut point: MaintenancePoint) -> Result<String> {
        point.validate()?;
        let id = match point.id.clone() {
            Some(id) => {
                if self.by_id.contains_key(&id) {
                    return Err(Error::store(format!("duplicate point id '{id}'")));
                }
                id
            }
            None => loop {
                self.next_id += 1;
                let candidate = format!("pt-{:06}", self.next_id);
                if !self.by_id.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        point.id = Some(id.clone());
        self.by_id.insert(id.clone(), self.points.len());
        self.points.push(point);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<&MaintenancePoint> {
        self.by_id.get(id).map(|&idx| &self.points[idx])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl PointStore for InMemoryStore {
    fn fetch(&self, filter: &PointFilter) -> Result<Vec<MaintenancePoint>> {
        let mut found: Vec<MaintenancePoint> = self
            .points
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        found.sort_by_key(|p| std::cmp::Reverse(p.priority.ordinal()));
        if let Some(limit) = filter.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<MaintenancePoint>> {
        Ok(ids.iter().filter_map(|id| self.get(id)).cloned().collect())
    }
}

/// A request for one crew's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub team_type: CrewType,
    #[serde(default = "default_max_hours")]
    pub max_hours: u32,
    /// Explicit candidate set. Replaces the crew/status query when present.
    #[serde(default)]
    pub point_ids: Option<Vec<String>>,
    #[serde(default)]
    pub start: Option<Coordinates>,
}

fn default_max_hours() -> u32 {
    8
}

impl RouteRequest {
    pub fn new(team_type: CrewType) -> Self {
        Self {
            team_type,
            max_hours: default_max_hours(),
            point_ids: None,
            start: None,
        }
    }

    pub fn with_point_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.point_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn starting_at(mut self, start: Coordinates) -> Self {
        self.start = Some(start);
        self
    }
}

/// Loads the candidates for `request` from `store` and optimizes them.
///
/// `options.max_hours` is replaced by the request's value.
pub fn plan_route<S>(store: &S, request: &RouteRequest, options: &OptimizeOptions) -> Result<RouteResult>
where
    S: PointStore + ?Sized,
{
    let candidates = match &request.point_ids {
        Some(ids) => {
            let found = store.fetch_by_ids(ids)?;
            if found.len() < ids.len() {
                tracing::warn!(
                    requested = ids.len(),
                    found = found.len(),
                    "some requested point ids were not found"
                );
            }
            found
        }
        None => store.fetch(
            &PointFilter::open_for(request.team_type).with_limit(DEFAULT_FETCH_LIMIT),
        )?,
    };

    let options = options.clone().with_max_hours(request.max_hours);
    RouteOptimizer::new(candidates).optimize_route(request.team_type, &options, request.start)
}

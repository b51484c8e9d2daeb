//! Single-crew route optimization.
//!
//! Pipeline: filter by crew type, select what fits the shift, cluster the
//! selection, build per-cluster tours in parallel, sequence clusters along
//! their spanning tree, then refine the whole cyclic tour with 2-opt.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::cache::{DistanceCache, PointSlot};
use crate::cluster::{build_cluster_tours, density_clusters, sequence_clusters};
use crate::error::{Error, Result};
use crate::haversine::Coordinates;
use crate::point::{CrewType, MaintenancePoint, Priority};
use crate::refine::{tour_length, two_opt};
use crate::selector::{group_by_priority, select_points, STOP_OVERHEAD_MINUTES};

/// Longest shift accepted, in hours.
pub const MAX_SHIFT_HOURS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeOptions {
    /// Shift length; the selection budget is `max_hours * 60` minutes.
    pub max_hours: u32,
    /// Threads used to build cluster tours.
    pub workers: usize,
    /// Neighborhood radius of the density clustering.
    pub cluster_radius_km: f64,
    /// Points (including itself) a point needs within the radius to seed a cluster.
    pub min_cluster_size: usize,
    /// Allowance added to each selected stop.
    pub selection_overhead_minutes: u32,
    /// Upper bound on full 2-opt passes.
    pub max_two_opt_passes: usize,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            max_hours: 8,
            workers: 4,
            cluster_radius_km: 1.11,
            min_cluster_size: 2,
            selection_overhead_minutes: STOP_OVERHEAD_MINUTES,
            max_two_opt_passes: 1000,
        }
    }
}

impl OptimizeOptions {
    pub fn with_max_hours(mut self, hours: u32) -> Self {
        self.max_hours = hours;
        self
    }

    pub fn budget_minutes(&self) -> u32 {
        self.max_hours.saturating_mul(60)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SHIFT_HOURS).contains(&self.max_hours) {
            return Err(Error::invalid_input(format!(
                "max hours must be between 1 and {MAX_SHIFT_HOURS}, got {}",
                self.max_hours
            )));
        }
        if self.workers == 0 {
            return Err(Error::invalid_input("workers must be at least 1"));
        }
        if self.min_cluster_size == 0 {
            return Err(Error::invalid_input("min cluster size must be at least 1"));
        }
        if self.cluster_radius_km.is_nan() || self.cluster_radius_km <= 0.0 {
            return Err(Error::invalid_input("cluster radius must be positive"));
        }
        Ok(())
    }
}

/// An ordered route for one crew type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub route: Vec<MaintenancePoint>,
    /// Closed-tour length in km, including the edge back to the first stop.
    pub total_distance: f64,
    /// Sum of service durations in minutes.
    pub total_time: u32,
    pub team_type: CrewType,
    pub statistics: BTreeMap<&'static str, usize>,
}

impl RouteResult {
    pub fn empty(team_type: CrewType) -> Self {
        Self {
            route: Vec::new(),
            total_distance: 0.0,
            total_time: 0,
            team_type,
            statistics: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }
}

/// Count statistics for a route; empty routes yield an empty map.
pub fn route_statistics(route: &[MaintenancePoint]) -> BTreeMap<&'static str, usize> {
    let mut stats = BTreeMap::new();
    if route.is_empty() {
        return stats;
    }

    let count = |pred: fn(&MaintenancePoint) -> bool| route.iter().filter(|p| pred(p)).count();

    stats.insert("total_points", route.len());
    stats.insert("emergencies", count(|p| p.priority == Priority::Emergency));
    stats.insert("urgent", count(|p| p.priority == Priority::Urgent));
    stats.insert(
        "complaints_resolved",
        route.iter().map(|p| p.complaints_count as usize).sum(),
    );
    stats.insert("main_roads", count(|p| p.main_road));
    stats.insert("critical_locations", count(|p| p.near_critical));
    stats.insert(
        "neighborhoods",
        route
            .iter()
            .map(|p| p.neighborhood.as_str())
            .collect::<HashSet<_>>()
            .len(),
    );
    stats.insert("road_blocks_needed", count(|p| p.requires_road_block));
    stats
}

/// Route optimizer over a fixed candidate set.
///
/// Holds the candidate points and a distance memo that lives as long as the
/// optimizer, so repeated calls for different crews reuse distances.
#[derive(Debug)]
pub struct RouteOptimizer {
    points: Vec<MaintenancePoint>,
    coords: Vec<Coordinates>,
    cache: DistanceCache,
}

impl RouteOptimizer {
    pub fn new(points: Vec<MaintenancePoint>) -> Self {
        let coords = points.iter().map(MaintenancePoint::coordinates).collect();
        Self {
            points,
            coords,
            cache: DistanceCache::new(),
        }
    }

    pub fn points(&self) -> &[MaintenancePoint] {
        &self.points
    }

    /// Number of memoized point pairs.
    pub fn cached_distances(&self) -> usize {
        self.cache.len()
    }

    fn distance(&self, a: PointSlot, b: PointSlot) -> f64 {
        self.cache.distance(a, b, &self.coords)
    }

    /// Builds the route for `team_type` within `options.max_hours`.
    ///
    /// `start`, when given, picks the first cluster: the one whose centroid
    /// is nearest to it.
    pub fn optimize_route(
        &self,
        team_type: CrewType,
        options: &OptimizeOptions,
        start: Option<Coordinates>,
    ) -> Result<RouteResult> {
        options.validate()?;

        let candidates: Vec<PointSlot> = (0..self.points.len())
            .filter(|&i| self.points[i].team_type == team_type)
            .collect();
        if candidates.is_empty() {
            tracing::info!(crew_type = %team_type, "no points for crew type");
            return Ok(RouteResult::empty(team_type));
        }

        let groups = group_by_priority(&self.points, &candidates);
        let selected = select_points(
            &self.points,
            &groups,
            options.budget_minutes(),
            options.selection_overhead_minutes,
        );

        let route = if selected.len() <= 1 {
            selected
        } else {
            self.build_route(&selected, options, start)?
        };

        let total_distance = tour_length(&route, |a, b| self.distance(a, b));
        let route: Vec<MaintenancePoint> = route.into_iter().map(|i| self.points[i].clone()).collect();
        let total_time = route.iter().map(|p| p.estimated_time).sum();
        let statistics = route_statistics(&route);

        tracing::info!(
            crew_type = %team_type,
            candidates = candidates.len(),
            stops = route.len(),
            total_km = total_distance,
            total_minutes = total_time,
            "optimized route"
        );

        Ok(RouteResult {
            route,
            total_distance,
            total_time,
            team_type,
            statistics,
        })
    }

    fn build_route(
        &self,
        selected: &[PointSlot],
        options: &OptimizeOptions,
        start: Option<Coordinates>,
    ) -> Result<Vec<PointSlot>> {
        let clusters = density_clusters(
            selected,
            &self.coords,
            options.cluster_radius_km,
            options.min_cluster_size,
        );
        let tours = build_cluster_tours(&clusters, &self.coords, &self.cache, options.workers)?;
        let mut route = sequence_clusters(tours, &self.coords, start);

        let stats = two_opt(&mut route, options.max_two_opt_passes, |a, b| self.distance(a, b));
        tracing::debug!(
            clusters = clusters.len(),
            passes = stats.passes,
            moves = stats.moves,
            "refined route"
        );
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::ProblemCategory;

    fn point(id: &str, lat: f64, lng: f64, priority: Priority, crew: CrewType, minutes: u32) -> MaintenancePoint {
        MaintenancePoint::new(lat, lng, format!("Rua {id}"), ProblemCategory::Pothole, priority, crew, minutes)
            .with_id(id)
            .with_location_names("Centro", "Centro")
    }

    #[test]
    fn options_default_and_json_override() {
        let options = OptimizeOptions::from_json_str(r#"{ "max_hours": 6, "workers": 2 }"#).unwrap();
        assert_eq!(options.max_hours, 6);
        assert_eq!(options.workers, 2);
        assert_eq!(options.min_cluster_size, 2);
        assert_eq!(options.budget_minutes(), 360);
    }

    #[test]
    fn options_reject_out_of_range_hours() {
        assert!(OptimizeOptions::default().with_max_hours(0).validate().is_err());
        assert!(OptimizeOptions::default().with_max_hours(13).validate().is_err());
        assert!(OptimizeOptions::default().with_max_hours(12).validate().is_ok());
    }

    #[test]
    fn statistics_count_flags() {
        let route = vec![
            point("1", 0.0, 0.0, Priority::Emergency, CrewType::Asphalt, 10)
                .with_complaints(4)
                .on_main_road(),
            point("2", 0.0, 0.0, Priority::Urgent, CrewType::Asphalt, 10)
                .near_critical_facility()
                .requiring_road_block()
                .with_complaints(1),
        ];
        let stats = route_statistics(&route);
        assert_eq!(stats["total_points"], 2);
        assert_eq!(stats["emergencies"], 1);
        assert_eq!(stats["urgent"], 1);
        assert_eq!(stats["complaints_resolved"], 5);
        assert_eq!(stats["main_roads"], 1);
        assert_eq!(stats["critical_locations"], 1);
        assert_eq!(stats["neighborhoods"], 1);
        assert_eq!(stats["road_blocks_needed"], 1);
        assert!(route_statistics(&[]).is_empty());
    }

    #[test]
    fn other_crews_yield_empty_result() {
        let optimizer = RouteOptimizer::new(vec![point(
            "1",
            -10.96,
            -37.05,
            Priority::High,
            CrewType::Electrical,
            30,
        )]);
        let result = optimizer
            .optimize_route(CrewType::Asphalt, &OptimizeOptions::default(), None)
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.total_distance, 0.0);
        assert_eq!(result.total_time, 0);
        assert!(result.statistics.is_empty());
    }

    #[test]
    fn memo_is_reused_across_calls() {
        let optimizer = RouteOptimizer::new(vec![
            point("1", -10.9650, -37.0570, Priority::High, CrewType::Asphalt, 30),
            point("2", -10.9660, -37.0580, Priority::High, CrewType::Asphalt, 30),
            point("3", -10.9700, -37.0600, Priority::Low, CrewType::Asphalt, 30),
        ]);
        let options = OptimizeOptions::default();
        let first = optimizer.optimize_route(CrewType::Asphalt, &options, None).unwrap();
        let cached = optimizer.cached_distances();
        assert!(cached > 0);
        let second = optimizer.optimize_route(CrewType::Asphalt, &options, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(optimizer.cached_distances(), cached);
    }
}

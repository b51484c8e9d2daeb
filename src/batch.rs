//! Splitting a point set into work batches.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::haversine::Coordinates;
use crate::point::{MaintenancePoint, Priority};

const KMEANS_SEED: u64 = 42;
const KMEANS_MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStrategy {
    /// Fixed-size chunks within each priority tier, emergency tier first.
    Priority,
    /// Spatial k-means partition.
    Geographic,
    /// One batch of emergencies, the rest partitioned geographically.
    #[default]
    Mixed,
}

impl fmt::Display for BatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatchStrategy::Priority => "priority",
            BatchStrategy::Geographic => "geographic",
            BatchStrategy::Mixed => "mixed",
        })
    }
}

impl FromStr for BatchStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "priority" => Ok(BatchStrategy::Priority),
            "geographic" => Ok(BatchStrategy::Geographic),
            "mixed" => Ok(BatchStrategy::Mixed),
            other => Err(Error::invalid_input(format!("unknown batch strategy '{other}'"))),
        }
    }
}

pub fn create_work_batches(
    points: &[MaintenancePoint],
    batch_size: usize,
    strategy: BatchStrategy,
) -> Result<Vec<Vec<MaintenancePoint>>> {
    if batch_size == 0 {
        return Err(Error::invalid_input("batch size must be positive"));
    }

    let batches = match strategy {
        BatchStrategy::Priority => priority_batches(points, batch_size),
        BatchStrategy::Geographic => geographic_batches(points, batch_size),
        BatchStrategy::Mixed => {
            let (emergencies, others): (Vec<_>, Vec<_>) = points
                .iter()
                .cloned()
                .partition(|p| p.priority == Priority::Emergency);
            let mut batches = Vec::new();
            if !emergencies.is_empty() {
                batches.push(emergencies);
            }
            batches.extend(geographic_batches(&others, batch_size));
            batches
        }
    };

    tracing::debug!(
        points = points.len(),
        batches = batches.len(),
        strategy = %strategy,
        "created work batches"
    );
    Ok(batches)
}

fn priority_batches(points: &[MaintenancePoint], batch_size: usize) -> Vec<Vec<MaintenancePoint>> {
    let mut batches = Vec::new();
    for priority in Priority::ALL_DESCENDING {
        let tier: Vec<MaintenancePoint> = points
            .iter()
            .filter(|p| p.priority == priority)
            .cloned()
            .collect();
        batches.extend(tier.chunks(batch_size).map(<[MaintenancePoint]>::to_vec));
    }
    batches
}

fn geographic_batches(points: &[MaintenancePoint], batch_size: usize) -> Vec<Vec<MaintenancePoint>> {
    if points.is_empty() {
        return Vec::new();
    }
    if points.len() <= batch_size {
        return vec![points.to_vec()];
    }

    let coords: Vec<Coordinates> = points.iter().map(MaintenancePoint::coordinates).collect();
    let k = points.len().div_ceil(batch_size);
    let labels = kmeans(&coords, k);

    let mut groups: Vec<Vec<MaintenancePoint>> = vec![Vec::new(); k];
    for (point, label) in points.iter().zip(labels) {
        groups[label].push(point.clone());
    }
    groups.retain(|g| !g.is_empty());
    groups
}

fn squared(a: Coordinates, b: Coordinates) -> f64 {
    (a.lat - b.lat).powi(2) + (a.lng - b.lng).powi(2)
}

fn nearest(p: Coordinates, centers: &[Coordinates]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, &c) in centers.iter().enumerate() {
        let d = squared(p, c);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Lloyd's k-means on raw degrees with k-means++ seeding from a fixed seed.
/// Returns a label in `0..k` per input coordinate.
pub(crate) fn kmeans(coords: &[Coordinates], k: usize) -> Vec<usize> {
    let k = k.clamp(1, coords.len().max(1));
    let mut rng = StdRng::seed_from_u64(KMEANS_SEED);

    let mut centers = vec![coords[rng.gen_range(0..coords.len())]];
    while centers.len() < k {
        let weights: Vec<f64> = coords
            .iter()
            .map(|&p| centers.iter().map(|&c| squared(p, c)).fold(f64::INFINITY, f64::min))
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // every point already coincides with a center
            break;
        }
        let mut target = rng.gen_range(0.0..total);
        let mut chosen = coords.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                chosen = i;
                break;
            }
            target -= w;
        }
        centers.push(coords[chosen]);
    }

    let mut labels: Vec<usize> = coords.iter().map(|&p| nearest(p, &centers)).collect();
    for _ in 0..KMEANS_MAX_ITERATIONS {
        for (c, center) in centers.iter_mut().enumerate() {
            let members = coords.iter().zip(&labels).filter(|(_, l)| **l == c).map(|(p, _)| *p);
            let mut count = 0usize;
            let mut lat = 0.0;
            let mut lng = 0.0;
            for p in members {
                lat += p.lat;
                lng += p.lng;
                count += 1;
            }
            if count > 0 {
                *center = Coordinates::new(lat / count as f64, lng / count as f64);
            }
        }

        let next: Vec<usize> = coords.iter().map(|&p| nearest(p, &centers)).collect();
        if next == labels {
            break;
        }
        labels = next;
    }

    labels
}

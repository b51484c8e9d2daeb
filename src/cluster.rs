//! Geographic clustering and cluster-by-cluster route construction.
//!
//! 1. Density clustering groups nearby points; isolated points stand alone.
//! 2. Each cluster gets a nearest-neighbor tour. Clusters are independent, so
//!    tours are built on a bounded rayon pool and gathered in cluster order.
//! 3. Clusters are sequenced by a depth-first walk of the minimum spanning
//!    tree over their centroids.

use rayon::prelude::*;

use crate::cache::{DistanceCache, PointSlot};
use crate::error::Result;
use crate::haversine::{haversine_km, Coordinates};

/// Points grouped by density; `id` is the cluster's position in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: usize,
    pub members: Vec<PointSlot>,
}

const UNVISITED: i64 = -2;
const NOISE: i64 = -1;

/// Density-based clustering (DBSCAN) over `slots`.
///
/// A point is a core point when at least `min_points` points (itself
/// included) lie within `radius_km`. Points reachable from a core point join
/// its cluster; the rest become singleton clusters. Cluster ids follow the
/// input order of each cluster's first member.
pub fn density_clusters(
    slots: &[PointSlot],
    coords: &[Coordinates],
    radius_km: f64,
    min_points: usize,
) -> Vec<Cluster> {
    let n = slots.len();
    let mut labels = vec![UNVISITED; n];
    let mut next_label: i64 = 0;

    let neighbors = |i: usize| -> Vec<usize> {
        (0..n)
            .filter(|&j| haversine_km(coords[slots[i]], coords[slots[j]]) <= radius_km)
            .collect()
    };

    for i in 0..n {
        if labels[i] != UNVISITED {
            continue;
        }
        let seeds = neighbors(i);
        if seeds.len() < min_points {
            labels[i] = NOISE;
            continue;
        }

        let label = next_label;
        next_label += 1;
        labels[i] = label;

        let mut frontier: Vec<usize> = seeds.into_iter().filter(|&j| j != i).collect();
        while let Some(j) = frontier.pop() {
            if labels[j] == NOISE {
                // border point
                labels[j] = label;
                continue;
            }
            if labels[j] != UNVISITED {
                continue;
            }
            labels[j] = label;
            let reach = neighbors(j);
            if reach.len() >= min_points {
                frontier.extend(reach.into_iter().filter(|&k| labels[k] == UNVISITED || labels[k] == NOISE));
            }
        }
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    let mut label_to_cluster: Vec<Option<usize>> = vec![None; next_label as usize];
    for (i, &label) in labels.iter().enumerate() {
        if label == NOISE {
            clusters.push(Cluster {
                id: clusters.len(),
                members: vec![slots[i]],
            });
            continue;
        }
        let label = label as usize;
        match label_to_cluster[label] {
            Some(c) => clusters[c].members.push(slots[i]),
            None => {
                label_to_cluster[label] = Some(clusters.len());
                clusters.push(Cluster {
                    id: clusters.len(),
                    members: vec![slots[i]],
                });
            }
        }
    }

    tracing::debug!(points = n, clusters = clusters.len(), "density clustering");
    clusters
}

/// Nearest-neighbor tour starting at the first member.
///
/// Ties go to the earliest unvisited member.
pub fn nearest_neighbor_tour(
    members: &[PointSlot],
    coords: &[Coordinates],
    cache: &DistanceCache,
) -> Vec<PointSlot> {
    if members.len() <= 1 {
        return members.to_vec();
    }

    let mut tour = Vec::with_capacity(members.len());
    let mut unvisited: Vec<PointSlot> = members[1..].to_vec();
    tour.push(members[0]);

    while !unvisited.is_empty() {
        let current = tour[tour.len() - 1];
        let mut best = 0;
        let mut best_km = f64::INFINITY;
        for (pos, &candidate) in unvisited.iter().enumerate() {
            let km = cache.distance(current, candidate, coords);
            if km < best_km {
                best_km = km;
                best = pos;
            }
        }
        tour.push(unvisited.remove(best));
    }

    tour
}

/// Builds every cluster's tour on a pool of `workers` threads.
///
/// Output position `i` holds the tour of `clusters[i]`, whatever order the
/// workers finish in.
pub fn build_cluster_tours(
    clusters: &[Cluster],
    coords: &[Coordinates],
    cache: &DistanceCache,
    workers: usize,
) -> Result<Vec<Vec<PointSlot>>> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
    let tours = pool.install(|| {
        clusters
            .par_iter()
            .map(|cluster| nearest_neighbor_tour(&cluster.members, coords, cache))
            .collect()
    });
    Ok(tours)
}

/// Minimum spanning tree over a complete graph (Prim), as adjacency lists
/// with neighbors in ascending index order.
pub fn minimum_spanning_tree(nodes: &[Coordinates]) -> Vec<Vec<usize>> {
    let n = nodes.len();
    let mut adjacency = vec![Vec::new(); n];
    if n < 2 {
        return adjacency;
    }

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut parent: Vec<Option<usize>> = vec![None; n];
    best[0] = 0.0;

    for _ in 0..n {
        let mut u = None;
        for v in 0..n {
            if !in_tree[v] && u.is_none_or(|u: usize| best[v] < best[u]) {
                u = Some(v);
            }
        }
        let Some(u) = u else { break };
        in_tree[u] = true;

        if let Some(p) = parent[u] {
            adjacency[p].push(u);
            adjacency[u].push(p);
        }

        for v in 0..n {
            if in_tree[v] {
                continue;
            }
            let km = haversine_km(nodes[u], nodes[v]);
            if km < best[v] {
                best[v] = km;
                parent[v] = Some(u);
            }
        }
    }

    for neighbors in &mut adjacency {
        neighbors.sort_unstable();
    }
    adjacency
}

/// Depth-first preorder over a tree given as adjacency lists.
pub fn dfs_preorder(adjacency: &[Vec<usize>], start: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(adjacency.len());
    let mut seen = vec![false; adjacency.len()];
    let mut stack = vec![start];

    while let Some(node) = stack.pop() {
        if seen[node] {
            continue;
        }
        seen[node] = true;
        order.push(node);
        // reversed so the lowest-index child is visited first
        for &next in adjacency[node].iter().rev() {
            if !seen[next] {
                stack.push(next);
            }
        }
    }

    order
}

/// Index of the centroid nearest to `start`, or 0 when no start is given.
fn start_node(centroids: &[Coordinates], start: Option<Coordinates>) -> usize {
    let Some(start) = start else {
        return 0;
    };
    let mut best = 0;
    let mut best_km = f64::INFINITY;
    for (i, &c) in centroids.iter().enumerate() {
        let km = haversine_km(start, c);
        if km < best_km {
            best_km = km;
            best = i;
        }
    }
    best
}

/// Concatenates cluster tours in MST depth-first order.
pub fn sequence_clusters(
    tours: Vec<Vec<PointSlot>>,
    coords: &[Coordinates],
    start: Option<Coordinates>,
) -> Vec<PointSlot> {
    if tours.len() <= 1 {
        return tours.into_iter().flatten().collect();
    }

    let centroids: Vec<Coordinates> = tours
        .iter()
        .map(|tour| Coordinates::centroid(tour.iter().map(|&s| coords[s])))
        .collect();
    let mst = minimum_spanning_tree(&centroids);
    let order = dfs_preorder(&mst, start_node(&centroids, start));

    let mut tours: Vec<Option<Vec<PointSlot>>> = tours.into_iter().map(Some).collect();
    let mut route = Vec::new();
    for node in order {
        if let Some(tour) = tours[node].take() {
            route.extend(tour);
        }
    }
    route
}

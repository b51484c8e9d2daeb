//! 2-opt improvement of a cyclic tour.
//!
//! A move is applied only when it shortens the tour by more than
//! [`MIN_GAIN_KM`]; smaller gains count as ties.

/// Tolerance in kilometers: gains at or below it are treated as ties.
pub const MIN_GAIN_KM: f64 = 1e-10;

/// Outcome of a refinement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineStats {
    /// Full passes performed, including the final non-improving one.
    pub passes: usize,
    /// Segment reversals applied.
    pub moves: usize,
    /// Whether the pass cap stopped the search before a local optimum.
    pub capped: bool,
}

/// Improves `tour` in place with 2-opt moves until no move shortens it by
/// more than [`MIN_GAIN_KM`].
///
/// The tour is cyclic: the edge from the last stop back to the first is part
/// of its length. For `1 <= i < j <= n` with `j - i > 1`, edges
/// `(i-1, i)` and `(j-1, j mod n)` are replaced by `(i-1, j-1)` and
/// `(i, j mod n)` when the new pair is shorter by more than the tolerance,
/// by reversing `tour[i..j]`.
/// Tours with fewer than four stops are left untouched.
pub fn two_opt<T, F>(tour: &mut [T], max_passes: usize, dist: F) -> RefineStats
where
    T: Copy,
    F: Fn(T, T) -> f64,
{
    let mut stats = RefineStats {
        passes: 0,
        moves: 0,
        capped: false,
    };
    let n = tour.len();
    if n < 4 {
        return stats;
    }

    loop {
        if stats.passes == max_passes {
            stats.capped = true;
            tracing::warn!(passes = stats.passes, stops = n, "2-opt pass cap reached");
            break;
        }
        stats.passes += 1;

        let mut improved = false;
        for i in 1..n - 1 {
            for j in (i + 2)..=n {
                let a = tour[i - 1];
                let b = tour[i];
                let c = tour[j - 1];
                let d = tour[j % n];

                let current = dist(a, b) + dist(c, d);
                let candidate = dist(a, c) + dist(b, d);
                if candidate + MIN_GAIN_KM < current {
                    tour[i..j].reverse();
                    stats.moves += 1;
                    improved = true;
                }
            }
        }

        if !improved {
            break;
        }
    }

    stats
}

/// Length of a cyclic tour under `dist`.
pub fn tour_length<T, F>(tour: &[T], dist: F) -> f64
where
    T: Copy,
    F: Fn(T, T) -> f64,
{
    let n = tour.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| dist(tour[i], tour[(i + 1) % n])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::{haversine_km, Coordinates};

    fn euclid(a: (f64, f64), b: (f64, f64)) -> f64 {
        ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
    }

    #[test]
    fn short_tours_are_untouched() {
        let mut tour = vec![(0.0, 0.0), (5.0, 5.0), (1.0, 0.0)];
        let before = tour.clone();
        let stats = two_opt(&mut tour, 100, euclid);
        assert_eq!(tour, before);
        assert_eq!(stats.passes, 0);
    }

    #[test]
    fn uncrosses_a_square() {
        let mut tour = vec![(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)];
        let before = tour_length(&tour, euclid);
        let stats = two_opt(&mut tour, 100, euclid);
        let after = tour_length(&tour, euclid);
        assert!(stats.moves > 0);
        assert!((after - 4.0).abs() < 1e-9, "expected perimeter, got {after}");
        assert!(after < before);
        assert!(!stats.capped);
    }

    #[test]
    fn never_lengthens_and_is_idempotent() {
        let coords: Vec<Coordinates> = (0..24)
            .map(|i| {
                let t = i as f64;
                Coordinates::new(-10.9 - ((t * 7.3) % 5.0) / 100.0, -37.05 - ((t * 3.1) % 4.0) / 100.0)
            })
            .collect();
        let mut tour = coords.clone();
        let before = tour_length(&tour, haversine_km);

        two_opt(&mut tour, 1000, haversine_km);
        let once = tour.clone();
        assert!(tour_length(&once, haversine_km) <= before + 1e-9);

        let second = two_opt(&mut tour, 1000, haversine_km);
        assert_eq!(tour, once);
        assert_eq!(second.moves, 0);
        assert_eq!(second.passes, 1);
    }

    /// Four stops where both swaps gain exactly `gain`; every other pair is 1.
    fn near_tie(gain: f64) -> impl Fn(usize, usize) -> f64 {
        move |a, b| match (a.min(b), a.max(b)) {
            (0, 2) | (1, 3) => 1.0 - gain / 2.0,
            _ => 1.0,
        }
    }

    #[test]
    fn gains_within_tolerance_are_ties() {
        let mut tour = vec![0usize, 1, 2, 3];
        let stats = two_opt(&mut tour, 100, near_tie(1e-12));
        assert_eq!(tour, vec![0, 1, 2, 3]);
        assert_eq!(stats.moves, 0);
        assert_eq!(stats.passes, 1);

        let stats = two_opt(&mut tour, 100, near_tie(1e-6));
        assert!(stats.moves > 0);
        assert!(!stats.capped);
    }

    #[test]
    fn pass_cap_is_reported() {
        let mut tour = vec![(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0), (0.5, 2.0)];
        let stats = two_opt(&mut tour, 0, euclid);
        assert!(stats.capped);
        assert_eq!(stats.moves, 0);
    }

    #[test]
    fn tour_length_closes_cycle() {
        let tour = vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
        assert!((tour_length(&tour, euclid) - 4.0).abs() < 1e-12);
        assert_eq!(tour_length(&tour[..1], euclid), 0.0);
    }
}

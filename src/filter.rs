//! The two filter predicates and positional chunking.
//!
//! Both filters treat `None` as "no filtering" and are inclusive at both ends.

use crate::point::{Bounds, PersistencePointTuple};

pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Passes iff `lower.x` lies within the active selection.
pub fn passes_selection(point: &PersistencePointTuple, selection: Option<&Bounds>) -> bool {
    selection.is_none_or(|bounds| bounds.contains(point.lower().x))
}

/// Passes iff the point's persistence lies within the active range.
pub fn passes_persistence(point: &PersistencePointTuple, range: Option<&Bounds>) -> bool {
    range.is_none_or(|bounds| bounds.contains(point.persistence()))
}

/// `persistence(selection(points))`, in original order.
pub fn filter_points(
    points: &[PersistencePointTuple],
    selection: Option<&Bounds>,
    persistence: Option<&Bounds>,
) -> Vec<PersistencePointTuple> {
    points
        .iter()
        .filter(|point| passes_selection(point, selection))
        .filter(|point| passes_persistence(point, persistence))
        .copied()
        .collect()
}

/// Splits into contiguous groups of `chunk_size`; point `i` lands in chunk
/// `i / chunk_size`. A size of zero is treated as one.
pub fn chunk_points(
    points: &[PersistencePointTuple],
    chunk_size: usize,
) -> Vec<Vec<PersistencePointTuple>> {
    points
        .chunks(chunk_size.max(1))
        .map(<[PersistencePointTuple]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{CriticalType, Vec3};

    fn pair(x: f64, persistence: f64) -> PersistencePointTuple {
        PersistencePointTuple::new(
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(x, persistence, 0.0),
            CriticalType::default(),
        )
    }

    fn persistences(points: &[PersistencePointTuple]) -> Vec<f64> {
        points.iter().map(PersistencePointTuple::persistence).collect()
    }

    #[test]
    fn unset_bounds_are_identity() {
        let points: Vec<_> = (0..7).map(|i| pair(i as f64, i as f64 - 3.0)).collect();
        assert_eq!(filter_points(&points, None, None), points);
    }

    #[test]
    fn persistence_range_is_inclusive() {
        let points: Vec<_> = [-3.0, 0.0, 4.0, 7.0, 9.0]
            .into_iter()
            .map(|p| pair(0.0, p))
            .collect();
        let range = Bounds::new(0.0, 7.0);

        let filtered = filter_points(&points, None, Some(&range));
        assert_eq!(persistences(&filtered), vec![0.0, 4.0, 7.0]);
    }

    #[test]
    fn selection_uses_lower_x() {
        let points: Vec<_> = (0..10).map(|i| pair(i as f64, 1.0)).collect();
        let selection = Bounds::new(2.0, 4.0);

        let filtered = filter_points(&points, Some(&selection), None);
        let xs: Vec<f64> = filtered.iter().map(|p| p.lower().x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn filters_compose_and_are_idempotent() {
        let points: Vec<_> = (0..20).map(|i| pair(i as f64, (i % 5) as f64)).collect();
        let selection = Bounds::new(3.0, 15.0);
        let range = Bounds::new(1.0, 3.0);

        let once = filter_points(&points, Some(&selection), Some(&range));
        let twice = filter_points(&once, Some(&selection), Some(&range));
        assert_eq!(once, twice);
        assert!(once
            .iter()
            .all(|p| selection.contains(p.lower().x) && range.contains(p.persistence())));
    }

    #[test]
    fn chunks_concatenate_back_in_order() {
        let points: Vec<_> = (0..250).map(|i| pair(i as f64, 0.0)).collect();
        let chunks = chunk_points(&points, DEFAULT_CHUNK_SIZE);

        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(chunks.concat(), points);
    }

    #[test]
    fn zero_chunk_size_degrades_to_single_points() {
        let points: Vec<_> = (0..3).map(|i| pair(i as f64, 0.0)).collect();
        assert_eq!(chunk_points(&points, 0).len(), 3);
        assert!(chunk_points(&[], 10).is_empty());
    }
}

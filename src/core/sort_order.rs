//! Fractional sort keys for drag-and-drop ordering of sibling records.
//!
//! A move normally touches only the moved record: its new key is the mean of its
//! new neighbours' keys. When the neighbours are too close together (or both sit at
//! zero) the whole sibling set is healed back to dense keys `1..=n` instead.
//!
//! This module only plans the change; callers persist the returned [`ReorderPlan`].

use std::cmp::Ordering;

/// Key gap assumed after the previous neighbour when there is no next neighbour.
pub const TRAILING_GAP: f64 = 1000.0;

/// Neighbour gaps below this, including inverted neighbours, trigger a rebalance.
pub const MIN_GAP: f64 = 1.0;

/// Minimal view of an orderable record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortKey {
    /// Record id
    pub id: i64,
    /// Current sort key
    pub sort_order: f64,
}

impl SortKey {
    /// Pairs an id with its key.
    #[must_use]
    pub const fn new(id: i64, sort_order: f64) -> Self {
        Self { id, sort_order }
    }
}

/// What has to be written to apply a move.
#[derive(Debug, Clone, PartialEq)]
pub enum ReorderPlan {
    /// Only the moved record changes.
    SingleUpdate {
        /// Moved record
        id: i64,
        /// Its new key
        sort_order: f64,
    },
    /// Every sibling gets a new dense key, in list order.
    FullRebalance {
        /// New keys for all siblings including the moved record
        assignments: Vec<SortKey>,
    },
}

impl ReorderPlan {
    /// Number of records the plan writes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::SingleUpdate { .. } => 1,
            Self::FullRebalance { assignments } => assignments.len(),
        }
    }

    /// True when the plan writes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Orders keys by `(sort_order, id)`, which is total even when keys collide.
#[must_use]
pub fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    a.sort_order
        .total_cmp(&b.sort_order)
        .then_with(|| a.id.cmp(&b.id))
}

/// Plans moving `moved_id` between `previous_id` and `next_id`.
///
/// `siblings` is the full sibling set in any order; it may or may not contain the
/// moved record. Neighbours that are missing from it are treated as list boundaries.
#[must_use]
pub fn reorder(
    moved_id: i64,
    previous_id: Option<i64>,
    next_id: Option<i64>,
    siblings: &[SortKey],
) -> ReorderPlan {
    let key_of = |id: Option<i64>| {
        id.and_then(|id| {
            siblings
                .iter()
                .find(|s| s.id == id && s.id != moved_id)
                .map(|s| s.sort_order)
        })
    };

    let previous = key_of(previous_id).unwrap_or(0.0);
    let next = key_of(next_id).unwrap_or(previous + TRAILING_GAP);

    let both_zero = previous == 0.0 && next == 0.0;
    if next - previous < MIN_GAP || both_zero {
        return ReorderPlan::FullRebalance {
            assignments: rebalance(moved_id, previous_id, next_id, siblings),
        };
    }

    ReorderPlan::SingleUpdate {
        id: moved_id,
        sort_order: (previous + next) / 2.0,
    }
}

/// Splices `moved_id` into the ordered siblings and assigns keys `1..=n`.
#[must_use]
pub fn rebalance(
    moved_id: i64,
    previous_id: Option<i64>,
    next_id: Option<i64>,
    siblings: &[SortKey],
) -> Vec<SortKey> {
    let mut ordered: Vec<SortKey> = siblings
        .iter()
        .copied()
        .filter(|s| s.id != moved_id)
        .collect();
    ordered.sort_by(compare_keys);

    let position = |id: Option<i64>| id.and_then(|id| ordered.iter().position(|s| s.id == id));
    let index = position(previous_id)
        .map(|i| i + 1)
        .or_else(|| position(next_id))
        .unwrap_or(0);

    let mut ids: Vec<i64> = ordered.iter().map(|s| s.id).collect();
    ids.insert(index, moved_id);

    ids.into_iter()
        .zip(1_u32..)
        .map(|(id, position)| SortKey::new(id, f64::from(position)))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp, clippy::panic, clippy::cast_precision_loss)]
    use super::*;

    fn keys(pairs: &[(i64, f64)]) -> Vec<SortKey> {
        pairs.iter().map(|&(id, k)| SortKey::new(id, k)).collect()
    }

    fn ids(assignments: &[SortKey]) -> Vec<i64> {
        assignments.iter().map(|s| s.id).collect()
    }

    fn assert_dense(assignments: &[SortKey]) {
        for (i, s) in assignments.iter().enumerate() {
            assert_eq!(s.sort_order, (i + 1) as f64);
        }
    }

    #[test]
    fn test_fast_path_takes_midpoint() {
        let siblings = keys(&[(1, 0.0), (2, 1000.0), (3, 2000.0)]);
        let plan = reorder(9, Some(1), Some(2), &siblings);
        assert_eq!(
            plan,
            ReorderPlan::SingleUpdate {
                id: 9,
                sort_order: 500.0
            }
        );
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_fast_path_to_end_of_list() {
        let siblings = keys(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let plan = reorder(1, Some(3), None, &siblings);
        assert_eq!(
            plan,
            ReorderPlan::SingleUpdate {
                id: 1,
                sort_order: 503.0
            }
        );
    }

    #[test]
    fn test_unknown_neighbours_are_boundaries() {
        let siblings = keys(&[(1, 1.0), (2, 2.0)]);
        // Previous missing -> 0, next missing -> 1000.
        assert_eq!(
            reorder(2, Some(42), Some(43), &siblings),
            ReorderPlan::SingleUpdate {
                id: 2,
                sort_order: 500.0
            }
        );
        assert_eq!(
            reorder(2, None, Some(1), &siblings),
            ReorderPlan::SingleUpdate {
                id: 2,
                sort_order: 0.5
            }
        );
    }

    #[test]
    fn test_collided_neighbours_heal() {
        let siblings = keys(&[(1, 500.0), (2, 500.0), (3, 900.0), (4, 100.0)]);
        let plan = reorder(3, Some(1), Some(2), &siblings);
        let ReorderPlan::FullRebalance { assignments } = plan else {
            panic!("expected a rebalance");
        };
        // Base order by (sort_order, id): 4, 1, 2; 3 goes after 1.
        assert_eq!(ids(&assignments), vec![4, 1, 3, 2]);
        assert_dense(&assignments);
    }

    #[test]
    fn test_inverted_neighbours_heal_after_previous() {
        // A stale view passes neighbours whose keys are out of order.
        let siblings = keys(&[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
        let plan = reorder(1, Some(3), Some(2), &siblings);
        let ReorderPlan::FullRebalance { assignments } = plan else {
            panic!("expected a rebalance");
        };
        assert_eq!(ids(&assignments), vec![2, 3, 1, 4]);
        assert_dense(&assignments);
    }

    #[test]
    fn test_both_zero_heals() {
        let siblings = keys(&[(1, 0.0), (2, 0.0), (3, 0.0)]);
        let plan = reorder(3, None, Some(1), &siblings);
        let ReorderPlan::FullRebalance { assignments } = plan else {
            panic!("expected a rebalance");
        };
        assert_eq!(ids(&assignments), vec![3, 1, 2]);
        assert_dense(&assignments);
    }

    #[test]
    fn test_rebalance_falls_back_to_next_then_front() {
        let siblings = keys(&[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
        assert_eq!(ids(&rebalance(4, Some(99), Some(2), &siblings)), vec![1, 4, 2, 3]);
        assert_eq!(ids(&rebalance(4, Some(99), Some(98), &siblings)), vec![4, 1, 2, 3]);
        assert_eq!(ids(&rebalance(1, Some(4), None, &siblings)), vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_rebalance_accepts_siblings_without_moved_record() {
        let siblings = keys(&[(1, 1.0), (2, 2.0)]);
        let assignments = rebalance(7, Some(1), Some(2), &siblings);
        assert_eq!(ids(&assignments), vec![1, 7, 2]);
        assert_dense(&assignments);
    }

    #[test]
    fn test_no_op_move_keeps_relative_order() {
        let siblings = keys(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        // Fast path: 2 stays between 1 and 3.
        assert_eq!(
            reorder(2, Some(1), Some(3), &siblings),
            ReorderPlan::SingleUpdate {
                id: 2,
                sort_order: 2.0
            }
        );

        // Heal path: a dense set re-heals to itself.
        let tight = keys(&[(1, 1.0), (2, 1.5), (3, 1.9)]);
        let ReorderPlan::FullRebalance { assignments } = reorder(2, Some(1), Some(3), &tight)
        else {
            panic!("expected a rebalance");
        };
        assert_eq!(ids(&assignments), vec![1, 2, 3]);
        let again = rebalance(2, Some(1), Some(3), &assignments);
        assert_eq!(again, assignments);
    }

    #[test]
    fn test_neighbour_equal_to_moved_is_ignored() {
        let siblings = keys(&[(1, 1.0), (2, 2.0)]);
        // Previous is the moved record itself, so it resolves to the 0 boundary.
        assert_eq!(
            reorder(2, Some(2), Some(1), &siblings),
            ReorderPlan::SingleUpdate {
                id: 2,
                sort_order: 0.5
            }
        );
    }

    #[test]
    fn test_compare_keys_breaks_ties_by_id() {
        let mut list = keys(&[(5, 1.0), (2, 1.0), (3, 0.5)]);
        list.sort_by(compare_keys);
        assert_eq!(ids(&list), vec![3, 2, 5]);
    }
}

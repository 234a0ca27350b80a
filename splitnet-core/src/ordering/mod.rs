//! Circular taxon orderings.
//!
//! A split system is circular when some ordering of the taxa around a circle
//! makes every split a contiguous arc. [`compute_cycle`] finds such an
//! ordering greedily: heavier splits get to constrain the ordering first,
//! and a split the ordering can no longer honour simply stops influencing
//! it.

pub mod pqtree;

pub use pqtree::PqTree;

use crate::error::SplitResult;
use crate::progress::ProgressListener;
use crate::splits::SplitSystem;
use crate::taxa::Taxon;

/// Circular ordering of `1..=ntax` induced by the split system.
///
/// Non-trivial splits are offered to a PQ-tree in decreasing weight times
/// size order, each as its part away from taxon 1; rejected splits are
/// dropped silently. The result is 1-based with a `0` sentinel in front and
/// is rotated so `cycle[1] == 1`. Deterministic for a fixed input: ties keep
/// the order the splits were pushed in.
pub fn compute_cycle<P>(progress: &mut P, ntax: u32, splits: &SplitSystem) -> SplitResult<Vec<u32>>
where
    P: ProgressListener,
{
    debug_assert_eq!(ntax, splits.ntax());

    let mut order: Vec<usize> = (0..splits.len())
        .filter(|&i| !splits.get(i).is_trivial())
        .collect();
    let influence = |i: usize| {
        let s = splits.get(i);
        s.weight() * s.size() as f64
    };
    order.sort_by(|&i, &j| influence(j).total_cmp(&influence(i)));

    progress.set_maximum(order.len() as u64);
    let mut tree = PqTree::new(ntax);
    for id in order {
        progress.check_for_cancel()?;
        tree.accept(splits.get(id).part_not_containing(Taxon::new(1)));
        progress.increment();
    }

    let linear = tree.extract_ordering();
    let mut cycle = Vec::with_capacity(ntax as usize + 1);
    cycle.push(0);
    if let Some(pos) = linear.iter().position(|&t| t == 1) {
        cycle.extend_from_slice(&linear[pos..]);
        cycle.extend_from_slice(&linear[..pos]);
    }
    progress.task_completed();
    Ok(cycle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SplitError;
    use crate::progress::{CancelFlag, NoProgress};
    use crate::splits::Split;
    use crate::taxa::TaxonSet;

    fn set(taxa: &[u32]) -> TaxonSet {
        taxa.iter().map(|&t| Taxon::new(t)).collect()
    }

    fn system(ntax: u32, parts: &[(&[u32], f64)]) -> SplitSystem {
        let mut splits = SplitSystem::new(ntax);
        for &(part, weight) in parts {
            splits.push(Split::new(ntax, set(part), weight).unwrap());
        }
        splits
    }

    fn adjacent(cycle: &[u32], a: u32, b: u32) -> bool {
        let n = cycle.len() - 1;
        let pa = cycle.iter().position(|&t| t == a).unwrap();
        let pb = cycle.iter().position(|&t| t == b).unwrap();
        let d = pa.abs_diff(pb);
        d == 1 || d == n - 1
    }

    #[test]
    fn tree_splits_give_the_tree_ordering() {
        let splits = system(
            4,
            &[
                (&[1], 1.0),
                (&[2], 1.0),
                (&[3], 1.0),
                (&[4], 1.0),
                (&[3, 4], 1.0),
            ],
        );
        let cycle = compute_cycle(&mut NoProgress, 4, &splits).unwrap();
        assert_eq!(cycle, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn crossing_pair_interleaves() {
        let splits = system(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0)]);
        let cycle = compute_cycle(&mut NoProgress, 4, &splits).unwrap();
        assert_eq!(cycle, vec![0, 1, 3, 4, 2]);
        assert!(adjacent(&cycle, 3, 4));
        assert!(adjacent(&cycle, 2, 4));
    }

    #[test]
    fn heavier_splits_win() {
        // {2,3}, {3,4} and {2,4} cannot all be arcs of one circle on five
        // taxa; the lightest one loses.
        let splits = system(5, &[(&[2, 3], 1.0), (&[3, 4], 3.0), (&[2, 4], 2.0)]);
        let cycle = compute_cycle(&mut NoProgress, 5, &splits).unwrap();
        assert_eq!(cycle, vec![0, 1, 5, 3, 4, 2]);
        assert!(adjacent(&cycle, 3, 4));
        assert!(adjacent(&cycle, 2, 4));
        assert!(!adjacent(&cycle, 2, 3));

        let splits = system(5, &[(&[2, 3], 3.0), (&[3, 4], 1.0), (&[2, 4], 2.0)]);
        let cycle = compute_cycle(&mut NoProgress, 5, &splits).unwrap();
        assert_eq!(cycle, vec![0, 1, 5, 3, 2, 4]);
        assert!(adjacent(&cycle, 2, 3));
        assert!(adjacent(&cycle, 2, 4));
        assert!(!adjacent(&cycle, 3, 4));
    }

    #[test]
    fn trivial_splits_leave_the_ordering_alone() {
        let splits = system(6, &[(&[1], 2.0), (&[4], 5.0), (&[6], 1.0)]);
        let cycle = compute_cycle(&mut NoProgress, 6, &splits).unwrap();
        assert_eq!(cycle, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_system_gives_identity() {
        let splits = SplitSystem::new(3);
        let cycle = compute_cycle(&mut NoProgress, 3, &splits).unwrap();
        assert_eq!(cycle, vec![0, 1, 2, 3]);
    }

    #[test]
    fn cancellation_aborts() {
        let splits = system(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0)]);
        let mut progress = CancelFlag::new();
        progress.cancel();
        let err = compute_cycle(&mut progress, 4, &splits).unwrap_err();
        assert!(matches!(err, SplitError::Cancelled));
    }
}

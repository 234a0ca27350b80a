use std::collections::HashMap;

use super::split::Split;
use crate::taxa::{Taxon, TaxonSet};

/// An ordered sequence of splits over one taxon range.
///
/// A split's id is its position in the sequence. Pushing an already-present
/// bipartition merges instead of appending: weights add up, the larger
/// confidence wins. The exposed sequence therefore never holds the same
/// bipartition twice.
#[derive(Clone, Debug)]
pub struct SplitSystem {
    ntax: u32,
    splits: Vec<Split>,
    by_part: HashMap<TaxonSet, usize>,
}

impl SplitSystem {
    pub fn new(ntax: u32) -> Self {
        SplitSystem {
            ntax,
            splits: Vec::new(),
            by_part: HashMap::new(),
        }
    }

    pub fn ntax(&self) -> u32 {
        self.ntax
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    pub fn get(&self, id: usize) -> &Split {
        &self.splits[id]
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Split> {
        self.splits.iter()
    }

    /// Id of the split, appended or merged into.
    pub fn push(&mut self, split: Split) -> usize {
        debug_assert_eq!(split.ntax(), self.ntax, "split over a different taxon range");
        match self.by_part.get(split.part_a()) {
            Some(&id) => {
                let existing = &mut self.splits[id];
                existing.set_weight(existing.weight() + split.weight());
                if split.confidence() > existing.confidence() {
                    existing.set_confidence(split.confidence());
                }
                id
            }
            None => {
                let id = self.splits.len();
                self.by_part.insert(split.part_a().clone(), id);
                self.splits.push(split);
                id
            }
        }
    }

    pub fn contains(&self, split: &Split) -> bool {
        self.by_part.contains_key(split.part_a())
    }

    pub fn position(&self, part_a: &TaxonSet) -> Option<usize> {
        self.by_part.get(part_a).copied()
    }

    /// Id of the trivial split isolating `t`, if present.
    pub fn find_trivial(&self, t: Taxon) -> Option<usize> {
        self.splits
            .iter()
            .position(|s| s.is_trivial() && s.smaller_part().contains(t))
    }

    pub fn num_trivial(&self) -> usize {
        self.splits.iter().filter(|s| s.is_trivial()).count()
    }

    /// Copy with the splits in canonical part order, for reproducible output.
    pub fn sorted(&self) -> SplitSystem {
        let mut splits = self.splits.clone();
        splits.sort();
        let mut out = SplitSystem::new(self.ntax);
        for s in splits {
            out.push(s);
        }
        out
    }
}

impl PartialEq for SplitSystem {
    fn eq(&self, other: &Self) -> bool {
        self.ntax == other.ntax && self.splits == other.splits
    }
}

impl<'a> IntoIterator for &'a SplitSystem {
    type Item = &'a Split;
    type IntoIter = std::slice::Iter<'a, Split>;

    fn into_iter(self) -> Self::IntoIter {
        self.splits.iter()
    }
}

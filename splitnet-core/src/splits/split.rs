use std::cmp::Ordering;
use std::fmt;

use crate::error::{SplitError, SplitResult};
use crate::taxa::{Taxon, TaxonSet};

/// A bipartition of the taxa `1..=ntax` into two non-empty parts, with a
/// weight and a confidence.
///
/// Parts are canonicalized on construction so that part A contains taxon 1
/// and never change afterwards; weight and confidence stay mutable so that
/// duplicate bipartitions can accumulate when a system merges them.
/// Equality and ordering consider the parts only.
#[derive(Clone, Debug)]
pub struct Split {
    a: TaxonSet,
    b: TaxonSet,
    ntax: u32,
    weight: f64,
    confidence: f64,
}

impl Split {
    /// Split separating `part` from its complement in `1..=ntax`, with
    /// confidence 1.
    pub fn new(ntax: u32, part: TaxonSet, weight: f64) -> SplitResult<Self> {
        let complement = part.complement(ntax);
        Self::from_parts(ntax, part, complement, weight, 1.0)
    }

    pub fn with_confidence(
        ntax: u32,
        part: TaxonSet,
        weight: f64,
        confidence: f64,
    ) -> SplitResult<Self> {
        let complement = part.complement(ntax);
        Self::from_parts(ntax, part, complement, weight, confidence)
    }

    pub fn from_parts(
        ntax: u32,
        a: TaxonSet,
        b: TaxonSet,
        weight: f64,
        confidence: f64,
    ) -> SplitResult<Self> {
        if a.is_empty() || b.is_empty() {
            return Err(SplitError::InvalidSplit {
                reason: "both parts must be non-empty",
            });
        }
        if a.intersects(&b) {
            return Err(SplitError::InvalidSplit {
                reason: "parts overlap",
            });
        }
        if a.union(&b) != TaxonSet::full(ntax) {
            return Err(SplitError::InvalidSplit {
                reason: "parts do not cover the taxon range",
            });
        }
        let (a, b) = if a.contains(Taxon::new(1)) {
            (a, b)
        } else {
            (b, a)
        };
        Ok(Split {
            a,
            b,
            ntax,
            weight,
            confidence,
        })
    }

    pub fn ntax(&self) -> u32 {
        self.ntax
    }

    /// The part containing taxon 1.
    pub fn part_a(&self) -> &TaxonSet {
        &self.a
    }

    pub fn part_b(&self) -> &TaxonSet {
        &self.b
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = confidence;
    }

    /// Cardinality of the smaller part.
    pub fn size(&self) -> usize {
        self.a.cardinality().min(self.b.cardinality())
    }

    pub fn is_trivial(&self) -> bool {
        self.size() == 1
    }

    pub fn smaller_part(&self) -> &TaxonSet {
        if self.a.cardinality() <= self.b.cardinality() {
            &self.a
        } else {
            &self.b
        }
    }

    pub fn part_containing(&self, t: Taxon) -> &TaxonSet {
        if self.a.contains(t) {
            &self.a
        } else {
            &self.b
        }
    }

    pub fn part_not_containing(&self, t: Taxon) -> &TaxonSet {
        if self.a.contains(t) {
            &self.b
        } else {
            &self.a
        }
    }

    pub fn separates(&self, x: Taxon, y: Taxon) -> bool {
        self.a.contains(x) != self.a.contains(y)
    }
}

impl PartialEq for Split {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a && self.b == other.b
    }
}

impl Eq for Split {}

impl Ord for Split {
    fn cmp(&self, other: &Self) -> Ordering {
        self.a.cmp(&other.a).then_with(|| self.b.cmp(&other.b))
    }
}

impl PartialOrd for Split {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.a, self.b)
    }
}

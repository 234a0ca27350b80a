use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use bit_set::BitSet;

/// A taxon id, 1-based throughout to match the numbering of the file formats
/// this crate speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Taxon(u32);

impl Taxon {
    pub fn new(id: u32) -> Self {
        debug_assert!(id >= 1, "taxon ids are 1-based");
        Taxon(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Taxon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of taxa backed by a bit set; bit i holds taxon i, bit 0 stays unused.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaxonSet {
    bits: BitSet,
}

impl TaxonSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full range `1..=ntax`.
    pub fn full(ntax: u32) -> Self {
        let mut bits = BitSet::with_capacity(ntax as usize + 1);
        for t in 1..=ntax {
            bits.insert(t as usize);
        }
        TaxonSet { bits }
    }

    pub fn singleton(t: Taxon) -> Self {
        let mut set = TaxonSet::new();
        set.insert(t);
        set
    }

    pub fn insert(&mut self, t: Taxon) -> bool {
        self.bits.insert(t.index())
    }

    pub fn remove(&mut self, t: Taxon) -> bool {
        self.bits.remove(t.index())
    }

    pub fn contains(&self, t: Taxon) -> bool {
        self.bits.contains(t.index())
    }

    pub fn cardinality(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Lowest member, if any.
    pub fn first(&self) -> Option<Taxon> {
        self.bits.iter().next().map(|i| Taxon(i as u32))
    }

    /// Members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Taxon> + '_ {
        self.bits.iter().map(|i| Taxon(i as u32))
    }

    pub fn union_with(&mut self, other: &TaxonSet) {
        self.bits.union_with(&other.bits);
    }

    pub fn intersect_with(&mut self, other: &TaxonSet) {
        self.bits.intersect_with(&other.bits);
    }

    pub fn union(&self, other: &TaxonSet) -> TaxonSet {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    pub fn intersection(&self, other: &TaxonSet) -> TaxonSet {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }

    pub fn intersects(&self, other: &TaxonSet) -> bool {
        !self.bits.is_disjoint(&other.bits)
    }

    pub fn is_subset(&self, other: &TaxonSet) -> bool {
        self.bits.is_subset(&other.bits)
    }

    pub fn complement(&self, ntax: u32) -> TaxonSet {
        let mut out = TaxonSet::new();
        for t in 1..=ntax {
            if !self.bits.contains(t as usize) {
                out.bits.insert(t as usize);
            }
        }
        out
    }
}

impl FromIterator<Taxon> for TaxonSet {
    fn from_iter<I: IntoIterator<Item = Taxon>>(iter: I) -> Self {
        let mut set = TaxonSet::new();
        for t in iter {
            set.insert(t);
        }
        set
    }
}

impl Hash for TaxonSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // member-wise, so equal sets with different capacities hash alike
        for i in self.bits.iter() {
            i.hash(state);
        }
    }
}

impl Ord for TaxonSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bits.iter().cmp(other.bits.iter())
    }
}

impl PartialOrd for TaxonSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TaxonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, t) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "}}")
    }
}

/// 1-based table of taxon display labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaxonLabels {
    labels: Vec<Box<str>>,
}

impl TaxonLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels "1".."ntax".
    pub fn numbered(ntax: u32) -> Self {
        TaxonLabels {
            labels: (1..=ntax).map(|t| t.to_string().into_boxed_str()).collect(),
        }
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        TaxonLabels {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ntax(&self) -> u32 {
        self.labels.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn push(&mut self, label: &str) -> Taxon {
        self.labels.push(label.into());
        Taxon(self.labels.len() as u32)
    }

    pub fn label(&self, t: Taxon) -> &str {
        &self.labels[t.index() - 1]
    }

    pub fn index_of(&self, label: &str) -> Option<Taxon> {
        self.labels
            .iter()
            .position(|l| l.as_ref() == label)
            .map(|i| Taxon(i as u32 + 1))
    }

    /// Existing id for `label`, or a fresh one appended to the table.
    pub fn intern(&mut self, label: &str) -> Taxon {
        match self.index_of(label) {
            Some(t) => t,
            None => self.push(label),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Taxon, &str)> + '_ {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| (Taxon(i as u32 + 1), l.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(taxa: &[u32]) -> TaxonSet {
        taxa.iter().map(|&t| Taxon::new(t)).collect()
    }

    #[test]
    fn insert_contains() {
        let mut s = TaxonSet::new();
        assert!(s.insert(Taxon::new(3)));
        assert!(!s.insert(Taxon::new(3)));
        assert!(s.contains(Taxon::new(3)));
        assert!(!s.contains(Taxon::new(1)));
        assert_eq!(s.cardinality(), 1);
    }

    #[test]
    fn full_and_complement() {
        let full = TaxonSet::full(5);
        assert_eq!(full.cardinality(), 5);
        let s = set(&[2, 4]);
        let c = s.complement(5);
        assert_eq!(c, set(&[1, 3, 5]));
        assert_eq!(s.union(&c), full);
        assert!(!s.intersects(&c));
    }

    #[test]
    fn iteration_ascending() {
        let s = set(&[4, 1, 3]);
        let ids: Vec<u32> = s.iter().map(Taxon::id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(s.first(), Some(Taxon::new(1)));
    }

    #[test]
    fn set_order_lexicographic() {
        assert!(set(&[1, 2]) < set(&[1, 3]));
        assert!(set(&[1, 2]) < set(&[1, 2, 3]));
        assert!(set(&[2]) > set(&[1, 5]));
        assert_eq!(set(&[2, 3]).cmp(&set(&[2, 3])), Ordering::Equal);
    }

    #[test]
    fn display() {
        assert_eq!(set(&[1, 3, 4]).to_string(), "{1,3,4}");
        assert_eq!(TaxonSet::new().to_string(), "{}");
    }

    #[test]
    fn labels_numbered() {
        let labels = TaxonLabels::numbered(3);
        assert_eq!(labels.ntax(), 3);
        assert_eq!(labels.label(Taxon::new(2)), "2");
        assert_eq!(labels.index_of("3"), Some(Taxon::new(3)));
        assert_eq!(labels.index_of("x"), None);
    }

    #[test]
    fn labels_intern() {
        let mut labels = TaxonLabels::new();
        let a = labels.intern("alpha");
        let b = labels.intern("beta");
        assert_eq!(labels.intern("alpha"), a);
        assert_eq!(a, Taxon::new(1));
        assert_eq!(b, Taxon::new(2));
        assert_eq!(labels.ntax(), 2);
    }
}

use super::split::Split;
use super::system::SplitSystem;
use crate::taxa::TaxonSet;

/// Two splits are compatible iff at least one of the four quarter
/// intersections `A1∩A2, A1∩B2, B1∩A2, B1∩B2` is empty; exactly the pairs
/// that can coexist as edges of one tree.
pub fn are_compatible(s: &Split, t: &Split) -> bool {
    !s.part_a().intersects(t.part_a())
        || !s.part_a().intersects(t.part_b())
        || !s.part_b().intersects(t.part_a())
        || !s.part_b().intersects(t.part_b())
}

pub fn is_compatible_with_all<'a, I>(s: &Split, others: I) -> bool
where
    I: IntoIterator<Item = &'a Split>,
{
    others.into_iter().all(|t| are_compatible(s, t))
}

pub fn system_is_compatible(splits: &SplitSystem) -> bool {
    let all = splits.splits();
    for (i, s) in all.iter().enumerate() {
        for t in &all[i + 1..] {
            if !are_compatible(s, t) {
                return false;
            }
        }
    }
    true
}

/// Weak compatibility of three splits: false iff one of the two disjunctive
/// labelings has all four of its triple intersections non-empty.
pub fn are_weakly_compatible(s1: &Split, s2: &Split, s3: &Split) -> bool {
    let (a1, b1) = (s1.part_a(), s1.part_b());
    let (a2, b2) = (s2.part_a(), s2.part_b());
    let (a3, b3) = (s3.part_a(), s3.part_b());

    !((meet3(a1, a2, a3) && meet3(a1, b2, b3) && meet3(b1, a2, b3) && meet3(b1, b2, a3))
        || (meet3(b1, b2, b3) && meet3(b1, a2, a3) && meet3(a1, b2, a3) && meet3(a1, a2, b3)))
}

/// Cubic in the number of splits.
pub fn system_is_weakly_compatible(splits: &SplitSystem) -> bool {
    let all = splits.splits();
    for i in 0..all.len() {
        for j in i + 1..all.len() {
            for k in j + 1..all.len() {
                if !are_weakly_compatible(&all[i], &all[j], &all[k]) {
                    return false;
                }
            }
        }
    }
    true
}

fn meet3(x: &TaxonSet, y: &TaxonSet, z: &TaxonSet) -> bool {
    x.iter().any(|t| y.contains(t) && z.contains(t))
}

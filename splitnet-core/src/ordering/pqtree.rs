use crate::taxa::{Taxon, TaxonSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeKind {
    Leaf(Taxon),
    P,
    Q,
}

#[derive(Clone, Debug)]
struct PqNode {
    kind: NodeKind,
    children: Vec<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Empty,
    Full,
    Partial,
}

/// PQ-tree over the taxa `1..=ntax`.
///
/// A P node permutes its children freely, a Q node fixes their sequence up
/// to reversal. `accept` restructures the tree so the given taxa stay
/// consecutive in every ordering the tree still represents, or rolls the
/// whole tree back and reports failure. `extract_ordering` reads off the
/// stored representative, which is deterministic for a fixed accept
/// sequence.
#[derive(Clone, Debug)]
pub struct PqTree {
    nodes: Vec<PqNode>,
    root: usize,
    ntax: u32,
}

impl PqTree {
    pub fn new(ntax: u32) -> Self {
        let mut nodes: Vec<PqNode> = (1..=ntax)
            .map(|t| PqNode {
                kind: NodeKind::Leaf(Taxon::new(t)),
                children: Vec::new(),
            })
            .collect();
        nodes.push(PqNode {
            kind: NodeKind::P,
            children: (0..ntax as usize).collect(),
        });
        let root = nodes.len() - 1;
        PqTree { nodes, root, ntax }
    }

    pub fn ntax(&self) -> u32 {
        self.ntax
    }

    /// Restructure-or-rollback: on success the set is consecutive in every
    /// represented ordering from here on.
    pub fn accept(&mut self, taxa: &TaxonSet) -> bool {
        let wanted = taxa.cardinality();
        if wanted <= 1 || wanted >= self.ntax as usize {
            return true;
        }
        let saved_nodes = self.nodes.clone();
        let saved_root = self.root;
        if self.reduce(taxa, wanted) {
            true
        } else {
            self.nodes = saved_nodes;
            self.root = saved_root;
            false
        }
    }

    /// The stored frontier, left to right.
    pub fn extract_ordering(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.ntax as usize);
        let mut stack = vec![self.root];
        while let Some(v) = stack.pop() {
            match self.nodes[v].kind {
                NodeKind::Leaf(t) => out.push(t.id()),
                _ => {
                    for &c in self.nodes[v].children.iter().rev() {
                        stack.push(c);
                    }
                }
            }
        }
        out
    }

    fn reduce(&mut self, taxa: &TaxonSet, wanted: usize) -> bool {
        let mut size = vec![0usize; self.nodes.len()];
        let mut full = vec![0usize; self.nodes.len()];
        self.count(self.root, taxa, &mut size, &mut full);

        // descend to the deepest node spanning all wanted leaves
        let mut parent: Option<(usize, usize)> = None;
        let mut v = self.root;
        loop {
            let mut next = None;
            for (i, &c) in self.nodes[v].children.iter().enumerate() {
                if full[c] == wanted {
                    next = Some((i, c));
                    break;
                }
            }
            match next {
                Some((i, c)) => {
                    parent = Some((v, i));
                    v = c;
                }
                None => break,
            }
        }

        if full[v] == size[v] {
            // already a whole subtree, nothing to constrain
            return true;
        }
        let replacement = match self.nodes[v].kind {
            NodeKind::Leaf(_) => return true,
            NodeKind::P => self.reduce_root_p(v, &size, &full),
            NodeKind::Q => self.reduce_root_q(v, &size, &full),
        };
        match replacement {
            Some(r) => {
                if r != v {
                    match parent {
                        Some((p, i)) => self.nodes[p].children[i] = r,
                        None => self.root = r,
                    }
                }
                true
            }
            None => false,
        }
    }

    fn count(&self, v: usize, taxa: &TaxonSet, size: &mut [usize], full: &mut [usize]) {
        match self.nodes[v].kind {
            NodeKind::Leaf(t) => {
                size[v] = 1;
                full[v] = taxa.contains(t) as usize;
            }
            _ => {
                let mut s = 0;
                let mut f = 0;
                for i in 0..self.nodes[v].children.len() {
                    let c = self.nodes[v].children[i];
                    self.count(c, taxa, size, full);
                    s += size[c];
                    f += full[c];
                }
                size[v] = s;
                full[v] = f;
            }
        }
    }

    fn mark(&self, v: usize, size: &[usize], full: &[usize]) -> Mark {
        if full[v] == 0 {
            Mark::Empty
        } else if full[v] == size[v] {
            Mark::Full
        } else {
            Mark::Partial
        }
    }

    /// Pertinent root, P case: up to two partial children become the ends of
    /// a Q spine with the full children grouped between them; empty children
    /// stay free.
    fn reduce_root_p(&mut self, v: usize, size: &[usize], full: &[usize]) -> Option<usize> {
        let children = self.nodes[v].children.clone();
        let mut empty = Vec::new();
        let mut fulls = Vec::new();
        let mut partial = Vec::new();
        for &c in &children {
            match self.mark(c, size, full) {
                Mark::Empty => empty.push(c),
                Mark::Full => fulls.push(c),
                Mark::Partial => partial.push(c),
            }
        }
        if partial.len() > 2 {
            return None;
        }
        if partial.is_empty() {
            if fulls.len() >= 2 {
                let group = self.new_node(NodeKind::P, fulls);
                empty.push(group);
                self.nodes[v].children = empty;
            }
            return Some(v);
        }

        let mut spine: Vec<usize> = Vec::new();
        let h0 = self.handle(partial[0], size, full)?;
        spine.extend_from_slice(&self.nodes[h0].children);
        match fulls.len() {
            0 => {}
            1 => spine.push(fulls[0]),
            _ => {
                let group = self.new_node(NodeKind::P, fulls);
                spine.push(group);
            }
        }
        if partial.len() == 2 {
            let h1 = self.handle(partial[1], size, full)?;
            self.deep_reverse(h1);
            spine.extend_from_slice(&self.nodes[h1].children);
        }
        let spine_node = self.new_node(NodeKind::Q, spine);
        if empty.is_empty() {
            Some(spine_node)
        } else {
            empty.push(spine_node);
            self.nodes[v].children = empty;
            Some(v)
        }
    }

    /// Pertinent root, Q case: the non-empty children must sit consecutively
    /// with only the run's two ends allowed to be partial.
    fn reduce_root_q(&mut self, v: usize, size: &[usize], full: &[usize]) -> Option<usize> {
        let children = self.nodes[v].children.clone();
        let marks: Vec<Mark> = children
            .iter()
            .map(|&c| self.mark(c, size, full))
            .collect();
        let lo = marks.iter().position(|&m| m != Mark::Empty)?;
        let hi = marks.iter().rposition(|&m| m != Mark::Empty)?;
        for i in lo..=hi {
            let ok = match marks[i] {
                Mark::Full => true,
                Mark::Partial => i == lo || i == hi,
                Mark::Empty => false,
            };
            if !ok {
                return None;
            }
        }
        // splice right to left so earlier positions stay valid
        if marks[hi] == Mark::Partial {
            let h = self.handle(children[hi], size, full)?;
            self.deep_reverse(h); // full side faces the run
            let grand = self.nodes[h].children.clone();
            self.nodes[v].children.splice(hi..=hi, grand);
        }
        if marks[lo] == Mark::Partial {
            let h = self.handle(children[lo], size, full)?;
            let grand = self.nodes[h].children.clone();
            self.nodes[v].children.splice(lo..=lo, grand);
        }
        Some(v)
    }

    /// Reduce a partial non-root node into a Q whose children run from empty
    /// to full; the caller splices those children into its own sequence.
    fn handle(&mut self, v: usize, size: &[usize], full: &[usize]) -> Option<usize> {
        match self.nodes[v].kind {
            NodeKind::Leaf(_) => None,
            NodeKind::P => self.handle_p(v, size, full),
            NodeKind::Q => self.handle_q(v, size, full),
        }
    }

    fn handle_p(&mut self, v: usize, size: &[usize], full: &[usize]) -> Option<usize> {
        let children = self.nodes[v].children.clone();
        let mut empty = Vec::new();
        let mut fulls = Vec::new();
        let mut partial = Vec::new();
        for &c in &children {
            match self.mark(c, size, full) {
                Mark::Empty => empty.push(c),
                Mark::Full => fulls.push(c),
                Mark::Partial => partial.push(c),
            }
        }
        if partial.len() > 1 {
            return None;
        }
        let mut seq = Vec::new();
        match empty.len() {
            0 => {}
            1 => seq.push(empty[0]),
            _ => {
                let group = self.new_node(NodeKind::P, empty);
                seq.push(group);
            }
        }
        if let Some(&p) = partial.first() {
            let h = self.handle(p, size, full)?;
            seq.extend_from_slice(&self.nodes[h].children);
        }
        match fulls.len() {
            0 => {}
            1 => seq.push(fulls[0]),
            _ => {
                let group = self.new_node(NodeKind::P, fulls);
                seq.push(group);
            }
        }
        Some(self.new_node(NodeKind::Q, seq))
    }

    fn handle_q(&mut self, v: usize, size: &[usize], full: &[usize]) -> Option<usize> {
        let marks: Vec<Mark> = self.nodes[v]
            .children
            .iter()
            .map(|&c| self.mark(c, size, full))
            .collect();
        if !empty_partial_full(&marks) {
            let flipped: Vec<Mark> = marks.iter().rev().copied().collect();
            if !empty_partial_full(&flipped) {
                return None;
            }
            self.deep_reverse(v);
        }
        let children = self.nodes[v].children.clone();
        let pos = children
            .iter()
            .position(|&c| self.mark(c, size, full) == Mark::Partial);
        if let Some(i) = pos {
            let h = self.handle(children[i], size, full)?;
            let grand = self.nodes[h].children.clone();
            self.nodes[v].children.splice(i..=i, grand);
        }
        Some(v)
    }

    /// Mirror the stored frontier of the whole subtree.
    fn deep_reverse(&mut self, v: usize) {
        self.nodes[v].children.reverse();
        for i in 0..self.nodes[v].children.len() {
            let c = self.nodes[v].children[i];
            self.deep_reverse(c);
        }
    }

    fn new_node(&mut self, kind: NodeKind, children: Vec<usize>) -> usize {
        self.nodes.push(PqNode { kind, children });
        self.nodes.len() - 1
    }
}

/// Legal handle shape: empties, then at most one partial, then fulls.
fn empty_partial_full(marks: &[Mark]) -> bool {
    let mut i = 0;
    while i < marks.len() && marks[i] == Mark::Empty {
        i += 1;
    }
    if i < marks.len() && marks[i] == Mark::Partial {
        i += 1;
    }
    while i < marks.len() && marks[i] == Mark::Full {
        i += 1;
    }
    i == marks.len()
}

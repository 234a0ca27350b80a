use crate::taxa::{Taxon, TaxonSet};

#[derive(Clone, Debug, Default)]
pub struct PhyloNode {
    pub label: Option<Box<str>>,
    pub branch_length: Option<f64>,
    pub confidence: Option<f64>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub taxa: TaxonSet,
}

impl PhyloNode {
    pub fn leaf(label: impl Into<Box<str>>, taxon: Taxon) -> Self {
        PhyloNode {
            label: Some(label.into()),
            taxa: TaxonSet::singleton(taxon),
            ..Default::default()
        }
    }
}

/// Arena rooted tree. Nodes are addressed by index; a node may appear as a
/// child of two parents only in hand-built reticulate inputs, in which case
/// `parent` records the primary one and `in_degrees` counts the rest.
#[derive(Clone, Debug, Default)]
pub struct PhyloTree {
    nodes: Vec<PhyloNode>,
    root: Option<usize>,
}

impl PhyloTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: PhyloNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn attach(&mut self, parent: usize, child: usize) {
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
    }

    pub fn set_root(&mut self, idx: usize) {
        self.root = Some(idx);
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn node(&self, idx: usize) -> &PhyloNode {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut PhyloNode {
        &mut self.nodes[idx]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.is_empty()).count()
    }

    pub fn is_leaf(&self, idx: usize) -> bool {
        self.nodes[idx].children.is_empty()
    }

    pub fn leaves(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.children.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn nodes(&self) -> &[PhyloNode] {
        &self.nodes
    }

    /// Occurrences of each node in a children list.
    pub fn in_degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0usize; self.nodes.len()];
        for node in &self.nodes {
            for &c in &node.children {
                degrees[c] += 1;
            }
        }
        degrees
    }

    /// Union of all node taxa.
    pub fn taxa(&self) -> TaxonSet {
        let mut all = TaxonSet::new();
        for node in &self.nodes {
            all.union_with(&node.taxa);
        }
        all
    }
}

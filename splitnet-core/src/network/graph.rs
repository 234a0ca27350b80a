use crate::taxa::{Taxon, TaxonSet};

#[derive(Clone, Debug, Default)]
struct NodeData {
    taxa: TaxonSet,
    label: Option<String>,
    edges: Vec<usize>,
}

#[derive(Clone, Debug)]
struct EdgeData {
    u: usize,
    v: usize,
    split: Option<usize>,
    weight: f64,
    label: Option<String>,
}

/// Undirected split network.
///
/// Nodes carry the taxa placed on them, edges carry the id of the split they
/// represent and its weight. Cutting the edges of one split id disconnects
/// the network into that split's two parts. Node and edge ids are dense
/// indices, stable until [`SplitGraph::clear`].
#[derive(Clone, Debug, Default)]
pub struct SplitGraph {
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
    taxon_node: Vec<Option<usize>>,
}

impl SplitGraph {
    pub fn new(ntax: u32) -> Self {
        SplitGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            taxon_node: vec![None; ntax as usize],
        }
    }

    pub fn ntax(&self) -> u32 {
        self.taxon_node.len() as u32
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// New node holding the given taxa; they are recorded as living here.
    pub fn add_node(&mut self, taxa: TaxonSet) -> usize {
        let id = self.nodes.len();
        for t in taxa.iter() {
            self.taxon_node[(t.id() - 1) as usize] = Some(id);
        }
        self.nodes.push(NodeData {
            taxa,
            label: None,
            edges: Vec::new(),
        });
        id
    }

    pub fn add_edge(&mut self, u: usize, v: usize, split: Option<usize>, weight: f64) -> usize {
        let id = self.edges.len();
        self.edges.push(EdgeData {
            u,
            v,
            split,
            weight,
            label: None,
        });
        self.nodes[u].edges.push(id);
        self.nodes[v].edges.push(id);
        id
    }

    /// Move one endpoint of `e` from `from` to `to`.
    pub fn reattach(&mut self, e: usize, from: usize, to: usize) {
        let edge = &mut self.edges[e];
        if edge.u == from {
            edge.u = to;
        } else {
            debug_assert_eq!(edge.v, from);
            edge.v = to;
        }
        self.nodes[from].edges.retain(|&f| f != e);
        self.nodes[to].edges.push(e);
    }

    pub fn add_taxon(&mut self, v: usize, t: Taxon) {
        self.nodes[v].taxa.insert(t);
        self.taxon_node[(t.id() - 1) as usize] = Some(v);
    }

    pub fn remove_taxon(&mut self, v: usize, t: Taxon) {
        self.nodes[v].taxa.remove(t);
        if self.taxon_node[(t.id() - 1) as usize] == Some(v) {
            self.taxon_node[(t.id() - 1) as usize] = None;
        }
    }

    pub fn taxa(&self, v: usize) -> &TaxonSet {
        &self.nodes[v].taxa
    }

    /// Where a taxon currently lives, if it has been placed.
    pub fn taxon_node(&self, t: Taxon) -> Option<usize> {
        self.taxon_node.get((t.id() - 1) as usize).copied().flatten()
    }

    pub fn label(&self, v: usize) -> Option<&str> {
        self.nodes[v].label.as_deref()
    }

    pub fn set_label(&mut self, v: usize, label: String) {
        self.nodes[v].label = Some(label);
    }

    pub fn edges_of(&self, v: usize) -> &[usize] {
        &self.nodes[v].edges
    }

    pub fn degree(&self, v: usize) -> usize {
        self.nodes[v].edges.len()
    }

    pub fn endpoints(&self, e: usize) -> (usize, usize) {
        (self.edges[e].u, self.edges[e].v)
    }

    pub fn opposite(&self, e: usize, v: usize) -> usize {
        let edge = &self.edges[e];
        if edge.u == v {
            edge.v
        } else {
            edge.u
        }
    }

    pub fn edge_split(&self, e: usize) -> Option<usize> {
        self.edges[e].split
    }

    pub fn edge_weight(&self, e: usize) -> f64 {
        self.edges[e].weight
    }

    pub fn edge_label(&self, e: usize) -> Option<&str> {
        self.edges[e].label.as_deref()
    }

    pub fn set_edge_label(&mut self, e: usize, label: String) {
        self.edges[e].label = Some(label);
    }

    pub fn edge_between(&self, u: usize, v: usize) -> Option<usize> {
        self.nodes[u]
            .edges
            .iter()
            .copied()
            .find(|&e| self.opposite(e, u) == v)
    }

    /// Distinct split ids present on edges, ascending.
    pub fn split_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.edges.iter().filter_map(|e| e.split).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn is_connected(&self) -> bool {
        if self.nodes.is_empty() {
            return true;
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![0usize];
        seen[0] = true;
        let mut visited = 1;
        while let Some(v) = stack.pop() {
            for &e in &self.nodes[v].edges {
                let u = self.opposite(e, v);
                if !seen[u] {
                    seen[u] = true;
                    visited += 1;
                    stack.push(u);
                }
            }
        }
        visited == self.nodes.len()
    }

    /// Drop all nodes and edges; taxa become unplaced.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        for slot in &mut self.taxon_node {
            *slot = None;
        }
    }
}

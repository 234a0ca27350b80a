use crate::diag::{record, Diagnostic};
use crate::error::{SplitError, SplitResult};
use crate::splits::{are_compatible, Split, SplitSystem};
use crate::taxa::{Taxon, TaxonSet};

use super::tree::{PhyloNode, PhyloTree};

/// Hardwired cluster (union of descendant taxa) per node, indexed by node id.
/// Iterative post-order; a node reachable twice is computed once.
pub fn extract_clusters(tree: &PhyloTree) -> Vec<TaxonSet> {
    let mut clusters = vec![TaxonSet::new(); tree.num_nodes()];
    let root = match tree.root() {
        Some(r) => r,
        None => return clusters,
    };
    let mut done = vec![false; tree.num_nodes()];
    let mut stack = vec![(root, false)];
    while let Some((v, expanded)) = stack.pop() {
        if done[v] {
            continue;
        }
        if expanded {
            let mut set = tree.node(v).taxa.clone();
            for &c in &tree.node(v).children {
                set.union_with(&clusters[c]);
            }
            clusters[v] = set;
            done[v] = true;
        } else {
            stack.push((v, true));
            for &c in &tree.node(v).children {
                if !done[c] {
                    stack.push((c, false));
                }
            }
        }
    }
    clusters
}

/// One split per in-degree-1 node whose cluster is a proper non-empty subset
/// of `1..=ntax`; weight is the branch length (1 when absent). Nodes sharing
/// a bipartition merge through the system's push rule.
pub fn compute_splits(ntax: u32, tree: &PhyloTree) -> SplitSystem {
    let mut system = SplitSystem::new(ntax);
    if tree.root().is_none() {
        return system;
    }
    let clusters = extract_clusters(tree);
    let degrees = tree.in_degrees();
    let full = TaxonSet::full(ntax);
    for v in 0..tree.num_nodes() {
        if degrees[v] != 1 {
            continue;
        }
        let cluster = &clusters[v];
        if cluster.is_empty() || *cluster == full {
            continue;
        }
        let node = tree.node(v);
        let weight = node.branch_length.unwrap_or(1.0);
        let confidence = node.confidence.unwrap_or(1.0);
        if let Ok(split) = Split::with_confidence(ntax, cluster.clone(), weight, confidence) {
            system.push(split);
        }
    }
    system
}

/// A cluster to pop into the growing backbone tree.
#[derive(Clone, Debug)]
pub(crate) struct Cluster {
    pub taxa: TaxonSet,
    pub weight: f64,
    pub confidence: f64,
}

/// Rooted tree realizing a pairwise-compatible split system: clusters are
/// the parts not containing taxon 1, each inserted below the deepest node
/// strictly containing it, then every taxon attaches to the deepest node
/// containing it.
pub fn tree_from_compatible_splits<F>(
    splits: &SplitSystem,
    label_of: F,
    diagnostics: &mut Vec<Diagnostic>,
) -> SplitResult<PhyloTree>
where
    F: Fn(Taxon) -> String,
{
    if splits.is_empty() {
        return Err(SplitError::EmptySystem);
    }
    let all = splits.splits();
    for i in 0..all.len() {
        for j in i + 1..all.len() {
            if !are_compatible(&all[i], &all[j]) {
                return Err(SplitError::IncompatibleSplits { first: i, second: j });
            }
        }
    }
    let clusters = all
        .iter()
        .map(|s| Cluster {
            taxa: s.part_not_containing(Taxon::new(1)).clone(),
            weight: s.weight(),
            confidence: s.confidence(),
        })
        .collect();
    Ok(tree_from_clusters(splits.ntax(), clusters, label_of, diagnostics))
}

/// Cluster-popping tree construction. Clusters must form a laminar family;
/// a duplicate cluster is reported and skipped.
pub(crate) fn tree_from_clusters<F>(
    ntax: u32,
    mut clusters: Vec<Cluster>,
    label_of: F,
    diagnostics: &mut Vec<Diagnostic>,
) -> PhyloTree
where
    F: Fn(Taxon) -> String,
{
    clusters.sort_by(|x, y| {
        y.taxa
            .cardinality()
            .cmp(&x.taxa.cardinality())
            .then_with(|| x.taxa.cmp(&y.taxa))
    });

    let mut tree = PhyloTree::new();
    let root = tree.add_node(PhyloNode::default());
    tree.set_root(root);
    // cluster attached to each node; None for the root and for plain leaves
    let mut node_cluster: Vec<Option<TaxonSet>> = vec![None];

    for cluster in clusters {
        let mut v = root;
        loop {
            let mut descended = false;
            for &c in &tree.node(v).children {
                if let Some(cs) = &node_cluster[c] {
                    if cluster.taxa.is_subset(cs) && cluster.taxa != *cs {
                        v = c;
                        descended = true;
                        break;
                    }
                }
            }
            if !descended {
                break;
            }
        }
        let duplicate = tree
            .node(v)
            .children
            .iter()
            .any(|&c| node_cluster[c].as_ref() == Some(&cluster.taxa));
        if duplicate {
            record(
                diagnostics,
                "cluster tree",
                format!("duplicate cluster {} ignored", cluster.taxa),
            );
            continue;
        }
        let w = tree.add_node(PhyloNode {
            branch_length: Some(cluster.weight),
            confidence: Some(cluster.confidence),
            ..Default::default()
        });
        tree.attach(v, w);
        node_cluster.push(Some(cluster.taxa));
    }

    for t in (1..=ntax).map(Taxon::new) {
        let mut v = root;
        loop {
            let mut descended = false;
            for &c in &tree.node(v).children {
                if let Some(cs) = &node_cluster[c] {
                    if cs.contains(t) {
                        v = c;
                        descended = true;
                        break;
                    }
                }
            }
            if !descended {
                break;
            }
        }
        if tree.node(v).children.is_empty() && tree.node(v).taxa.is_empty() {
            let node = tree.node_mut(v);
            node.taxa.insert(t);
            node.label = Some(label_of(t).into());
        } else {
            let leaf = tree.add_node(PhyloNode::leaf(label_of(t), t));
            tree.attach(v, leaf);
            node_cluster.push(None);
        }
    }

    tree
}

use std::cmp::Reverse;

use crate::diag::{record, Report};
use crate::error::{SplitError, SplitResult};
use crate::ordering::compute_cycle;
use crate::phylo::clusters::{tree_from_clusters, Cluster};
use crate::phylo::{extract_clusters, PhyloTree};
use crate::progress::NoProgress;
use crate::splits::{is_compatible_with_all, Split, SplitSystem};
use crate::taxa::{Taxon, TaxonLabels, TaxonSet};

use super::reader::parse_with_labels;

/// Rendering knobs for [`write`].
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Emit edge weights. Off, the output keeps only the topology.
    pub include_weights: bool,
    /// Emit confidences after the weights.
    pub include_confidences: bool,
    /// Circular ordering to lay the taxa out in; computed when absent.
    pub cycle: Option<Vec<u32>>,
    /// Re-parse the output and report any drift as diagnostics.
    pub self_check: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            include_weights: true,
            include_confidences: false,
            cycle: None,
            self_check: true,
        }
    }
}

/// Render a split system as Split-Newick text.
///
/// A greedy backbone of pairwise-compatible splits becomes a rooted tree;
/// every remaining split is spliced in as one marker pair enclosing the run
/// of taxa on its far side. Taxa without a trivial split get a zero-weight
/// pendant edge so the re-parse sees every leaf; those edges carry no split.
pub fn write<F>(
    splits: &SplitSystem,
    label_of: F,
    options: &WriteOptions,
) -> SplitResult<Report<String>>
where
    F: Fn(Taxon) -> String,
{
    let ntax = splits.ntax();
    if ntax == 0 {
        return Err(SplitError::EmptySystem);
    }
    let mut diagnostics = Vec::new();

    let cycle = match &options.cycle {
        Some(cycle) => {
            validate_cycle(ntax, cycle)?;
            cycle.clone()
        }
        None => compute_cycle(&mut NoProgress, ntax, splits)?,
    };
    let mut rank = vec![0usize; ntax as usize + 1];
    for (i, &t) in cycle.iter().enumerate().skip(1) {
        rank[t as usize] = i;
    }
    let anchor = Taxon::new(cycle[1]);

    // greedy backbone: trivial splits always fit, a non-trivial split joins
    // when its far part is a single run of the cycle and it is compatible
    // with everything accepted before it
    let mut backbone: Vec<usize> = Vec::new();
    let mut extra: Vec<usize> = Vec::new();
    let mut accepted: Vec<&Split> = Vec::new();
    for (id, split) in splits.iter().enumerate() {
        if split.is_trivial() {
            backbone.push(id);
            continue;
        }
        let part = split.part_not_containing(anchor);
        if contiguous(part, &rank) && is_compatible_with_all(split, accepted.iter().copied()) {
            backbone.push(id);
            accepted.push(split);
        } else {
            extra.push(id);
        }
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    let mut has_singleton = vec![false; ntax as usize + 1];
    for &id in &backbone {
        let split = splits.get(id);
        let part = split.part_not_containing(anchor);
        if part.cardinality() == 1 {
            if let Some(t) = part.first() {
                has_singleton[t.id() as usize] = true;
            }
        }
        clusters.push(Cluster {
            taxa: part.clone(),
            weight: split.weight(),
            confidence: split.confidence(),
        });
    }
    for t in (1..=ntax).map(Taxon::new) {
        if !has_singleton[t.id() as usize] {
            clusters.push(Cluster {
                taxa: TaxonSet::singleton(t),
                weight: 0.0,
                confidence: 1.0,
            });
        }
    }

    let mut tree = tree_from_clusters(ntax, clusters, &label_of, &mut diagnostics);
    let subtree_taxa = extract_clusters(&tree);
    order_children(&mut tree, &subtree_taxa, &rank);

    let mut out = String::new();
    let mut spans: Vec<Option<(usize, usize)>> = vec![None; ntax as usize + 1];
    if let Some(root) = tree.root() {
        render(&tree, root, true, options, &mut out, &mut spans);
    }
    out.push(';');

    // splice the leftover splits in as marker pairs, outermost first at any
    // shared position
    let mut events: Vec<(usize, u8, Reverse<usize>, String)> = Vec::new();
    for (k, &id) in extra.iter().enumerate() {
        let split = splits.get(id);
        let part = split.part_not_containing(anchor);
        let marker = (k + 1) as u64;
        let first = part.iter().min_by_key(|t| rank[t.id() as usize]);
        let last = part.iter().max_by_key(|t| rank[t.id() as usize]);
        let (Some(open_at), Some(close_at)) = (
            first.and_then(|t| spans[t.id() as usize]).map(|s| s.0),
            last.and_then(|t| spans[t.id() as usize]).map(|s| s.1),
        ) else {
            record(
                &mut diagnostics,
                "write",
                format!("no rendered span for split {id}, omitted"),
            );
            continue;
        };
        let mut close = format!("|{marker}");
        if options.include_weights {
            close.push(':');
            close.push_str(&split.weight().to_string());
            if options.include_confidences {
                close.push(':');
                close.push_str(&split.confidence().to_string());
            }
        }
        close.push('>');
        events.push((open_at, 1, Reverse(close_at), format!("<{marker}|")));
        events.push((close_at, 0, Reverse(open_at), close));
    }
    events.sort();
    for (pos, _, _, insert) in events.into_iter().rev() {
        out.insert_str(pos, &insert);
    }

    if options.self_check {
        let labels = TaxonLabels::from_labels((1..=ntax).map(|t| label_of(Taxon::new(t))));
        match parse_with_labels(&out, &labels) {
            Ok(reparsed) => {
                if !systems_agree(splits, &reparsed.value.splits, options.include_weights) {
                    record(
                        &mut diagnostics,
                        "write",
                        "self-check: re-parsed splits differ from the input".to_owned(),
                    );
                }
            }
            Err(e) => record(
                &mut diagnostics,
                "write",
                format!("self-check: output failed to parse: {e}"),
            ),
        }
    }
    Ok(Report::new(out, diagnostics))
}

fn validate_cycle(ntax: u32, cycle: &[u32]) -> SplitResult<()> {
    if cycle.len() != ntax as usize + 1 {
        return Err(SplitError::InvalidCycle {
            reason: "length must be one more than the taxon count",
        });
    }
    if cycle[0] != 0 {
        return Err(SplitError::InvalidCycle {
            reason: "leading sentinel must be 0",
        });
    }
    let mut seen = vec![false; ntax as usize + 1];
    for &t in &cycle[1..] {
        if t == 0 || t > ntax || seen[t as usize] {
            return Err(SplitError::InvalidCycle {
                reason: "entries must be a permutation of the taxa",
            });
        }
        seen[t as usize] = true;
    }
    Ok(())
}

/// Whether the part occupies one unbroken run of cycle positions.
fn contiguous(part: &TaxonSet, rank: &[usize]) -> bool {
    let mut lo = usize::MAX;
    let mut hi = 0;
    let mut n = 0;
    for t in part.iter() {
        let r = rank[t.id() as usize];
        lo = lo.min(r);
        hi = hi.max(r);
        n += 1;
    }
    n > 0 && hi - lo + 1 == n
}

fn order_children(tree: &mut PhyloTree, subtree_taxa: &[TaxonSet], rank: &[usize]) {
    for v in 0..tree.num_nodes() {
        let mut children = tree.node(v).children.clone();
        children.sort_by_key(|&c| {
            subtree_taxa[c]
                .iter()
                .map(|t| rank[t.id() as usize])
                .min()
                .unwrap_or(usize::MAX)
        });
        tree.node_mut(v).children = children;
    }
}

fn render(
    tree: &PhyloTree,
    v: usize,
    is_root: bool,
    options: &WriteOptions,
    out: &mut String,
    spans: &mut [Option<(usize, usize)>],
) {
    let node = tree.node(v);
    let start = out.len();
    if node.children.is_empty() {
        if let Some(label) = node.label.as_deref() {
            write_label(out, label);
        }
    } else {
        out.push('(');
        for (i, &c) in node.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            render(tree, c, false, options, out, spans);
        }
        out.push(')');
    }
    if !is_root && options.include_weights {
        out.push(':');
        out.push_str(&node.branch_length.unwrap_or(0.0).to_string());
        if options.include_confidences {
            out.push(':');
            out.push_str(&node.confidence.unwrap_or(1.0).to_string());
        }
    }
    let end = out.len();
    for t in node.taxa.iter() {
        spans[t.id() as usize] = Some((start, end));
    }
}

fn write_label(out: &mut String, label: &str) {
    if needs_quoting(label) {
        out.push('\'');
        for c in label.chars() {
            if c == '\'' {
                out.push('\'');
            }
            out.push(c);
        }
        out.push('\'');
    } else {
        out.push_str(label);
    }
}

fn needs_quoting(label: &str) -> bool {
    label.is_empty()
        || label
            .chars()
            .any(|c| c.is_whitespace() || "()[]{}:;,'<>|".contains(c))
}

/// Same bipartitions in both systems, weights compared only when they were
/// written out. Zero-weight inputs never survive a re-parse and are skipped.
fn systems_agree(input: &SplitSystem, reparsed: &SplitSystem, weights: bool) -> bool {
    let mut kept = SplitSystem::new(input.ntax());
    for split in input.iter().filter(|s| s.weight() != 0.0) {
        kept.push(split.clone());
    }
    let kept = kept.sorted();
    let reparsed = reparsed.sorted();
    if kept.len() != reparsed.len() {
        return false;
    }
    kept.iter().zip(reparsed.iter()).all(|(x, y)| {
        x == y && (!weights || (x.weight() - y.weight()).abs() <= 1e-9)
    })
}

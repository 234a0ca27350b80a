//! Convex hull construction.
//!
//! Splits are inserted one at a time, smallest part first. For each new
//! split the nodes lying between its two parts are found by two restricted
//! flood fills, and every node reached by both is doubled, with the copies
//! joined by a new edge carrying the split. The construction accepts any
//! split system; incompatible splits simply cost extra nodes.

use std::collections::VecDeque;

use bit_set::BitSet;

use crate::diag::{record, Diagnostic, Report};
use crate::error::SplitResult;
use crate::network::graph::SplitGraph;
use crate::progress::ProgressListener;
use crate::splits::{Split, SplitSystem};
use crate::taxa::{Taxon, TaxonSet};

/// Build a split network for the whole system.
///
/// The returned report carries the network plus diagnostics from the
/// post-construction audit; a disconnected result is replaced by a star
/// network over the taxa.
pub fn build_network<P, F>(
    progress: &mut P,
    ntax: u32,
    splits: &SplitSystem,
    label_of: F,
) -> SplitResult<Report<SplitGraph>>
where
    P: ProgressListener,
    F: Fn(Taxon) -> String,
{
    let mut diagnostics = Vec::new();
    let mut graph = SplitGraph::new(ntax);
    let mut used = BitSet::with_capacity(splits.len());
    extend_network(progress, splits, &mut graph, &mut used)?;

    if !graph.is_connected() {
        record(
            &mut diagnostics,
            "network",
            "hull construction left the network disconnected, falling back to a star".to_owned(),
        );
        graph = star_network(ntax, splits);
    }
    audit(&graph, splits, &mut diagnostics);
    apply_labels(&mut graph, &label_of);
    Ok(Report::new(graph, diagnostics))
}

/// Insert the splits not yet marked in `used` into an existing network.
///
/// A fresh graph is seeded with a single node holding every taxon. On
/// cancellation the graph is cleared before the error is returned.
pub fn extend_network<P>(
    progress: &mut P,
    splits: &SplitSystem,
    graph: &mut SplitGraph,
    used: &mut BitSet,
) -> SplitResult<()>
where
    P: ProgressListener,
{
    let result = extend_impl(progress, splits, graph, used);
    if result.is_err() {
        graph.clear();
    }
    result
}

fn extend_impl<P>(
    progress: &mut P,
    splits: &SplitSystem,
    graph: &mut SplitGraph,
    used: &mut BitSet,
) -> SplitResult<()>
where
    P: ProgressListener,
{
    let ntax = splits.ntax();
    debug_assert_eq!(ntax, graph.ntax());
    if graph.num_nodes() == 0 && ntax > 0 {
        graph.add_node(TaxonSet::full(ntax));
    }

    let mut order: Vec<usize> = (0..splits.len()).filter(|i| !used.contains(*i)).collect();
    order.sort_by_key(|&i| splits.get(i).size());
    progress.set_maximum(order.len() as u64);

    for j in order {
        progress.check_for_cancel()?;
        insert_split(progress, splits, graph, used, j)?;
        used.insert(j);
        progress.increment();
    }
    progress.task_completed();
    Ok(())
}

fn insert_split<P>(
    progress: &mut P,
    splits: &SplitSystem,
    graph: &mut SplitGraph,
    used: &BitSet,
    j: usize,
) -> SplitResult<()>
where
    P: ProgressListener,
{
    let split = splits.get(j);
    let a = split.part_a();
    let b = split.part_b();

    // previously inserted splits that cut through either part
    let mut divided0 = BitSet::new();
    let mut divided1 = BitSet::new();
    for i in used.iter() {
        let other = splits.get(i);
        if b.intersects(other.part_a()) && b.intersects(other.part_b()) {
            divided0.insert(i);
        }
        if a.intersects(other.part_a()) && a.intersects(other.part_b()) {
            divided1.insert(i);
        }
    }

    let (Some(start0), Some(start1)) = (
        b.first().and_then(|t| graph.taxon_node(t)),
        a.first().and_then(|t| graph.taxon_node(t)),
    ) else {
        return Ok(());
    };

    let hull0 = convex_hull_nodes(progress, graph, start0, &divided0)?;
    let hull1 = convex_hull_nodes(progress, graph, start1, &divided1)?;

    let pre = graph.num_nodes();
    // 0 stays put, 1 moves across, 2 is doubled
    let side: Vec<u8> = (0..pre)
        .map(|v| match (hull0[v], hull1[v]) {
            (true, true) => 2,
            (false, true) => 1,
            _ => 0,
        })
        .collect();

    let weight = split.weight();
    let mut twin: Vec<Option<usize>> = vec![None; pre];
    for v in 0..pre {
        if side[v] != 2 {
            continue;
        }
        let v1 = graph.add_node(TaxonSet::new());
        let moved: Vec<Taxon> = graph.taxa(v).iter().filter(|t| a.contains(*t)).collect();
        for t in moved {
            graph.remove_taxon(v, t);
            graph.add_taxon(v1, t);
        }
        for e in graph.edges_of(v).to_vec() {
            let u = graph.opposite(e, v);
            match side[u] {
                1 => graph.reattach(e, v, v1),
                2 => {
                    // the copies inherit the edge between two doubled nodes
                    if let Some(u1) = twin[u] {
                        if graph.edge_between(v1, u1).is_none() {
                            let s = graph.edge_split(e);
                            let w = graph.edge_weight(e);
                            graph.add_edge(v1, u1, s, w);
                        }
                    }
                }
                _ => {}
            }
        }
        graph.add_edge(v, v1, Some(j), weight);
        twin[v] = Some(v1);
    }
    Ok(())
}

/// Nodes reachable from `start` crossing only edges of the given splits.
fn convex_hull_nodes<P>(
    progress: &mut P,
    graph: &SplitGraph,
    start: usize,
    divided: &BitSet,
) -> SplitResult<Vec<bool>>
where
    P: ProgressListener,
{
    let mut seen = vec![false; graph.num_nodes()];
    let mut queue = VecDeque::new();
    queue.push_back(start);
    seen[start] = true;
    while let Some(v) = queue.pop_front() {
        progress.check_for_cancel()?;
        for &e in graph.edges_of(v) {
            if !graph.edge_split(e).map_or(false, |s| divided.contains(s)) {
                continue;
            }
            let u = graph.opposite(e, v);
            if !seen[u] {
                seen[u] = true;
                queue.push_back(u);
            }
        }
    }
    Ok(seen)
}

/// Star network over the taxa: an unlabelled centre with one unit-weight
/// pendant edge per taxon, each tagged with the system's matching trivial
/// split id where it has one.
pub fn star_network(ntax: u32, splits: &SplitSystem) -> SplitGraph {
    let mut graph = SplitGraph::new(ntax);
    if ntax == 0 {
        return graph;
    }
    let centre = graph.add_node(TaxonSet::new());
    for t in (1..=ntax).map(Taxon::new) {
        let leaf = graph.add_node(TaxonSet::singleton(t));
        graph.add_edge(centre, leaf, splits.find_trivial(t), 1.0);
    }
    graph
}

/// Read the split system back off a network.
///
/// Each split id present on an edge contributes one split whose parts are
/// the two taxon sets its edges separate; edges without a split id are
/// ignored.
pub fn extract_splits(graph: &SplitGraph, ntax: u32) -> Report<SplitSystem> {
    let mut diagnostics = Vec::new();
    let mut system = SplitSystem::new(ntax);
    for id in graph.split_ids() {
        let Some((inside, outside)) = split_bipartition(graph, id) else {
            continue;
        };
        let weight = (0..graph.num_edges())
            .find(|&e| graph.edge_split(e) == Some(id))
            .map_or(1.0, |e| graph.edge_weight(e));
        match Split::from_parts(ntax, inside, outside, weight, 1.0) {
            Ok(split) => {
                system.push(split);
            }
            Err(_) => record(
                &mut diagnostics,
                "network",
                format!("edges of split {id} do not separate the network"),
            ),
        }
    }
    Report::new(system, diagnostics)
}

/// The two taxon sets separated by the edges of one split id, or `None` if
/// no edge carries it.
pub fn split_bipartition(graph: &SplitGraph, id: usize) -> Option<(TaxonSet, TaxonSet)> {
    let carried = (0..graph.num_edges()).any(|e| graph.edge_split(e) == Some(id));
    if graph.num_nodes() == 0 || !carried {
        return None;
    }
    let mut seen = vec![false; graph.num_nodes()];
    let mut stack = vec![0usize];
    seen[0] = true;
    while let Some(v) = stack.pop() {
        for &e in graph.edges_of(v) {
            if graph.edge_split(e) == Some(id) {
                continue;
            }
            let u = graph.opposite(e, v);
            if !seen[u] {
                seen[u] = true;
                stack.push(u);
            }
        }
    }
    let mut inside = TaxonSet::new();
    let mut outside = TaxonSet::new();
    for v in 0..graph.num_nodes() {
        if seen[v] {
            inside.union_with(graph.taxa(v));
        } else {
            outside.union_with(graph.taxa(v));
        }
    }
    Some((inside, outside))
}

fn audit(graph: &SplitGraph, splits: &SplitSystem, diagnostics: &mut Vec<Diagnostic>) {
    for t in (1..=splits.ntax()).map(Taxon::new) {
        if graph.taxon_node(t).is_none() {
            record(
                diagnostics,
                "network",
                format!("taxon {} is not placed on any node", t.id()),
            );
        }
    }
    for e in 0..graph.num_edges() {
        if graph.edge_split(e).is_none() {
            record(
                diagnostics,
                "network",
                format!("edge {e} carries no split id"),
            );
        }
    }
    for j in 0..splits.len() {
        match split_bipartition(graph, j) {
            None => record(
                diagnostics,
                "network",
                format!("split {j} is missing from the network"),
            ),
            Some((inside, outside)) => {
                if inside.is_empty() || outside.is_empty() {
                    record(
                        diagnostics,
                        "network",
                        format!("edges of split {j} do not separate the network"),
                    );
                } else if &inside != splits.get(j).part_a() && &inside != splits.get(j).part_b() {
                    record(
                        diagnostics,
                        "network",
                        format!("split {j} induces the wrong bipartition"),
                    );
                }
            }
        }
    }
}

fn apply_labels<F>(graph: &mut SplitGraph, label_of: &F)
where
    F: Fn(Taxon) -> String,
{
    for v in 0..graph.num_nodes() {
        if graph.taxa(v).is_empty() {
            continue;
        }
        let label = graph
            .taxa(v)
            .iter()
            .map(label_of)
            .collect::<Vec<_>>()
            .join(", ");
        graph.set_label(v, label);
    }
    let mut labelled = BitSet::new();
    for e in 0..graph.num_edges() {
        if let Some(id) = graph.edge_split(e) {
            if labelled.insert(id) {
                graph.set_edge_label(e, id.to_string());
            }
        }
    }
}

use bit_set::BitSet;

use crate::error::SplitError;
use crate::network::{
    build_network, extend_network, extract_splits, split_bipartition, star_network, SplitGraph,
};
use crate::progress::{CancelFlag, NoProgress};
use crate::splits::{Split, SplitSystem};
use crate::taxa::{Taxon, TaxonSet};

fn set(taxa: &[u32]) -> TaxonSet {
    taxa.iter().map(|&t| Taxon::new(t)).collect()
}

fn system(ntax: u32, parts: &[(&[u32], f64)]) -> SplitSystem {
    let mut splits = SplitSystem::new(ntax);
    for &(part, weight) in parts {
        splits.push(Split::new(ntax, set(part), weight).unwrap());
    }
    splits
}

fn label(t: Taxon) -> String {
    format!("t{}", t.id())
}

// ─── graph primitives ────────────────────────────────────────────────────────

#[test]
fn graph_edges_and_reattach() {
    let mut graph = SplitGraph::new(3);
    let a = graph.add_node(set(&[1, 2]));
    let b = graph.add_node(set(&[3]));
    let c = graph.add_node(TaxonSet::new());
    let e = graph.add_edge(a, b, Some(0), 1.5);

    assert_eq!(graph.taxon_node(Taxon::new(1)), Some(a));
    assert_eq!(graph.taxon_node(Taxon::new(3)), Some(b));
    assert_eq!(graph.endpoints(e), (a, b));
    assert_eq!(graph.opposite(e, a), b);
    assert_eq!(graph.edge_between(a, b), Some(e));
    assert_eq!(graph.edge_between(a, c), None);

    graph.reattach(e, a, c);
    assert_eq!(graph.endpoints(e), (c, b));
    assert_eq!(graph.degree(a), 0);
    assert_eq!(graph.degree(c), 1);
    assert_eq!(graph.edge_between(a, b), None);
    assert_eq!(graph.edge_between(c, b), Some(e));
}

#[test]
fn graph_moves_taxa_between_nodes() {
    let mut graph = SplitGraph::new(2);
    let a = graph.add_node(set(&[1, 2]));
    let b = graph.add_node(TaxonSet::new());
    graph.remove_taxon(a, Taxon::new(2));
    graph.add_taxon(b, Taxon::new(2));
    assert_eq!(graph.taxa(a), &set(&[1]));
    assert_eq!(graph.taxa(b), &set(&[2]));
    assert_eq!(graph.taxon_node(Taxon::new(2)), Some(b));
}

#[test]
fn graph_clear_unplaces_taxa() {
    let mut graph = SplitGraph::new(2);
    let a = graph.add_node(set(&[1, 2]));
    let b = graph.add_node(TaxonSet::new());
    graph.add_edge(a, b, None, 1.0);
    graph.clear();
    assert_eq!(graph.num_nodes(), 0);
    assert_eq!(graph.num_edges(), 0);
    assert_eq!(graph.taxon_node(Taxon::new(1)), None);
    assert!(graph.is_connected());
}

#[test]
fn disconnected_graph_detected() {
    let mut graph = SplitGraph::new(2);
    graph.add_node(set(&[1]));
    graph.add_node(set(&[2]));
    assert!(!graph.is_connected());
}

// ─── convex hull ─────────────────────────────────────────────────────────────

#[test]
fn single_taxon_network() {
    let splits = SplitSystem::new(1);
    let report = build_network(&mut NoProgress, 1, &splits, label).unwrap();
    assert!(report.is_clean());
    let graph = report.value;
    assert_eq!(graph.num_nodes(), 1);
    assert_eq!(graph.num_edges(), 0);
    assert_eq!(graph.label(0), Some("t1"));
}

#[test]
fn compatible_splits_give_a_tree() {
    let splits = system(
        4,
        &[
            (&[1], 1.0),
            (&[2], 1.0),
            (&[3], 1.0),
            (&[4], 1.0),
            (&[1, 2], 1.0),
        ],
    );
    let report = build_network(&mut NoProgress, 4, &splits, label).unwrap();
    assert!(report.is_clean(), "{:?}", report.diagnostics);
    let graph = report.value;
    assert_eq!(graph.num_nodes(), 6);
    assert_eq!(graph.num_edges(), 5);
    assert!(graph.is_connected());

    let (inside, outside) = split_bipartition(&graph, 4).unwrap();
    if inside.contains(Taxon::new(1)) {
        assert_eq!(inside, set(&[1, 2]));
        assert_eq!(outside, set(&[3, 4]));
    } else {
        assert_eq!(inside, set(&[3, 4]));
        assert_eq!(outside, set(&[1, 2]));
    }

    let recovered = extract_splits(&graph, 4);
    assert!(recovered.is_clean());
    assert_eq!(recovered.value, splits);
}

#[test]
fn incompatible_pair_builds_a_quadrilateral() {
    let splits = system(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0)]);
    let report = build_network(&mut NoProgress, 4, &splits, label).unwrap();
    assert!(report.is_clean(), "{:?}", report.diagnostics);
    let graph = report.value;
    assert_eq!(graph.num_nodes(), 4);
    assert_eq!(graph.num_edges(), 4);

    let n4 = graph.taxon_node(Taxon::new(4)).unwrap();
    let n2 = graph.taxon_node(Taxon::new(2)).unwrap();
    let n3 = graph.taxon_node(Taxon::new(3)).unwrap();
    let n1 = graph.taxon_node(Taxon::new(1)).unwrap();
    for v in [n1, n2, n3, n4] {
        assert_eq!(graph.degree(v), 2);
    }
    // opposite sides of the quadrilateral carry the same split
    let e = graph.edge_between(n4, n2).unwrap();
    assert_eq!(graph.edge_split(e), Some(0));
    let e = graph.edge_between(n1, n3).unwrap();
    assert_eq!(graph.edge_split(e), Some(0));
    let e = graph.edge_between(n4, n3).unwrap();
    assert_eq!(graph.edge_split(e), Some(1));
    let e = graph.edge_between(n1, n2).unwrap();
    assert_eq!(graph.edge_split(e), Some(1));

    let (inside, outside) = split_bipartition(&graph, 0).unwrap();
    assert!(inside == set(&[3, 4]) || outside == set(&[3, 4]));
    assert!(inside == set(&[1, 2]) || outside == set(&[1, 2]));
    let (inside, outside) = split_bipartition(&graph, 1).unwrap();
    assert!(inside == set(&[2, 4]) || outside == set(&[2, 4]));
    assert!(inside == set(&[1, 3]) || outside == set(&[1, 3]));
}

#[test]
fn quadrilateral_with_trivials_has_empty_inner_nodes() {
    let splits = system(
        4,
        &[
            (&[1], 1.0),
            (&[2], 1.0),
            (&[3], 1.0),
            (&[4], 1.0),
            (&[1, 2], 1.5),
            (&[1, 3], 2.5),
        ],
    );
    let report = build_network(&mut NoProgress, 4, &splits, label).unwrap();
    assert!(report.is_clean(), "{:?}", report.diagnostics);
    let graph = report.value;
    assert_eq!(graph.num_nodes(), 8);
    assert_eq!(graph.num_edges(), 8);

    let mut empties = 0;
    for v in 0..graph.num_nodes() {
        if graph.taxa(v).is_empty() {
            empties += 1;
            assert_eq!(graph.degree(v), 3);
            assert_eq!(graph.label(v), None);
        } else {
            assert_eq!(graph.degree(v), 1);
        }
    }
    assert_eq!(empties, 4);

    // every taxon hangs off the inner quadrilateral by its trivial split
    for t in 1..=4u32 {
        let leaf = graph.taxon_node(Taxon::new(t)).unwrap();
        let e = graph.edges_of(leaf)[0];
        assert_eq!(graph.edge_split(e), Some((t - 1) as usize));
        assert!((graph.edge_weight(e) - 1.0).abs() < 1e-10);
        assert_eq!(graph.label(leaf), Some(format!("t{t}").as_str()));
    }

    let recovered = extract_splits(&graph, 4);
    assert!(recovered.is_clean());
    assert_eq!(recovered.value, splits);
    for (id, split) in recovered.value.iter().enumerate() {
        assert!((split.weight() - splits.get(id).weight()).abs() < 1e-10);
    }
}

#[test]
fn representative_edge_per_split_is_labelled() {
    let splits = system(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0)]);
    let report = build_network(&mut NoProgress, 4, &splits, label).unwrap();
    let graph = report.value;
    let labelled: Vec<&str> = (0..graph.num_edges())
        .filter_map(|e| graph.edge_label(e))
        .collect();
    assert_eq!(labelled, vec!["0", "1"]);
}

#[test]
fn star_network_tags_edges_with_trivial_split_ids() {
    let splits = system(3, &[(&[2], 0.25)]);
    let graph = star_network(3, &splits);
    assert_eq!(graph.num_nodes(), 4);
    assert_eq!(graph.num_edges(), 3);
    assert!(graph.is_connected());
    let leaf = graph.taxon_node(Taxon::new(2)).unwrap();
    let e = graph.edges_of(leaf)[0];
    assert_eq!(graph.edge_split(e), Some(0));
    // pendant edges are unit weight even where the trivial split is not
    assert!((graph.edge_weight(e) - 1.0).abs() < 1e-10);
    let other = graph.taxon_node(Taxon::new(1)).unwrap();
    assert_eq!(graph.edge_split(graph.edges_of(other)[0]), None);

    let recovered = extract_splits(&graph, 3);
    assert_eq!(recovered.value.len(), 1);
    assert_eq!(recovered.value.get(0).part_b(), &set(&[2]));
}

#[test]
fn extension_continues_an_existing_network() {
    let splits = system(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0)]);
    let first = system(4, &[(&[1, 2], 1.0)]);

    let mut graph = SplitGraph::new(4);
    let mut used = BitSet::new();
    extend_network(&mut NoProgress, &first, &mut graph, &mut used).unwrap();
    assert_eq!(graph.num_nodes(), 2);
    assert_eq!(graph.num_edges(), 1);

    extend_network(&mut NoProgress, &splits, &mut graph, &mut used).unwrap();
    assert!(used.contains(1));
    assert_eq!(graph.num_nodes(), 4);
    assert_eq!(graph.num_edges(), 4);
    let recovered = extract_splits(&graph, 4);
    assert_eq!(recovered.value, splits);
}

#[test]
fn cancellation_clears_the_graph() {
    let splits = system(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0)]);
    let mut graph = SplitGraph::new(4);
    let mut used = BitSet::new();
    let mut progress = CancelFlag::new();
    progress.cancel();
    let err = extend_network(&mut progress, &splits, &mut graph, &mut used).unwrap_err();
    assert!(matches!(err, SplitError::Cancelled));
    assert_eq!(graph.num_nodes(), 0);
    assert_eq!(graph.num_edges(), 0);
}

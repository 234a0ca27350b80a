use std::collections::HashMap;

use crate::diag::{record, Diagnostic, Report};
use crate::error::{SplitError, SplitResult};
use crate::splits::{Split, SplitSystem};
use crate::taxa::{Taxon, TaxonLabels, TaxonSet};

use super::lexer::{tokenize, Tok, Token};

/// A split system read from Split-Newick text, with the taxa it mentions.
#[derive(Clone, Debug)]
pub struct ParsedSplits {
    pub labels: TaxonLabels,
    pub splits: SplitSystem,
}

/// Parse Split-Newick text, numbering taxa in order of first appearance.
///
/// The backbone tree contributes one split per edge of non-zero weight;
/// each split marker pair contributes the split isolating the leaf taxa it
/// encloses. Zero-weight edges are layout scaffolding and are dropped.
pub fn parse(input: &str) -> SplitResult<Report<ParsedSplits>> {
    parse_impl(input, None)
}

/// Parse against a fixed taxon table; a label outside it is an error.
pub fn parse_with_labels(input: &str, labels: &TaxonLabels) -> SplitResult<Report<ParsedSplits>> {
    parse_impl(input, Some(labels))
}

fn parse_impl(input: &str, fixed: Option<&TaxonLabels>) -> SplitResult<Report<ParsedSplits>> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SplitError::Parse {
            msg: "empty input".to_owned(),
            pos: 0,
        });
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        labels: fixed.cloned().unwrap_or_default(),
        fixed: fixed.is_some(),
        leaf_at: vec![None; tokens.len()],
        edges: Vec::new(),
        diagnostics: Vec::new(),
    };
    parser.file()?;

    let ntax = parser.labels.ntax();
    let mut splits = SplitSystem::new(ntax);
    for (taxa, weight, confidence) in &parser.edges {
        if *weight == 0.0 || taxa.cardinality() == ntax as usize {
            continue;
        }
        if let Ok(split) = Split::with_confidence(ntax, taxa.clone(), *weight, *confidence) {
            splits.push(split);
        }
    }
    parser.markers(&mut splits, ntax)?;

    Ok(Report::new(
        ParsedSplits {
            labels: parser.labels,
            splits,
        },
        parser.diagnostics,
    ))
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    labels: TaxonLabels,
    fixed: bool,
    /// Taxon parsed at each token index; only leaf labels get one.
    leaf_at: Vec<Option<Taxon>>,
    /// One record per backbone edge: subtree taxa, weight, confidence.
    edges: Vec<(TaxonSet, f64, f64)>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn file(&mut self) -> SplitResult<()> {
        self.subtree()?;
        // a weight on the root carries no split, tolerate and drop it
        self.edge_suffix()?;
        match self.current() {
            Some(Tok::Semi) => self.pos += 1,
            _ => return Err(self.err_here("expected ';'")),
        }
        if self.pos != self.tokens.len() {
            return Err(self.err_here("trailing input after ';'"));
        }
        Ok(())
    }

    fn subtree(&mut self) -> SplitResult<TaxonSet> {
        match self.current() {
            Some(Tok::Open) => {
                self.pos += 1;
                let mut taxa = TaxonSet::new();
                loop {
                    let child = self.subtree()?;
                    let (weight, confidence) = self.edge_suffix()?;
                    self.edges.push((child.clone(), weight, confidence));
                    taxa.union_with(&child);
                    match self.current() {
                        Some(Tok::Comma) => self.pos += 1,
                        Some(Tok::Close) => {
                            self.pos += 1;
                            break;
                        }
                        _ => return Err(self.err_here("expected ',' or ')'")),
                    }
                }
                // display label on an inner node, ignored
                if let Some(Tok::Word { .. }) = self.current() {
                    self.pos += 1;
                }
                Ok(taxa)
            }
            Some(Tok::Word { text, .. }) => {
                let idx = self.pos;
                let t = self.resolve(text)?;
                self.leaf_at[idx] = Some(t);
                self.pos += 1;
                Ok(TaxonSet::singleton(t))
            }
            _ => Err(self.err_here("expected a subtree")),
        }
    }

    /// `:weight[:confidence[:probability]]`, all parts optional. The
    /// probability is accepted and dropped.
    fn edge_suffix(&mut self) -> SplitResult<(f64, f64)> {
        let mut weight = 1.0;
        let mut confidence = 1.0;
        if let Some(Tok::Colon) = self.current() {
            self.pos += 1;
            weight = self.number()?;
            if let Some(Tok::Colon) = self.current() {
                self.pos += 1;
                confidence = self.number()?;
                if let Some(Tok::Colon) = self.current() {
                    self.pos += 1;
                    self.number()?;
                }
            }
        }
        Ok((weight, confidence))
    }

    fn number(&mut self) -> SplitResult<f64> {
        match self.current() {
            Some(Tok::Word {
                text,
                quoted: false,
            }) => match text.parse() {
                Ok(x) => {
                    self.pos += 1;
                    Ok(x)
                }
                Err(_) => Err(self.err_here("expected a number")),
            },
            _ => Err(self.err_here("expected a number")),
        }
    }

    fn resolve(&mut self, label: &str) -> SplitResult<Taxon> {
        if self.fixed {
            self.labels
                .index_of(label)
                .ok_or_else(|| SplitError::UnknownTaxon {
                    label: label.to_owned(),
                })
        } else {
            Ok(self.labels.intern(label))
        }
    }

    /// Current significant token; split markers are transparent to the tree
    /// grammar.
    fn current(&mut self) -> Option<&'a Tok> {
        while matches!(
            self.tokens.get(self.pos).map(|t| &t.tok),
            Some(Tok::MarkerOpen { .. }) | Some(Tok::MarkerClose { .. })
        ) {
            self.pos += 1;
        }
        let tokens: &'a [Token] = self.tokens;
        tokens.get(self.pos).map(|t| &t.tok)
    }

    fn err_here(&self, msg: &str) -> SplitError {
        let pos = match self.tokens.get(self.pos) {
            Some(t) => t.pos,
            None => self.tokens.last().map_or(0, |t| t.pos + 1),
        };
        SplitError::Parse {
            msg: msg.to_owned(),
            pos,
        }
    }

    /// Match marker pairs and turn each into a split over the leaf taxa
    /// between its open and its close. Pairs with the same id nest LIFO.
    fn markers(&mut self, splits: &mut SplitSystem, ntax: u32) -> SplitResult<()> {
        let mut open: HashMap<u64, Vec<(usize, usize)>> = HashMap::new();
        for (idx, token) in self.tokens.iter().enumerate() {
            match &token.tok {
                Tok::MarkerOpen { id } => open.entry(*id).or_default().push((idx, token.pos)),
                Tok::MarkerClose {
                    id,
                    weight,
                    confidence,
                    ..
                } => {
                    let Some((from, _)) = open.get_mut(id).and_then(Vec::pop) else {
                        return Err(SplitError::Parse {
                            msg: format!("split marker {id} closed without a matching open"),
                            pos: token.pos,
                        });
                    };
                    let mut taxa = TaxonSet::new();
                    for slot in &self.leaf_at[from + 1..idx] {
                        if let Some(t) = slot {
                            taxa.insert(*t);
                        }
                    }
                    if taxa.is_empty() {
                        record(
                            &mut self.diagnostics,
                            "parse",
                            format!("split marker {id} encloses no taxa"),
                        );
                        continue;
                    }
                    if taxa.cardinality() == ntax as usize {
                        record(
                            &mut self.diagnostics,
                            "parse",
                            format!("split marker {id} encloses every taxon"),
                        );
                        continue;
                    }
                    if *weight == 0.0 {
                        continue;
                    }
                    if let Ok(split) =
                        Split::with_confidence(ntax, taxa, *weight, confidence.unwrap_or(1.0))
                    {
                        splits.push(split);
                    }
                }
                _ => {}
            }
        }
        let mut unclosed: Option<usize> = None;
        for stack in open.values() {
            for &(_, pos) in stack {
                unclosed = Some(unclosed.map_or(pos, |p| p.min(pos)));
            }
        }
        if let Some(pos) = unclosed {
            return Err(SplitError::Parse {
                msg: "split marker opened without a matching close".to_owned(),
                pos,
            });
        }
        Ok(())
    }
}

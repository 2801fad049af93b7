//! Gene–pathway co-occurrence accumulator.
//!
//! One accumulator per run. Each document contributes at most one count per
//! gene; partial accumulators built by parallel document tasks are folded
//! together with [`GenePathwayAggregator::merge`].

use std::collections::{BTreeSet, HashMap, HashSet};

use pathrank_common::{GeneId, PathwayId};

use crate::parse::Entry;

#[derive(Debug, Clone, Default)]
pub struct GenePathwayAggregator {
    counts: HashMap<GeneId, usize>,
    memberships: HashMap<GeneId, BTreeSet<PathwayId>>,
    documents: usize,
}

impl GenePathwayAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every gene of `entries` that is not yet in `seen`, then mark it
    /// seen. `seen` must belong to exactly one document.
    pub fn update(&mut self, pathway: &PathwayId, entries: &[Entry], seen: &mut HashSet<GeneId>) {
        for entry in entries {
            for gene in &entry.gene_ids {
                if seen.insert(gene.clone()) {
                    *self.counts.entry(gene.clone()).or_insert(0) += 1;
                    self.memberships
                        .entry(gene.clone())
                        .or_default()
                        .insert(pathway.clone());
                }
            }
        }
    }

    /// Record one whole document with its own fresh seen set.
    pub fn record_document(&mut self, pathway: &PathwayId, entries: &[Entry]) {
        let mut seen = HashSet::new();
        self.update(pathway, entries, &mut seen);
        self.documents += 1;
    }

    /// Fold a partial accumulator into this one.
    pub fn merge(&mut self, other: GenePathwayAggregator) {
        for (gene, n) in other.counts {
            *self.counts.entry(gene).or_insert(0) += n;
        }
        for (gene, pathways) in other.memberships {
            self.memberships.entry(gene).or_default().extend(pathways);
        }
        self.documents += other.documents;
    }

    pub fn count(&self, gene: &GeneId) -> usize {
        self.counts.get(gene).copied().unwrap_or(0)
    }

    pub fn pathways_of(&self, gene: &GeneId) -> Option<&BTreeSet<PathwayId>> {
        self.memberships.get(gene)
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn gene_count(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` most frequent genes, count descending then gene id ascending.
    pub fn top_genes(&self, n: usize, exclude: Option<&GeneId>) -> Vec<(GeneId, usize)> {
        let mut ranked: Vec<(GeneId, usize)> = self
            .counts
            .iter()
            .filter(|(gene, _)| Some(*gene) != exclude)
            .map(|(gene, n)| (gene.clone(), *n))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(genes: &[&str]) -> Vec<Entry> {
        genes
            .iter()
            .enumerate()
            .map(|(i, g)| Entry { entry_id: i.to_string(), gene_ids: vec![GeneId::new(*g)] })
            .collect()
    }

    #[test]
    fn test_counts_across_three_pathways() {
        let mut agg = GenePathwayAggregator::new();
        agg.record_document(&"P1".into(), &entries(&["g1", "g2"]));
        agg.record_document(&"P2".into(), &entries(&["g2", "g3"]));
        agg.record_document(&"P3".into(), &entries(&["g2", "g3"]));
        assert_eq!(agg.count(&"g1".into()), 1);
        assert_eq!(agg.count(&"g2".into()), 3);
        assert_eq!(agg.count(&"g3".into()), 2);
        assert_eq!(agg.documents(), 3);
    }

    #[test]
    fn test_repeated_gene_counts_once_per_document() {
        let mut agg = GenePathwayAggregator::new();
        let doc = vec![
            Entry { entry_id: "1".into(), gene_ids: vec!["5594".into(), "5595".into()] },
            Entry { entry_id: "2".into(), gene_ids: vec!["5594".into()] },
            Entry { entry_id: "3".into(), gene_ids: vec!["5594".into()] },
        ];
        agg.record_document(&"hsa04010".into(), &doc);
        assert_eq!(agg.count(&"5594".into()), 1);
        assert_eq!(agg.count(&"5595".into()), 1);
        assert_eq!(agg.pathways_of(&"5594".into()).unwrap().len(), 1);
    }

    #[test]
    fn test_merge_matches_sequential_updates() {
        let mut sequential = GenePathwayAggregator::new();
        sequential.record_document(&"P1".into(), &entries(&["g1", "g2"]));
        sequential.record_document(&"P2".into(), &entries(&["g2", "g3"]));

        let mut left = GenePathwayAggregator::new();
        left.record_document(&"P1".into(), &entries(&["g1", "g2"]));
        let mut right = GenePathwayAggregator::new();
        right.record_document(&"P2".into(), &entries(&["g2", "g3"]));
        left.merge(right);

        assert_eq!(left.top_genes(10, None), sequential.top_genes(10, None));
        assert_eq!(left.documents(), 2);
    }

    #[test]
    fn test_top_genes_order_and_exclusion() {
        let mut agg = GenePathwayAggregator::new();
        agg.record_document(&"P1".into(), &entries(&["b", "a", "ref"]));
        agg.record_document(&"P2".into(), &entries(&["c", "ref"]));
        agg.record_document(&"P3".into(), &entries(&["c", "ref"]));
        let top = agg.top_genes(3, Some(&"ref".into()));
        assert_eq!(
            top,
            vec![("c".into(), 2), ("a".into(), 1), ("b".into(), 1)]
        );
    }
}

//! Score combination.
//!
//! Folds interaction records into one relation score per gene, then blends
//! relation, similarity and correlation into a ranked [`CandidateScore`] list.
//! Pure: no I/O, no shared state.

use std::collections::{BTreeSet, HashMap};

use pathrank_common::{CandidateScore, GeneId, InteractionRecord, RelationAggregation, ScoreWeights};

use crate::relation_score;

/// One relation score per gene from possibly many interaction records.
pub fn aggregate_relation_scores(
    records: &[InteractionRecord],
    policy: RelationAggregation,
) -> HashMap<GeneId, f64> {
    // (running value, record count)
    let mut acc: HashMap<GeneId, (f64, usize)> = HashMap::new();
    for record in records {
        let s = relation_score::score(record.relation_type.as_deref());
        match acc.get_mut(&record.gene_id) {
            None => {
                acc.insert(record.gene_id.clone(), (s, 1));
            }
            Some((value, n)) => {
                *n += 1;
                match policy {
                    RelationAggregation::First => {}
                    RelationAggregation::Max => *value = value.max(s),
                    RelationAggregation::Sum | RelationAggregation::Mean => *value += s,
                }
            }
        }
    }

    acc.into_iter()
        .map(|(gene, (value, n))| {
            let score = match policy {
                RelationAggregation::Mean => value / n as f64,
                _ => value,
            };
            (gene, score)
        })
        .collect()
}

/// Blend the three signals for every gene named anywhere and rank them.
///
/// Missing signals count as 0. Order is total score descending, ties broken
/// by gene id ascending; at most `top_n` scores are returned.
pub fn combine(
    candidates: &[GeneId],
    relation: &HashMap<GeneId, f64>,
    similarity: &HashMap<GeneId, f64>,
    correlation: &HashMap<GeneId, f64>,
    weights: &ScoreWeights,
    top_n: usize,
) -> Vec<CandidateScore> {
    let genes: BTreeSet<&GeneId> = candidates
        .iter()
        .chain(relation.keys())
        .chain(similarity.keys())
        .chain(correlation.keys())
        .collect();

    let signal = |map: &HashMap<GeneId, f64>, gene: &GeneId| map.get(gene).copied().unwrap_or(0.0);

    let mut scored: Vec<CandidateScore> = genes
        .into_iter()
        .map(|gene| {
            CandidateScore::from_signals(
                gene.clone(),
                signal(relation, gene),
                signal(similarity, gene),
                signal(correlation, gene),
                weights,
            )
        })
        .collect();

    scored.sort_by(|a, b| {
        b.total_score()
            .total_cmp(&a.total_score())
            .then_with(|| a.gene_id().cmp(b.gene_id()))
    });
    scored.truncate(top_n);
    scored
}

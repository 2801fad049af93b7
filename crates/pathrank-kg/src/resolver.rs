//! Relation resolution: which genes interact with the reference gene in one
//! document, and how.

use std::collections::{HashMap, HashSet};
use tracing::warn;

use pathrank_common::{GeneId, InteractionRecord};

use crate::parse::{Entry, Relation};

/// Entry ids of this document whose name lists `gene`.
pub fn candidate_entry_ids(entries: &[Entry], gene: &GeneId) -> HashSet<String> {
    entries
        .iter()
        .filter(|e| e.contains_gene(gene))
        .map(|e| e.entry_id.clone())
        .collect()
}

/// Trace relations touching the candidate entries back to gene ids.
///
/// A relation counts only when exactly one endpoint is a candidate entry;
/// the other endpoint is mapped to every gene its entry lists. Endpoints
/// with no gene entry in this document are dropped with a warning. Output
/// follows relation order and keeps duplicates.
pub fn resolve(
    candidate_entry_ids: &HashSet<String>,
    relations: &[Relation],
    entries: &[Entry],
) -> Vec<InteractionRecord> {
    let partners: Vec<(&str, Option<&String>)> = relations
        .iter()
        .filter_map(|rel| {
            let source_hit = candidate_entry_ids.contains(&rel.source_entry_id);
            let target_hit = candidate_entry_ids.contains(&rel.target_entry_id);
            match (source_hit, target_hit) {
                (true, false) => Some((rel.target_entry_id.as_str(), rel.subtype.as_ref())),
                (false, true) => Some((rel.source_entry_id.as_str(), rel.subtype.as_ref())),
                _ => None,
            }
        })
        .collect();

    if partners.is_empty() {
        return Vec::new();
    }

    let genes_by_entry: HashMap<&str, &[GeneId]> = entries
        .iter()
        .map(|e| (e.entry_id.as_str(), e.gene_ids.as_slice()))
        .collect();

    let mut records = Vec::new();
    for (entry_id, subtype) in partners {
        match genes_by_entry.get(entry_id) {
            Some(genes) => {
                for gene in genes.iter() {
                    records.push(InteractionRecord::new(gene.clone(), subtype.cloned()));
                }
            }
            None => warn!(entry_id, "Relation references an entry with no genes in this document; dropped"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rel(a: &str, b: &str, subtype: Option<&str>) -> Relation {
        Relation {
            source_entry_id: a.into(),
            target_entry_id: b.into(),
            subtype: subtype.map(String::from),
        }
    }

    fn entry(id: &str, genes: &[&str]) -> Entry {
        Entry { entry_id: id.into(), gene_ids: genes.iter().map(|g| GeneId::new(*g)).collect() }
    }

    #[test]
    fn test_single_phosphorylation_partner() {
        let candidates: HashSet<String> = ["65".to_string()].into();
        let out = resolve(
            &candidates,
            &[rel("65", "332", Some("phosphorylation"))],
            &[entry("332", &["472"])],
        );
        assert_eq!(out, vec![InteractionRecord::new("472".into(), Some("phosphorylation".into()))]);
    }

    #[test]
    fn test_direction_is_irrelevant_but_self_relations_are_dropped() {
        let candidates: HashSet<String> = ["1".to_string(), "2".to_string()].into();
        let out = resolve(
            &candidates,
            &[
                rel("3", "1", Some("activation")),
                rel("1", "2", Some("binding/association")),
                rel("4", "5", Some("inhibition")),
            ],
            &[entry("3", &["30"]), entry("4", &["40"]), entry("5", &["50"])],
        );
        assert_eq!(out, vec![InteractionRecord::new("30".into(), Some("activation".into()))]);
    }

    #[test]
    fn test_multi_gene_entry_yields_one_record_per_gene_and_keeps_duplicates() {
        let candidates: HashSet<String> = ["1".to_string()].into();
        let out = resolve(
            &candidates,
            &[rel("1", "2", Some("activation")), rel("2", "1", Some("expression"))],
            &[entry("2", &["5594", "5595"])],
        );
        let genes: Vec<&str> = out.iter().map(|r| r.gene_id.as_str()).collect();
        assert_eq!(genes, vec!["5594", "5595", "5594", "5595"]);
        assert_eq!(out[2].relation_type.as_deref(), Some("expression"));
    }

    #[test]
    fn test_unknown_entry_is_skipped() {
        let candidates: HashSet<String> = ["1".to_string()].into();
        let out = resolve(
            &candidates,
            &[rel("1", "99", Some("activation")), rel("1", "2", None)],
            &[entry("2", &["20"])],
        );
        assert_eq!(out, vec![InteractionRecord::new("20".into(), None)]);
    }

    #[test]
    fn test_candidate_entry_ids() {
        let entries = vec![entry("1", &["472"]), entry("2", &["7157", "472"]), entry("3", &["1"])];
        let ids = candidate_entry_ids(&entries, &"472".into());
        assert_eq!(ids, ["1".to_string(), "2".to_string()].into());
    }
}

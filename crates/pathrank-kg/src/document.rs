//! Single-document analysis: extraction, membership counting and relation
//! resolution for one pathway diagram.
//!
//! Each call works on its own partial [`GenePathwayAggregator`] and its own
//! seen set, so documents can be analysed in parallel and reduced later.

use pathrank_common::{GeneId, InteractionRecord, PathwayId};

use crate::aggregate::GenePathwayAggregator;
use crate::parse::KgmlParser;
use crate::resolver::{candidate_entry_ids, resolve};

/// Output of [`analyse_document`].
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub pathway: PathwayId,
    pub aggregator: GenePathwayAggregator,
    pub interactions: Vec<InteractionRecord>,
    pub entry_count: usize,
    pub relation_count: usize,
    /// Whether any entry of the document lists the reference gene.
    pub reference_present: bool,
}

pub fn analyse_document(
    parser: &KgmlParser,
    pathway: &PathwayId,
    document: &str,
    reference: &GeneId,
) -> DocumentAnalysis {
    let parsed = parser.parse_document(document);

    let mut aggregator = GenePathwayAggregator::new();
    aggregator.record_document(pathway, &parsed.entries);

    let candidates = candidate_entry_ids(&parsed.entries, reference);
    let interactions = if candidates.is_empty() {
        Vec::new()
    } else {
        resolve(&candidates, &parsed.relations, &parsed.entries)
    };

    tracing::debug!(
        pathway = %pathway,
        entries = parsed.entries.len(),
        relations = parsed.relations.len(),
        interactions = interactions.len(),
        "Document analysed"
    );

    DocumentAnalysis {
        pathway: pathway.clone(),
        aggregator,
        interactions,
        entry_count: parsed.entries.len(),
        relation_count: parsed.relations.len(),
        reference_present: !candidates.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathrank_test_utils::KgmlBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_activation_partner_is_resolved() {
        let doc = KgmlBuilder::new("hsa04110")
            .gene("1", &["7157"])
            .gene("2", &["100"])
            .gene("3", &["200"])
            .relation("1", "2", Some("activation"))
            .build();

        let a = analyse_document(&KgmlParser::new("hsa"), &"hsa04110".into(), &doc, &"7157".into());
        assert_eq!(a.entry_count, 3);
        assert_eq!(a.relation_count, 1);
        assert!(a.reference_present);
        assert_eq!(
            a.interactions,
            vec![InteractionRecord::new("100".into(), Some("activation".into()))]
        );
        assert_eq!(a.aggregator.count(&"200".into()), 1);
    }

    #[test]
    fn test_reference_absent_yields_no_interactions() {
        let doc = KgmlBuilder::new("hsa04010")
            .gene("1", &["10"])
            .gene("2", &["20"])
            .relation("1", "2", Some("inhibition"))
            .build();

        let a = analyse_document(&KgmlParser::new("hsa"), &"hsa04010".into(), &doc, &"7157".into());
        assert!(!a.reference_present);
        assert!(a.interactions.is_empty());
        assert_eq!(a.aggregator.gene_count(), 2);
    }
}

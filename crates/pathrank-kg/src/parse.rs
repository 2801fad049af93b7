//! Attribute parsing for extracted KGML records.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use pathrank_common::GeneId;

use crate::extraction::{extract_sections, EntryRecord, KgmlSections, RelationRecord};

/// A gene node of one pathway document. `entry_id` is only unique within
/// that document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub entry_id: String,
    /// Gene ids listed in the name field, in order, without duplicates. Never empty.
    pub gene_ids: Vec<GeneId>,
}

impl Entry {
    pub fn contains_gene(&self, gene: &GeneId) -> bool {
        self.gene_ids.iter().any(|g| g == gene)
    }
}

/// An association between two entries of the same document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub source_entry_id: String,
    pub target_entry_id: String,
    pub subtype: Option<String>,
}

/// Entries and relations of one document after attribute parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    pub entries: Vec<Entry>,
    pub relations: Vec<Relation>,
}

/// Parses records for one organism (the `hsa` in `hsa:472`).
#[derive(Debug, Clone)]
pub struct KgmlParser {
    organism: String,
    gene_re: Regex,
}

impl KgmlParser {
    pub fn new(organism: &str) -> Self {
        let pattern = format!(r"(?:^|\s){}:([A-Za-z0-9_.\-]+)", regex::escape(organism));
        Self {
            organism: organism.to_string(),
            // escaped organism code keeps the pattern valid
            gene_re: Regex::new(&pattern).expect("gene id pattern"),
        }
    }

    /// Parse an entry line. Returns `None` when `id`/`name` are missing or
    /// the name lists no gene of this organism.
    pub fn parse_entry(&self, record: &EntryRecord) -> Option<Entry> {
        let entry_id = id_regex().captures(&record.line)?.get(1)?.as_str().to_string();
        let name = name_regex().captures(&record.line)?.get(1)?.as_str();

        let mut gene_ids: Vec<GeneId> = Vec::new();
        for cap in self.gene_re.captures_iter(name) {
            let gene = GeneId::new(&cap[1]);
            if !gene_ids.contains(&gene) {
                gene_ids.push(gene);
            }
        }

        if gene_ids.is_empty() {
            tracing::debug!(entry_id = %entry_id, "Entry lists no {} genes; skipped", self.organism);
            return None;
        }
        Some(Entry { entry_id, gene_ids })
    }

    /// Parse a whole document: extraction followed by attribute parsing.
    pub fn parse_document(&self, document: &str) -> ParsedDocument {
        self.parse_sections(&extract_sections(document))
    }

    pub fn parse_sections(&self, sections: &KgmlSections) -> ParsedDocument {
        ParsedDocument {
            entries: sections.entries.iter().filter_map(|e| self.parse_entry(e)).collect(),
            relations: sections.relations.iter().filter_map(parse_relation).collect(),
        }
    }
}

/// Parse a relation block. Returns `None` when either endpoint is missing.
/// The first `<subtype name=..>` in the block is its subtype.
pub fn parse_relation(record: &RelationRecord) -> Option<Relation> {
    let source = entry1_regex().captures(&record.text).map(|c| c[1].to_string());
    let target = entry2_regex().captures(&record.text).map(|c| c[1].to_string());
    let (Some(source_entry_id), Some(target_entry_id)) = (source, target) else {
        tracing::debug!("Relation block without both endpoints; skipped");
        return None;
    };
    let subtype = subtype_regex().captures(&record.text).map(|c| c[1].to_string());
    Some(Relation { source_entry_id, target_entry_id, subtype })
}

fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?:^|\s)id="([^"]+)""#).unwrap())
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?:^|\s)name="([^"]*)""#).unwrap())
}

fn entry1_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"entry1="([^"]+)""#).unwrap())
}

fn entry2_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"entry2="([^"]+)""#).unwrap())
}

fn subtype_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<subtype\s+name="([^"]+)""#).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(line: &str) -> EntryRecord {
        EntryRecord { line: line.to_string() }
    }

    #[test]
    fn test_parse_entry_with_multiple_genes() {
        let p = KgmlParser::new("hsa");
        let e = p
            .parse_entry(&entry(r#"<entry id="12" name="hsa:5594 hsa:5595 hsa:5594" type="gene" link="x">"#))
            .unwrap();
        assert_eq!(e.entry_id, "12");
        assert_eq!(e.gene_ids, vec![GeneId::new("5594"), GeneId::new("5595")]);
    }

    #[test]
    fn test_parse_entry_ignores_other_organisms() {
        let p = KgmlParser::new("hsa");
        assert!(p.parse_entry(&entry(r#"<entry id="3" name="mmu:12345" type="gene">"#)).is_none());
        assert!(p.parse_entry(&entry(r#"<entry name="hsa:1" type="gene">"#)).is_none());
    }

    #[test]
    fn test_graphics_name_does_not_shadow_entry_name() {
        let p = KgmlParser::new("hsa");
        let e = p
            .parse_entry(&entry(r#"<entry id="7" name="hsa:472" type="gene"><graphics name="ATM"/>"#))
            .unwrap();
        assert_eq!(e.gene_ids, vec![GeneId::new("472")]);
    }

    #[test]
    fn test_parse_relation_fields() {
        let r = parse_relation(&RelationRecord {
            text: "<relation entry1=\"65\" entry2=\"332\" type=\"PPrel\">\n<subtype name=\"phosphorylation\" value=\"+p\"/>\n</relation>".into(),
            inherited_subtype: false,
        })
        .unwrap();
        assert_eq!(
            r,
            Relation {
                source_entry_id: "65".into(),
                target_entry_id: "332".into(),
                subtype: Some("phosphorylation".into()),
            }
        );
    }

    #[test]
    fn test_parse_relation_without_subtype_or_endpoint() {
        let no_subtype = parse_relation(&RelationRecord {
            text: r#"<relation entry1="1" entry2="2" type="PPrel"/>"#.into(),
            inherited_subtype: false,
        })
        .unwrap();
        assert_eq!(no_subtype.subtype, None);

        let broken = parse_relation(&RelationRecord {
            text: r#"<relation entry1="1" type="PPrel"/>"#.into(),
            inherited_subtype: false,
        });
        assert!(broken.is_none());
    }

    #[test]
    fn test_parse_document_multi_line_subtype_binding() {
        let p = KgmlParser::new("hsa");
        let doc = r#"<entry id="1" name="hsa:10" type="gene">
<entry id="2" name="hsa:20" type="gene">
<relation entry1="1" entry2="2" type="PPrel">
    <subtype name="binding/association" value="---"/>
</relation>"#;
        let parsed = p.parse_document(doc);
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.relations[0].subtype.as_deref(), Some("binding/association"));
    }
}

//! Block extraction from KGML pathway documents.
//!
//! A blind, single-pass line scanner: it captures gene entry lines and
//! relation blocks as raw text and leaves attribute parsing to
//! [`crate::parse`]. Lines matching no marker are skipped.

use serde::Serialize;

const ENTRY_MARKER: &str = "<entry";
const GENE_TYPE_TAG: &str = r#"type="gene""#;
const RELATION_MARKER: &str = "<relation";
const RELATION_CLOSE: &str = "</relation>";
const SUBTYPE_MARKER: &str = "<subtype";

/// One gene entry line, captured verbatim (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    pub line: String,
}

/// One relation block: its lines joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationRecord {
    pub text: String,
    /// The subtype line was borrowed from an earlier block of the same document.
    pub inherited_subtype: bool,
}

/// Raw entry and relation records of one document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KgmlSections {
    pub entries: Vec<EntryRecord>,
    pub relations: Vec<RelationRecord>,
}

/// Split a KGML document into gene entry lines and relation blocks.
///
/// A block runs from its `<relation` line to the next line that starts with
/// `</relation>`. An opening line that already carries `</relation>` or
/// self-closes is a complete block on its own.
///
/// A relation block that never contains a `<subtype` line inherits the most
/// recent subtype line seen earlier in the same document; the inherited line
/// is inserted right after the block's opening line. Blocks before any
/// subtype has been seen stay without one.
pub fn extract_sections(document: &str) -> KgmlSections {
    let mut sections = KgmlSections::default();
    let mut last_subtype_line: Option<String> = None;
    let mut lines = document.lines().map(str::trim);

    while let Some(line) = lines.next() {
        if line.starts_with(ENTRY_MARKER) && line.contains(GENE_TYPE_TAG) {
            sections.entries.push(EntryRecord { line: line.to_string() });
            continue;
        }
        if !line.starts_with(RELATION_MARKER) {
            continue;
        }

        let mut block = vec![line.to_string()];
        let mut found_subtype = false;
        if line.contains(SUBTYPE_MARKER) {
            found_subtype = true;
            last_subtype_line = Some(subtype_fragment(line).to_string());
        }

        if !(opening_tag_self_closes(line) || line.contains(RELATION_CLOSE)) {
            // attributes of the opening tag may continue on following lines
            let mut opening_pending = !line.contains('>');
            for content in lines.by_ref() {
                if opening_pending && content.contains('>') {
                    opening_pending = false;
                    if opening_tag_self_closes(content) {
                        block.push(content.to_string());
                        break;
                    }
                }
                if content.contains(SUBTYPE_MARKER) {
                    found_subtype = true;
                    last_subtype_line = Some(subtype_fragment(content).to_string());
                }
                block.push(content.to_string());
                if content.starts_with(RELATION_CLOSE) {
                    break;
                }
            }
        }

        let mut inherited_subtype = false;
        if !found_subtype {
            if let Some(inherited) = &last_subtype_line {
                block.insert(1, inherited.clone());
                inherited_subtype = true;
            }
        }

        sections.relations.push(RelationRecord {
            text: block.join("\n"),
            inherited_subtype,
        });
    }

    tracing::debug!(
        entries = sections.entries.len(),
        relations = sections.relations.len(),
        "KGML sections extracted"
    );
    sections
}

/// `<relation ... />` with no body.
fn opening_tag_self_closes(line: &str) -> bool {
    match line.find('>') {
        Some(idx) => line[..idx].ends_with('/'),
        None => false,
    }
}

/// The last `<subtype ...>` element on a line, so a one-line relation does
/// not drag its own opening tag into later blocks.
fn subtype_fragment(line: &str) -> &str {
    match line.rfind(SUBTYPE_MARKER) {
        Some(idx) => {
            let rest = &line[idx..];
            match rest.find("/>").map(|end| end + 1).or_else(|| rest.find('>')) {
                Some(end) => &rest[..=end],
                None => rest,
            }
        }
        None => line,
    }
}

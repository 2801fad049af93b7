//! pathrank-kg — Pathway diagram parsing and gene co-occurrence accounting.
//! Everything here is synchronous and free of I/O.

pub mod extraction;
pub mod parse;
pub mod aggregate;
pub mod resolver;
pub mod document;

pub use aggregate::GenePathwayAggregator;
pub use document::{analyse_document, DocumentAnalysis};
pub use extraction::{extract_sections, EntryRecord, KgmlSections, RelationRecord};
pub use parse::{parse_relation, Entry, KgmlParser, ParsedDocument, Relation};
pub use resolver::{candidate_entry_ids, resolve};

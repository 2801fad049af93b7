/// Core identifiers and result records shared by the extraction and ranking crates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::run_config::ScoreWeights;

// ---------------------------------------------------------------------------
// Gene
// ---------------------------------------------------------------------------

/// Organism-local gene code, e.g. `472` for KEGG `hsa:472` (ATM).
///
/// The organism prefix is not part of the id; use [`GeneId::qualified`]
/// to rebuild the KEGG form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneId(String);

impl GeneId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Parse either a bare code (`472`) or a qualified one (`hsa:472`).
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some((_, code)) => Self(code.to_string()),
            None => Self(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// KEGG-qualified id, e.g. `hsa:472`.
    pub fn qualified(&self, organism: &str) -> String {
        format!("{}:{}", organism, self.0)
    }
}

impl fmt::Display for GeneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GeneId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Pathway
// ---------------------------------------------------------------------------

/// Pathway diagram identifier, e.g. `hsa04110`. The KEGG `path:` prefix
/// is stripped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathwayId(String);

impl PathwayId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        Self(raw.strip_prefix("path:").unwrap_or(raw).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathwayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathwayId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Disease
// ---------------------------------------------------------------------------

/// KEGG DISEASE entry, e.g. `H00003`. The `ds:` prefix is stripped and the
/// code upper-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiseaseId(String);

impl DiseaseId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        let code = raw
            .strip_prefix("ds:")
            .or_else(|| raw.strip_prefix("DS:"))
            .unwrap_or(raw);
        Self(code.to_ascii_uppercase())
    }

    /// Whether `raw` has the shape of a disease code (`H` and five digits,
    /// optionally `ds:`-prefixed) rather than a free-text name.
    pub fn looks_like_code(raw: &str) -> bool {
        let code = Self::new(raw);
        let mut chars = code.0.chars();
        chars.next() == Some('H') && code.0.len() == 6 && chars.all(|c| c.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiseaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DiseaseId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Interaction record
// ---------------------------------------------------------------------------

/// One gene reached by tracing a relation back from the reference gene's
/// entries, together with the relation's subtype label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub gene_id: GeneId,
    /// `None` when the relation block carried no subtype and none could be inherited.
    pub relation_type: Option<String>,
}

impl InteractionRecord {
    pub fn new(gene_id: GeneId, relation_type: Option<String>) -> Self {
        Self { gene_id, relation_type }
    }
}

// ---------------------------------------------------------------------------
// Candidate score
// ---------------------------------------------------------------------------

/// Final blended score for one gene. Built once by the combiner and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    gene_id: GeneId,
    total_score: f64,
    relation_score: f64,
    similarity_score: f64,
    correlation: f64,
}

impl CandidateScore {
    /// total = w_rel·relation + w_sim·similarity + w_corr·correlation
    pub fn from_signals(
        gene_id: GeneId,
        relation_score: f64,
        similarity_score: f64,
        correlation: f64,
        weights: &ScoreWeights,
    ) -> Self {
        let total_score = weights.relation * relation_score
            + weights.similarity * similarity_score
            + weights.correlation * correlation;
        Self {
            gene_id,
            total_score,
            relation_score,
            similarity_score,
            correlation,
        }
    }

    pub fn gene_id(&self) -> &GeneId { &self.gene_id }
    pub fn total_score(&self) -> f64 { self.total_score }
    pub fn relation_score(&self) -> f64 { self.relation_score }
    pub fn similarity_score(&self) -> f64 { self.similarity_score }
    pub fn correlation(&self) -> f64 { self.correlation }
}

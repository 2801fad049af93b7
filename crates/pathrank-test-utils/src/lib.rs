//! pathrank-test-utils — KGML fixtures and in-memory source mocks shared by
//! the workspace's tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use pathrank_common::{DiseaseId, FetchError, GeneId, PathwayId};
use pathrank_ingestion::{CoExpressionSource, DiseaseLookup, PathwayLookup, SymbolResolver};

pub use pretty_assertions;

// ── KGML fixtures ──────────────────────────────────────────────────────────

/// Builds small KGML documents in the layout KEGG serves them.
pub struct KgmlBuilder {
    pathway: String,
    organism: String,
    body: Vec<String>,
}

impl KgmlBuilder {
    pub fn new(pathway: &str) -> Self {
        Self {
            pathway: pathway.to_string(),
            organism: "hsa".to_string(),
            body: Vec::new(),
        }
    }

    pub fn organism(mut self, organism: &str) -> Self {
        self.organism = organism.to_string();
        self
    }

    /// Gene entry listing `genes` (bare codes) in its name field.
    pub fn gene(mut self, entry_id: &str, genes: &[&str]) -> Self {
        let name = genes
            .iter()
            .map(|g| format!("{}:{}", self.organism, g))
            .collect::<Vec<_>>()
            .join(" ");
        self.body.push(format!(
            "    <entry id=\"{entry_id}\" name=\"{name}\" type=\"gene\"\n        link=\"https://www.kegg.jp/dbget-bin/www_bget?{name}\">"
        ));
        self.body.push(format!(
            "        <graphics name=\"G{entry_id}\" fgcolor=\"#000000\" bgcolor=\"#BFFFBF\" type=\"rectangle\"/>"
        ));
        self.body.push("    </entry>".to_string());
        self
    }

    /// Non-gene entry; ignored by extraction.
    pub fn compound(mut self, entry_id: &str, compound: &str) -> Self {
        self.body.push(format!(
            "    <entry id=\"{entry_id}\" name=\"cpd:{compound}\" type=\"compound\">\n    </entry>"
        ));
        self
    }

    /// Relation block with an optional subtype child.
    pub fn relation(mut self, entry1: &str, entry2: &str, subtype: Option<&str>) -> Self {
        self.body.push(format!(
            "    <relation entry1=\"{entry1}\" entry2=\"{entry2}\" type=\"PPrel\">"
        ));
        if let Some(name) = subtype {
            self.body.push(format!("        <subtype name=\"{name}\" value=\"-->\"/>"));
        }
        self.body.push("    </relation>".to_string());
        self
    }

    pub fn build(self) -> String {
        let number = self.pathway.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        let mut out = vec![
            "<?xml version=\"1.0\"?>".to_string(),
            "<!DOCTYPE pathway SYSTEM \"https://www.kegg.jp/kegg/xml/KGML_v0.7.2_.dtd\">".to_string(),
            format!(
                "<pathway name=\"path:{}\" org=\"{}\" number=\"{}\" title=\"Fixture\">",
                self.pathway, self.organism, number
            ),
        ];
        out.extend(self.body);
        out.push("</pathway>".to_string());
        out.join("\n")
    }
}

// ── Pathway lookup mock ──────────────────────────────────────────────────────

/// In-memory [`PathwayLookup`]. Unknown genes belong to no pathway; unknown
/// documents fail with HTTP 404.
#[derive(Default)]
pub struct MockPathwayLookup {
    memberships: HashMap<GeneId, Vec<PathwayId>>,
    documents: HashMap<PathwayId, String>,
    /// gene → remaining transient failures before lookups succeed
    flaky: Mutex<HashMap<GeneId, usize>>,
    broken: HashSet<GeneId>,
    broken_documents: HashSet<PathwayId>,
    slow: HashSet<GeneId>,
    delay: Duration,
    lookups: AtomicUsize,
    per_gene: Mutex<HashMap<GeneId, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockPathwayLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the pathways a gene belongs to, in listing order.
    pub fn with(mut self, gene: &str, pathways: &[&str]) -> Self {
        self.memberships.insert(
            GeneId::new(gene),
            pathways.iter().map(|p| PathwayId::new(*p)).collect(),
        );
        self
    }

    pub fn with_document(mut self, pathway: &str, kgml: String) -> Self {
        self.documents.insert(PathwayId::new(pathway), kgml);
        self
    }

    /// Fail the next `times` lookups of `gene` with HTTP 503.
    pub fn flaky(self, gene: &str, times: usize) -> Self {
        self.flaky
            .lock()
            .expect("mock lock")
            .insert(GeneId::new(gene), times);
        self
    }

    /// Every lookup of `gene` fails with HTTP 500.
    pub fn broken(mut self, gene: &str) -> Self {
        self.broken.insert(GeneId::new(gene));
        self
    }

    /// Fetching this document fails with HTTP 502.
    pub fn broken_document(mut self, pathway: &str) -> Self {
        self.broken_documents.insert(PathwayId::new(pathway));
        self
    }

    /// Lookups of `gene` sleep for `delay` first.
    pub fn slow(mut self, gene: &str, delay: Duration) -> Self {
        self.slow.insert(GeneId::new(gene));
        self.delay = delay;
        self
    }

    /// Total pathway lookups served, failures included.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Highest number of pathway lookups observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn lookups_for(&self, gene: &str) -> usize {
        self.per_gene
            .lock()
            .expect("mock lock")
            .get(&GeneId::new(gene))
            .copied()
            .unwrap_or(0)
    }
}

fn status(url: String, status: u16) -> FetchError {
    FetchError::Status { url, status }
}

#[async_trait]
impl PathwayLookup for MockPathwayLookup {
    async fn fetch_pathways_for_gene(&self, gene: &GeneId) -> Result<Vec<PathwayId>, FetchError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        *self
            .per_gene
            .lock()
            .expect("mock lock")
            .entry(gene.clone())
            .or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if self.slow.contains(gene) {
            tokio::time::sleep(self.delay).await;
        }
        if self.broken.contains(gene) {
            return Err(status(format!("mock://link/{gene}"), 500));
        }
        {
            let mut flaky = self.flaky.lock().expect("mock lock");
            if let Some(remaining) = flaky.get_mut(gene) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(status(format!("mock://link/{gene}"), 503));
                }
            }
        }
        Ok(self.memberships.get(gene).cloned().unwrap_or_default())
    }

    async fn fetch_document(&self, pathway: &PathwayId) -> Result<String, FetchError> {
        if self.broken_documents.contains(pathway) {
            return Err(status(format!("mock://get/{pathway}/kgml"), 502));
        }
        self.documents
            .get(pathway)
            .cloned()
            .ok_or_else(|| status(format!("mock://get/{pathway}/kgml"), 404))
    }
}

// ── Disease lookup mock ──────────────────────────────────────────────────────

/// In-memory [`DiseaseLookup`]. The catalogue lists diseases in the order
/// they were added; unknown diseases list no pathways.
#[derive(Default)]
pub struct MockDiseaseLookup {
    catalogue: Vec<(DiseaseId, String)>,
    pathways: HashMap<DiseaseId, Vec<PathwayId>>,
    broken: HashSet<DiseaseId>,
    slow: HashSet<DiseaseId>,
    delay: Duration,
}

impl MockDiseaseLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, disease: &str, name: &str, pathways: &[&str]) -> Self {
        let id = DiseaseId::new(disease);
        self.catalogue.push((id.clone(), name.to_string()));
        self.pathways
            .insert(id, pathways.iter().map(|p| PathwayId::new(*p)).collect());
        self
    }

    /// Record fetches of `disease` fail with HTTP 500.
    pub fn broken(mut self, disease: &str) -> Self {
        self.broken.insert(DiseaseId::new(disease));
        self
    }

    /// Record fetches of `disease` sleep for `delay` first.
    pub fn slow(mut self, disease: &str, delay: Duration) -> Self {
        self.slow.insert(DiseaseId::new(disease));
        self.delay = delay;
        self
    }
}

#[async_trait]
impl DiseaseLookup for MockDiseaseLookup {
    async fn list_diseases(&self) -> Result<Vec<(DiseaseId, String)>, FetchError> {
        Ok(self.catalogue.clone())
    }

    async fn fetch_disease_pathways(&self, disease: &DiseaseId) -> Result<Vec<PathwayId>, FetchError> {
        if self.slow.contains(disease) {
            tokio::time::sleep(self.delay).await;
        }
        if self.broken.contains(disease) {
            return Err(status(format!("mock://get/ds:{disease}"), 500));
        }
        Ok(self.pathways.get(disease).cloned().unwrap_or_default())
    }
}

// ── Co-expression mock ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockCoExpression {
    pairs: Vec<(String, f64)>,
    failing: bool,
}

impl MockCoExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, correlation: f64) -> Self {
        self.pairs.push((symbol.to_string(), correlation));
        self
    }

    /// Every request fails with HTTP 503.
    pub fn failing() -> Self {
        Self { pairs: Vec::new(), failing: true }
    }
}

#[async_trait]
impl CoExpressionSource for MockCoExpression {
    async fn fetch_top_correlated(
        &self,
        symbol: &str,
        top_n: usize,
    ) -> Result<Vec<(String, f64)>, FetchError> {
        if self.failing {
            return Err(status(format!("mock://coltop/{symbol}"), 503));
        }
        Ok(self
            .pairs
            .iter()
            .filter(|(s, _)| !s.eq_ignore_ascii_case(symbol))
            .take(top_n)
            .cloned()
            .collect())
    }
}

// ── Symbol resolver mock ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSymbolResolver {
    ids: HashMap<String, GeneId>,
}

impl MockSymbolResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, gene_id: &str) -> Self {
        self.ids.insert(symbol.to_uppercase(), GeneId::new(gene_id));
        self
    }
}

#[async_trait]
impl SymbolResolver for MockSymbolResolver {
    async fn resolve_to_gene_id(&self, symbol: &str) -> Result<Option<GeneId>, FetchError> {
        Ok(self.ids.get(&symbol.trim().to_uppercase()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_emits_gene_entries_and_relations() {
        let doc = KgmlBuilder::new("hsa04110")
            .gene("1", &["7157"])
            .compound("2", "C00076")
            .relation("1", "1", Some("activation"))
            .build();
        assert!(doc.contains(r#"name="hsa:7157" type="gene""#));
        assert!(doc.contains(r#"number="04110""#));
        assert!(doc.contains(r#"<subtype name="activation""#));
    }

    #[tokio::test]
    async fn test_flaky_gene_recovers() {
        let lookup = MockPathwayLookup::new().with("1", &["P1"]).flaky("1", 1);
        assert!(lookup.fetch_pathways_for_gene(&"1".into()).await.is_err());
        assert_eq!(lookup.fetch_pathways_for_gene(&"1".into()).await.unwrap().len(), 1);
        assert_eq!(lookup.lookups_for("1"), 2);
    }
}

//! KEGG REST client.
//!
//! Endpoints used:
//!   link: {base}/link/pathway/{org}:{gene}   tab-separated gene → pathway pairs
//!   get:  {base}/get/{pathway}/kgml           KGML pathway diagram
//!   get:  {base}/get/{org}:{gene}             flat-file gene record
//!   get:  {base}/get/ds:{disease}             flat-file disease record
//!   list: {base}/list/disease                 tab-separated disease catalogue
//!   find: {base}/find/disease/{query}         disease name search

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument};

use pathrank_common::run_config::SourceConfig;
use pathrank_common::sandbox::{check_status, SandboxClient};
use pathrank_common::{DiseaseId, FetchError, GeneId, PathwayId};

use super::{DiseaseLookup, PathwayLookup};

pub struct KeggClient {
    client: SandboxClient,
    base_url: String,
    organism: String,
}

impl KeggClient {
    pub fn new(sources: &SourceConfig, organism: &str) -> Result<Self, FetchError> {
        Ok(Self::with_client(SandboxClient::from_sources(sources)?, &sources.kegg_base_url, organism))
    }

    pub fn with_client(client: SandboxClient, base_url: &str, organism: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            organism: organism.to_string(),
        }
    }

    pub fn organism(&self) -> &str {
        &self.organism
    }

    /// GET a KEGG resource as text. `None` on 404, which KEGG uses for
    /// unknown identifiers.
    async fn get_text(&self, path: &str) -> Result<Option<String>, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self.client.get(&url)?.send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(url = %url, "KEGG returned 404");
            return Ok(None);
        }
        let body = check_status(resp)?.text().await?;
        Ok(Some(body))
    }

    /// Flat-file gene record, e.g. for `hsa:472`.
    #[instrument(skip(self))]
    pub async fn fetch_gene_record(&self, gene: &GeneId) -> Result<Option<KeggRecord>, FetchError> {
        let path = format!("get/{}", gene.qualified(&self.organism));
        Ok(self
            .get_text(&path)
            .await?
            .filter(|body| !body.trim().is_empty())
            .map(|body| KeggRecord::parse(&body)))
    }

    #[instrument(skip(self))]
    pub async fn fetch_disease_record(&self, disease: &DiseaseId) -> Result<Option<KeggRecord>, FetchError> {
        let path = format!("get/ds:{}", disease);
        Ok(self
            .get_text(&path)
            .await?
            .filter(|body| !body.trim().is_empty())
            .map(|body| KeggRecord::parse(&body)))
    }

    /// Diseases whose names match `query`, in KEGG's order.
    #[instrument(skip(self))]
    pub async fn find_diseases(&self, query: &str) -> Result<Vec<(DiseaseId, String)>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let path = format!("find/disease/{}", encoded);
        Ok(self
            .get_text(&path)
            .await?
            .map(|body| parse_listing(&body))
            .unwrap_or_default())
    }
}

#[async_trait]
impl DiseaseLookup for KeggClient {
    #[instrument(skip(self))]
    async fn list_diseases(&self) -> Result<Vec<(DiseaseId, String)>, FetchError> {
        match self.get_text("list/disease").await? {
            Some(body) => Ok(parse_listing(&body)),
            None => Err(FetchError::Malformed {
                source_name: "KEGG",
                detail: "empty disease catalogue".to_string(),
            }),
        }
    }

    #[instrument(skip(self), fields(disease = %disease))]
    async fn fetch_disease_pathways(&self, disease: &DiseaseId) -> Result<Vec<PathwayId>, FetchError> {
        let pathways: Vec<PathwayId> = self
            .fetch_disease_record(disease)
            .await?
            .map(|record| record.pathways().into_iter().map(|(id, _)| id).collect())
            .unwrap_or_default();
        debug!(count = pathways.len(), "KEGG disease pathways fetched");
        Ok(pathways)
    }
}

#[async_trait]
impl PathwayLookup for KeggClient {
    #[instrument(skip(self), fields(gene = %gene))]
    async fn fetch_pathways_for_gene(&self, gene: &GeneId) -> Result<Vec<PathwayId>, FetchError> {
        let path = format!("link/pathway/{}", gene.qualified(&self.organism));
        let pathways = match self.get_text(&path).await? {
            Some(body) => parse_link_response(&body),
            None => Vec::new(),
        };
        debug!(count = pathways.len(), "KEGG pathway links fetched");
        Ok(pathways)
    }

    #[instrument(skip(self), fields(pathway = %pathway))]
    async fn fetch_document(&self, pathway: &PathwayId) -> Result<String, FetchError> {
        let path = format!("get/{}/kgml", pathway);
        match self.get_text(&path).await? {
            Some(body) if !body.trim().is_empty() => Ok(body),
            _ => Err(FetchError::Malformed {
                source_name: "KEGG",
                detail: format!("no KGML document for {}", pathway),
            }),
        }
    }
}

/// Parse the `link/pathway` TSV body: the second column of each line is a
/// `path:`-prefixed pathway id. Lines without a second column are skipped.
/// Listing order is kept; repeated pathways appear once.
pub fn parse_link_response(body: &str) -> Vec<PathwayId> {
    let mut seen = HashSet::new();
    body.lines()
        .filter_map(|line| line.split('\t').nth(1))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathwayId::new)
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Parse a `list/` or `find/` TSV body into `(id, name)` pairs. Lines
/// without a tab are skipped.
pub fn parse_listing(body: &str) -> Vec<(DiseaseId, String)> {
    body.lines()
        .filter_map(|line| line.split_once('\t'))
        .filter(|(id, _)| !id.trim().is_empty())
        .map(|(id, name)| (DiseaseId::new(id), name.trim().to_string()))
        .collect()
}

/// A KEGG flat-file record split into its top-level sections.
///
/// Section headers start in column 0 with an uppercase letter and end at
/// the first whitespace. Indented continuation lines are appended to the
/// current section. Gene and disease entries share this layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeggRecord {
    sections: BTreeMap<String, Vec<String>>,
}

impl KeggRecord {
    pub fn parse(text: &str) -> Self {
        let mut sections: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if line.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                // "DRUG_TARGET Afatinib: D09724" has a single space after the header
                let (name, content) = match line.split_once(char::is_whitespace) {
                    Some((name, rest)) => (name, rest.trim()),
                    None => (line.trim(), ""),
                };
                let lines = sections.entry(name.to_string()).or_default();
                if !content.is_empty() {
                    lines.push(content.to_string());
                }
                current = Some(name.to_string());
                continue;
            }
            if let Some(name) = &current {
                if line.starts_with("    ") {
                    if let Some(lines) = sections.get_mut(name) {
                        lines.push(line.trim().to_string());
                    }
                }
            }
        }

        Self { sections }
    }

    /// Section content with continuation lines joined by a single space.
    pub fn section(&self, name: &str) -> Option<String> {
        self.sections.get(name).map(|lines| lines.join(" "))
    }

    pub fn name(&self) -> Option<String> {
        self.section("NAME")
    }

    pub fn definition(&self) -> Option<String> {
        self.section("DEFINITION")
    }

    pub fn orthology(&self) -> Option<String> {
        self.section("ORTHOLOGY")
    }

    pub fn symbols(&self) -> Vec<String> {
        self.section("SYMBOL")
            .map(|s| s.split(',').map(|x| x.trim().to_string()).filter(|x| !x.is_empty()).collect())
            .unwrap_or_default()
    }

    /// `(pathway, title)` pairs of the PATHWAY section, one per line.
    /// Disease entries annotate ids with the involved genes, as in
    /// `hsa05221(FLT3,KIT)`; the annotation is dropped.
    pub fn pathways(&self) -> Vec<(PathwayId, String)> {
        self.id_title_lines("PATHWAY")
            .into_iter()
            .map(|(id, title)| {
                let bare = id.split('(').next().unwrap_or(&id);
                (PathwayId::new(bare), title)
            })
            .collect()
    }

    /// `(drug, KEGG DRUG ids)` pairs of the DRUG_TARGET section. Market
    /// annotations such as `<JP/US>` are stripped from the ids.
    pub fn drug_targets(&self) -> Vec<(String, Vec<String>)> {
        self.sections
            .get("DRUG_TARGET")
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(|l| {
                        let (drug, ids) = l.split_once(':')?;
                        let ids = ids
                            .split_whitespace()
                            .map(|id| id.split('<').next().unwrap_or(id).to_string())
                            .filter(|id| !id.is_empty())
                            .collect();
                        Some((drug.trim().to_string(), ids))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn category(&self) -> Option<String> {
        self.section("CATEGORY")
    }

    /// `(disease id, title)` pairs of the DISEASE section.
    pub fn diseases(&self) -> Vec<(String, String)> {
        self.id_title_lines("DISEASE")
    }

    fn id_title_lines(&self, section: &str) -> Vec<(String, String)> {
        self.sections
            .get(section)
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(|l| {
                        let (id, title) = l.split_once(char::is_whitespace)?;
                        Some((id.to_string(), title.trim().to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Human-readable gene name: the KO description without its EC suffix,
    /// else NAME, else DEFINITION, else `fallback`.
    pub fn full_name(&self, fallback: &str) -> String {
        if let Some(ko) = self.orthology() {
            if let Some((head, _)) = ko.split_once('[') {
                // "K04728  ataxia telangectasia mutated family protein"
                let description = head
                    .trim()
                    .split_once(char::is_whitespace)
                    .map(|(_, rest)| rest.trim())
                    .unwrap_or(head.trim());
                if !description.is_empty() {
                    return description.to_string();
                }
            }
        }
        self.name()
            .or_else(|| self.definition())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ATM_RECORD: &str = "ENTRY       472               CDS       T01001
SYMBOL      ATM, AT1, ATA, TEL1
NAME        (RefSeq) ATM serine/threonine kinase
ORTHOLOGY   K04728  ataxia telangectasia mutated family protein [EC:2.7.11.1]
ORGANISM    hsa  Homo sapiens (human)
PATHWAY     hsa03440  Homologous recombination
            hsa04110  Cell cycle
            hsa04115  p53 signaling pathway
DISEASE     H00003  Acute myeloid leukemia
            H00040  Ataxia telangiectasia
DRUG_TARGET Afatinib: D09724<JP/US> D10287
            Olaparib: D09730<US>
///
";

    const AML_RECORD: &str = "ENTRY       H00003                      Disease
NAME        Acute myeloid leukemia
CATEGORY    Cancer
PATHWAY     hsa05221(FLT3,KIT)  Acute myeloid leukemia
            hsa04110  Cell cycle
///
";

    #[test]
    fn test_parse_link_response() {
        let body = "hsa:7157\tpath:hsa04110\nhsa:7157\tpath:hsa04115\n\nbroken-line\n";
        let pathways = parse_link_response(body);
        let ids: Vec<&str> = pathways.iter().map(PathwayId::as_str).collect();
        assert_eq!(ids, vec!["hsa04110", "hsa04115"]);
    }

    #[test]
    fn test_parse_link_response_keeps_listing_order() {
        let body = "hsa:7157\tpath:hsa05200\nhsa:7157\tpath:hsa01522\nhsa:7157\tpath:hsa05200\nhsa:7157\tpath:hsa04110\n";
        let ids: Vec<String> = parse_link_response(body).iter().map(|p| p.to_string()).collect();
        assert_eq!(ids, vec!["hsa05200", "hsa01522", "hsa04110"]);
    }

    #[test]
    fn test_parse_link_response_empty() {
        assert!(parse_link_response("").is_empty());
        assert!(parse_link_response("\n").is_empty());
    }

    #[test]
    fn test_flat_file_sections() {
        let rec = KeggRecord::parse(ATM_RECORD);
        assert_eq!(rec.name().as_deref(), Some("(RefSeq) ATM serine/threonine kinase"));
        assert_eq!(
            rec.section("PATHWAY").as_deref(),
            Some("hsa03440  Homologous recombination hsa04110  Cell cycle hsa04115  p53 signaling pathway")
        );
        assert_eq!(rec.symbols(), vec!["ATM", "AT1", "ATA", "TEL1"]);
        assert!(rec.section("///").is_none());
    }

    #[test]
    fn test_pathways_and_diseases() {
        let rec = KeggRecord::parse(ATM_RECORD);
        let pathways = rec.pathways();
        assert_eq!(pathways.len(), 3);
        assert_eq!(pathways[1], (PathwayId::new("hsa04110"), "Cell cycle".to_string()));
        assert_eq!(rec.diseases()[1].0, "H00040");
    }

    #[test]
    fn test_drug_targets_strip_market_tags() {
        let rec = KeggRecord::parse(ATM_RECORD);
        assert_eq!(
            rec.drug_targets(),
            vec![
                ("Afatinib".to_string(), vec!["D09724".to_string(), "D10287".to_string()]),
                ("Olaparib".to_string(), vec!["D09730".to_string()]),
            ]
        );
        assert!(KeggRecord::parse(AML_RECORD).drug_targets().is_empty());
    }

    #[test]
    fn test_disease_record_pathways_drop_gene_annotation() {
        let rec = KeggRecord::parse(AML_RECORD);
        let ids: Vec<String> = rec.pathways().iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(ids, vec!["hsa05221", "hsa04110"]);
        assert_eq!(rec.category().as_deref(), Some("Cancer"));
        assert_eq!(rec.name().as_deref(), Some("Acute myeloid leukemia"));
    }

    #[test]
    fn test_parse_listing() {
        let body = "ds:H00003\tAcute myeloid leukemia; AML\nH00040\tAtaxia telangiectasia\nno-tab\n";
        let listing = parse_listing(body);
        assert_eq!(
            listing,
            vec![
                (DiseaseId::new("H00003"), "Acute myeloid leukemia; AML".to_string()),
                (DiseaseId::new("H00040"), "Ataxia telangiectasia".to_string()),
            ]
        );
    }

    #[test]
    fn test_full_name_prefers_orthology() {
        let rec = KeggRecord::parse(ATM_RECORD);
        assert_eq!(rec.full_name("ATM"), "ataxia telangectasia mutated family protein");

        let bare = KeggRecord::parse("DEFINITION  some protein\n");
        assert_eq!(bare.full_name("X"), "some protein");
        assert_eq!(KeggRecord::default().full_name("X"), "X");
    }

    #[tokio::test]
    async fn test_disallowed_host_is_rejected_before_io() {
        let client = KeggClient::with_client(
            SandboxClient::new().unwrap(),
            "https://kegg.example.org",
            "hsa",
        );
        let err = client.fetch_pathways_for_gene(&GeneId::new("7157")).await.unwrap_err();
        assert!(matches!(err, FetchError::Disallowed(_)));
        let err = client.list_diseases().await.unwrap_err();
        assert!(matches!(err, FetchError::Disallowed(_)));
    }
}

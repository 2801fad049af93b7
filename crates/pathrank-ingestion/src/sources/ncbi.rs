//! NCBI E-utilities gene symbol resolution.
//!
//! Endpoint used:
//!   esearch: {base}/esearch.fcgi?db=gene&term={symbol}[gene] AND {organism}[orgn]

use async_trait::async_trait;
use tracing::{debug, instrument};

use pathrank_common::run_config::SourceConfig;
use pathrank_common::sandbox::{check_status, SandboxClient};
use pathrank_common::{FetchError, GeneId};

use super::SymbolResolver;

const DEFAULT_ORGANISM_NAME: &str = "homo sapiens";

pub struct NcbiGeneResolver {
    client: SandboxClient,
    base_url: String,
    api_key: Option<String>,
    organism_name: String,
}

impl NcbiGeneResolver {
    pub fn new(sources: &SourceConfig) -> Result<Self, FetchError> {
        Ok(Self::with_client(
            SandboxClient::from_sources(sources)?,
            &sources.ncbi_base_url,
            sources.ncbi_api_key.clone(),
        ))
    }

    pub fn with_client(client: SandboxClient, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            organism_name: DEFAULT_ORGANISM_NAME.to_string(),
        }
    }

    /// Restrict searches to another organism, e.g. "mus musculus".
    pub fn with_organism_name(mut self, name: &str) -> Self {
        self.organism_name = name.to_string();
        self
    }

    fn search_term(&self, symbol: &str) -> String {
        format!("{}[gene] AND {}[orgn]", symbol.trim(), self.organism_name)
    }
}

#[async_trait]
impl SymbolResolver for NcbiGeneResolver {
    #[instrument(skip(self))]
    async fn resolve_to_gene_id(&self, symbol: &str) -> Result<Option<GeneId>, FetchError> {
        let mut params = vec![
            ("db", "gene".to_string()),
            ("term", self.search_term(symbol)),
            ("retmode", "json".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }

        let url = format!("{}/esearch.fcgi", self.base_url);
        let resp = self.client.get(&url)?.query(&params).send().await?;
        let body: serde_json::Value = check_status(resp)?.json().await?;

        let id = first_esearch_id(&body)?;
        debug!(?id, "NCBI esearch resolved symbol");
        Ok(id.map(GeneId::new))
    }
}

/// First id of `esearchresult.idlist`; the list being empty means the
/// symbol is unknown.
pub fn first_esearch_id(body: &serde_json::Value) -> Result<Option<String>, FetchError> {
    let ids = body["esearchresult"]["idlist"].as_array().ok_or_else(|| FetchError::Malformed {
        source_name: "NCBI esearch",
        detail: "missing esearchresult.idlist".to_string(),
    })?;
    Ok(ids.first().and_then(|v| v.as_str()).map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_id_wins() {
        let body = json!({"esearchresult": {"count": "2", "idlist": ["7157", "22059"]}});
        assert_eq!(first_esearch_id(&body).unwrap().as_deref(), Some("7157"));
    }

    #[test]
    fn test_empty_idlist_is_unknown_symbol() {
        let body = json!({"esearchresult": {"count": "0", "idlist": []}});
        assert_eq!(first_esearch_id(&body).unwrap(), None);
    }

    #[test]
    fn test_missing_idlist_is_malformed() {
        let body = json!({"error": "API rate limit exceeded"});
        assert!(matches!(first_esearch_id(&body), Err(FetchError::Malformed { .. })));
    }

    #[test]
    fn test_search_term() {
        let r = NcbiGeneResolver::with_client(SandboxClient::new().unwrap(), "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/", None);
        assert_eq!(r.search_term(" TP53 "), "TP53[gene] AND homo sapiens[orgn]");
        let mouse = r.with_organism_name("mus musculus");
        assert_eq!(mouse.search_term("Trp53"), "Trp53[gene] AND mus musculus[orgn]");
    }
}

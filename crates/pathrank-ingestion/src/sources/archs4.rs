//! ARCHS4 co-expression client.
//!
//! Endpoint used:
//!   POST {archs4_url}  body {"id": SYMBOL, "count": n}
//!   → {"rowids": [symbols...], "values": [correlations...]}
//!
//! The response ranks the queried gene itself first; it is dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use pathrank_common::run_config::SourceConfig;
use pathrank_common::sandbox::{check_status, SandboxClient};
use pathrank_common::FetchError;

use super::CoExpressionSource;

pub struct Archs4Client {
    client: SandboxClient,
    url: String,
}

#[derive(Debug, Serialize)]
struct ColtopRequest<'a> {
    id: &'a str,
    count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ColtopResponse {
    #[serde(default)]
    pub rowids: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
}

impl Archs4Client {
    pub fn new(sources: &SourceConfig) -> Result<Self, FetchError> {
        Ok(Self::with_client(SandboxClient::from_sources(sources)?, &sources.archs4_url))
    }

    pub fn with_client(client: SandboxClient, url: &str) -> Self {
        Self { client, url: url.to_string() }
    }
}

#[async_trait]
impl CoExpressionSource for Archs4Client {
    #[instrument(skip(self))]
    async fn fetch_top_correlated(
        &self,
        symbol: &str,
        top_n: usize,
    ) -> Result<Vec<(String, f64)>, FetchError> {
        let symbol = symbol.trim().to_uppercase();
        let request = ColtopRequest { id: &symbol, count: top_n + 1 };
        let resp = self.client.post(&self.url)?.json(&request).send().await?;
        let body: ColtopResponse = check_status(resp)?.json().await?;

        let pairs = top_correlated(body, &symbol, top_n)?;
        debug!(count = pairs.len(), "ARCHS4 co-expression fetched");
        Ok(pairs)
    }
}

/// Zip symbols with correlations, drop the queried gene and non-finite
/// values, keep the first `top_n` pairs.
pub fn top_correlated(
    body: ColtopResponse,
    symbol: &str,
    top_n: usize,
) -> Result<Vec<(String, f64)>, FetchError> {
    if body.rowids.len() != body.values.len() {
        return Err(FetchError::Malformed {
            source_name: "ARCHS4",
            detail: format!("{} ids but {} values", body.rowids.len(), body.values.len()),
        });
    }
    Ok(body
        .rowids
        .into_iter()
        .zip(body.values)
        .filter(|(gene, corr)| !gene.eq_ignore_ascii_case(symbol) && corr.is_finite())
        .take(top_n)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(ids: &[&str], values: &[f64]) -> ColtopResponse {
        ColtopResponse {
            rowids: ids.iter().map(|s| s.to_string()).collect(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_self_is_dropped_and_truncated() {
        let pairs = top_correlated(
            body(&["BRCA1", "BARD1", "RAD51", "BRIP1"], &[1.0, 0.91, 0.88, 0.87]),
            "BRCA1",
            2,
        )
        .unwrap();
        assert_eq!(pairs, vec![("BARD1".to_string(), 0.91), ("RAD51".to_string(), 0.88)]);
    }

    #[test]
    fn test_length_mismatch_is_malformed() {
        let err = top_correlated(body(&["A", "B"], &[0.5]), "X", 5).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn test_response_deserializes_with_missing_fields() {
        let parsed: ColtopResponse = serde_json::from_str(r#"{"rowids": []}"#).unwrap();
        assert!(parsed.values.is_empty());
    }
}

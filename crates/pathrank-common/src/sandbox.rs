use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::error::FetchError;
use crate::run_config::SourceConfig;

/// HTTP client that only allows requests to approved domains.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist of pathway, gene and co-expression services.
    pub fn new() -> Result<Self, FetchError> {
        Self::build(Duration::from_secs(30), None, DEFAULT_DOMAINS.iter().map(|d| d.to_string()))
    }

    /// Creates a client allowing exactly the hosts named in the source configuration.
    pub fn from_sources(cfg: &SourceConfig) -> Result<Self, FetchError> {
        Self::build(
            Duration::from_secs(cfg.timeout_secs),
            Some(cfg.user_agent.as_str()),
            cfg.hosts(),
        )
    }

    fn build(
        timeout: Duration,
        user_agent: Option<&str>,
        domains: impl IntoIterator<Item = String>,
    ) -> Result<Self, FetchError> {
        let mut builder = ClientBuilder::new().timeout(timeout);
        // KEGG rejects requests without a browser-like or named agent
        if let Some(ua) = user_agent {
            builder = builder.user_agent(ua);
        }
        let client = builder.build()?;
        Ok(Self { client, allowlist: domains.into_iter().collect() })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Check exact match or if it's a subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// GET request builder for an allowed URL.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, FetchError> {
        if !self.is_allowed(url) {
            return Err(FetchError::Disallowed(url.to_string()));
        }
        Ok(self.client.get(url))
    }

    /// POST request builder for an allowed URL.
    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, FetchError> {
        if !self.is_allowed(url) {
            return Err(FetchError::Disallowed(url.to_string()));
        }
        Ok(self.client.post(url))
    }
}

const DEFAULT_DOMAINS: &[&str] = &[
    "rest.kegg.jp",            // KEGG REST
    "eutils.ncbi.nlm.nih.gov", // NCBI E-utilities
    "maayanlab.cloud",         // ARCHS4
    "localhost",
    "127.0.0.1",
];

/// Turn a non-success response into [`FetchError::Status`].
pub fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(FetchError::Status { url: resp.url().to_string(), status: status.as_u16() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist() {
        let client = SandboxClient::new().unwrap();
        assert!(client.is_allowed("https://rest.kegg.jp/link/pathway/hsa:7157"));
        assert!(client.is_allowed("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi"));
        assert!(!client.is_allowed("https://example.com/"));
        assert!(!client.is_allowed("not a url"));
    }

    #[test]
    fn test_disallowed_get_is_typed_error() {
        let client = SandboxClient::new().unwrap();
        assert!(matches!(client.get("https://example.com/x"), Err(FetchError::Disallowed(_))));
    }

    #[test]
    fn test_from_sources_uses_configured_hosts() {
        let mut cfg = SourceConfig::default();
        cfg.kegg_base_url = "http://127.0.0.1:9000".to_string();
        let mut client = SandboxClient::from_sources(&cfg).unwrap();
        assert!(client.is_allowed("http://127.0.0.1:9000/get/hsa04110/kgml"));
        assert!(!client.is_allowed("https://rest.kegg.jp/get/hsa04110/kgml"));
        client.allow_domain("rest.kegg.jp");
        assert!(client.is_allowed("https://rest.kegg.jp/get/hsa04110/kgml"));
    }
}

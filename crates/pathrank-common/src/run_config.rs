//! Run configuration for one pathway-neighbourhood ranking.
//!
//! Loaded from TOML, YAML or JSON; every field has a default so a config
//! file only needs to name what it changes.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{PathrankError, Result};

/// Environment variable naming the config file used when none is given.
pub const CONFIG_ENV_VAR: &str = "PATHRANK_CONFIG";

/// Complete run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Reference gene specification
    #[serde(default)]
    pub target: TargetSpec,

    /// Remote data sources
    #[serde(default)]
    pub sources: SourceConfig,

    /// Scoring weights and candidate selection
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Concurrency and retry options
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Output options
    #[serde(default)]
    pub output: OutputConfig,

    /// Disease similarity search limits
    #[serde(default)]
    pub disease_search: DiseaseSearchConfig,
}

// ── Target Specification ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Reference gene symbol (e.g., "TP53")
    #[serde(default = "default_gene")]
    pub gene: String,

    /// Skip symbol resolution and use this gene code directly (e.g., "7157")
    #[serde(default)]
    pub gene_id: Option<String>,

    /// KEGG organism code used to qualify gene ids
    #[serde(default = "default_organism")]
    pub organism: String,
}

fn default_gene() -> String { "TP53".to_string() }
fn default_organism() -> String { "hsa".to_string() }

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            gene: default_gene(),
            gene_id: None,
            organism: default_organism(),
        }
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_kegg_url")]
    pub kegg_base_url: String,

    #[serde(default = "default_ncbi_url")]
    pub ncbi_base_url: String,

    #[serde(default = "default_archs4_url")]
    pub archs4_url: String,

    /// Optional NCBI API key for higher E-utilities rate limits
    #[serde(default)]
    pub ncbi_api_key: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_kegg_url() -> String { "https://rest.kegg.jp".to_string() }
fn default_ncbi_url() -> String { "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string() }
fn default_archs4_url() -> String { "https://maayanlab.cloud/matrixapi/coltop".to_string() }
fn default_user_agent() -> String { format!("pathrank/{} (research)", env!("CARGO_PKG_VERSION")) }
fn default_timeout() -> u64 { 30 }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kegg_base_url: default_kegg_url(),
            ncbi_base_url: default_ncbi_url(),
            archs4_url: default_archs4_url(),
            ncbi_api_key: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SourceConfig {
    /// Hosts of every configured source, for the sandbox allowlist.
    pub fn hosts(&self) -> Vec<String> {
        [&self.kegg_base_url, &self.ncbi_base_url, &self.archs4_url]
            .iter()
            .filter_map(|u| url::Url::parse(u).ok())
            .filter_map(|u| u.host_str().map(String::from))
            .collect()
    }
}

// ── Scoring Configuration ─────────────────────────────────────────────────────

/// Weights of the three blended signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_unit_weight")]
    pub relation: f64,

    #[serde(default = "default_unit_weight")]
    pub similarity: f64,

    /// Co-expression is a noisier, indirect signal
    #[serde(default = "default_correlation_weight")]
    pub correlation: f64,
}

fn default_unit_weight() -> f64 { 1.0 }
fn default_correlation_weight() -> f64 { 0.8 }

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            relation: default_unit_weight(),
            similarity: default_unit_weight(),
            correlation: default_correlation_weight(),
        }
    }
}

/// How several interaction records for the same gene fold into one relation score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationAggregation {
    /// Score of the first record encountered, in document order
    #[default]
    First,
    Max,
    Sum,
    Mean,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    #[serde(default)]
    pub relation_aggregation: RelationAggregation,

    /// Number of most frequently co-occurring genes scored for similarity
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,

    /// Number of co-expressed genes requested from the co-expression source
    #[serde(default = "default_coexpression_top_n")]
    pub coexpression_top_n: usize,
}

fn default_candidate_pool() -> usize { 20 }
fn default_coexpression_top_n() -> usize { 10 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            relation_aggregation: RelationAggregation::default(),
            candidate_pool: default_candidate_pool(),
            coexpression_top_n: default_coexpression_top_n(),
        }
    }
}

// ── Execution Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Pathway documents fetched per run (first N pathways of the reference gene)
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,

    /// Parallel document fetch + extraction tasks
    #[serde(default = "default_workers")]
    pub document_concurrency: usize,

    /// Parallel pathway lookups during similarity scoring
    #[serde(default = "default_workers")]
    pub similarity_concurrency: usize,

    /// Retries per failed lookup (0 = single attempt)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries; attempt n waits n × this
    #[serde(default = "default_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_max_documents() -> usize { 3 }
fn default_workers() -> usize { 4 }
fn default_max_retries() -> u32 { 2 }
fn default_backoff() -> u64 { 500 }

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_documents: default_max_documents(),
            document_concurrency: default_workers(),
            similarity_concurrency: default_workers(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_backoff(),
        }
    }
}

// ── Output Configuration ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of ranked genes kept
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// CSV destination; `None` or an empty string disables export
    #[serde(default = "default_csv_path", deserialize_with = "blank_as_none")]
    pub csv_path: Option<String>,
}

fn default_top_n() -> usize { 20 }
fn default_csv_path() -> Option<String> { Some("top_genes_by_pathway.csv".to_string()) }

/// TOML has no null, so `csv_path = ""` is how a TOML file switches export off.
fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|p| !p.trim().is_empty()))
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            csv_path: default_csv_path(),
        }
    }
}

// ── Disease Search Configuration ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseSearchConfig {
    /// Diseases from the catalogue compared against the query (listing order)
    #[serde(default = "default_max_checked")]
    pub max_checked: usize,

    /// Matches kept after sorting
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Parallel disease record fetches
    #[serde(default = "default_workers")]
    pub concurrency: usize,
}

fn default_max_checked() -> usize { 200 }
fn default_max_results() -> usize { 50 }

impl Default for DiseaseSearchConfig {
    fn default() -> Self {
        Self {
            max_checked: default_max_checked(),
            max_results: default_max_results(),
            concurrency: default_workers(),
        }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl RunConfig {
    /// Load from TOML file
    pub fn from_toml(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from YAML file
    pub fn from_yaml(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load a config file, picking the format from its extension (TOML when unknown).
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Config file not found: {}", path);
        }
        let config = match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(path)?,
            Some("json") => Self::from_json(path)?,
            _ => Self::from_toml(path)?,
        };
        tracing::debug!(path, "Run configuration loaded");
        Ok(config)
    }

    /// Load from `PATHRANK_CONFIG` if set, defaults otherwise.
    pub fn load_or_default() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Fill secrets from the environment when not set in the file.
    pub fn apply_env_overrides(&mut self) {
        if self.sources.ncbi_api_key.is_none() {
            self.sources.ncbi_api_key = std::env::var("PATHRANK_NCBI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty());
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.target.organism.trim().is_empty() {
            return Err(PathrankError::Config("target.organism must not be empty".into()));
        }
        if self.execution.document_concurrency == 0 || self.execution.similarity_concurrency == 0 {
            return Err(PathrankError::Config("concurrency limits must be at least 1".into()));
        }
        if self.execution.max_documents == 0 {
            return Err(PathrankError::Config("execution.max_documents must be at least 1".into()));
        }
        if self.output.top_n == 0 {
            return Err(PathrankError::Config("output.top_n must be at least 1".into()));
        }
        if self.disease_search.concurrency == 0 || self.disease_search.max_results == 0 {
            return Err(PathrankError::Config(
                "disease_search.concurrency and max_results must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

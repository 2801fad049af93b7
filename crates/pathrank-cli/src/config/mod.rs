//! Configuration loading for the pathrank binary.
//! Reads the file given by `--config` (or the PATHRANK_CONFIG env var) and
//! layers command-line overrides on top.

use anyhow::Context;
use pathrank_common::{RelationAggregation, RunConfig};

/// Load the run configuration, falling back to defaults when no file is named.
pub fn load(path: Option<&str>) -> anyhow::Result<RunConfig> {
    let mut config = match path {
        Some(p) => RunConfig::load(p).with_context(|| format!("loading config from {p}"))?,
        None => RunConfig::default(),
    };
    config.apply_env_overrides();
    Ok(config)
}

/// Command-line settings that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct RankOverrides {
    pub gene: Option<String>,
    pub gene_id: Option<String>,
    pub organism: Option<String>,
    pub top_n: Option<usize>,
    pub documents: Option<usize>,
    pub candidates: Option<usize>,
    pub aggregation: Option<RelationAggregation>,
    pub csv: Option<String>,
    pub no_csv: bool,
}

impl RankOverrides {
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(gene) = &self.gene {
            config.target.gene = gene.clone();
            // a symbol given on the command line replaces any id pinned in the file
            config.target.gene_id = None;
        }
        if let Some(id) = &self.gene_id {
            config.target.gene_id = Some(id.clone());
        }
        if let Some(org) = &self.organism {
            config.target.organism = org.clone();
        }
        if let Some(n) = self.top_n {
            config.output.top_n = n;
        }
        if let Some(n) = self.documents {
            config.execution.max_documents = n;
        }
        if let Some(n) = self.candidates {
            config.scoring.candidate_pool = n;
        }
        if let Some(policy) = self.aggregation {
            config.scoring.relation_aggregation = policy;
        }
        if let Some(path) = &self.csv {
            config.output.csv_path = Some(path.clone());
        }
        if self.no_csv {
            config.output.csv_path = None;
        }
    }
}

#[cfg(test)]
mod tests;

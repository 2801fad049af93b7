//! Subcommand handlers.

pub mod rank;
pub mod pathways;
pub mod info;
pub mod parse;
pub mod diseases;

use anyhow::Context;
use pathrank_common::{GeneId, RunConfig};
use pathrank_ingestion::sources::NcbiGeneResolver;
use pathrank_ingestion::SymbolResolver;

/// Output format shared by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Accept a qualified id (`hsa:7157`), a bare numeric id (`7157`) or a
/// symbol (`TP53`); symbols go through NCBI.
pub async fn resolve_gene(config: &RunConfig, gene: &str) -> anyhow::Result<GeneId> {
    let gene = gene.trim();
    if gene.contains(':') || gene.chars().all(|c| c.is_ascii_digit()) {
        return Ok(GeneId::parse(gene));
    }
    let resolver = NcbiGeneResolver::new(&config.sources)?;
    resolver
        .resolve_to_gene_id(gene)
        .await
        .with_context(|| format!("resolving {gene} through NCBI"))?
        .with_context(|| format!("unknown gene symbol: {gene}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_ids_bypass_symbol_lookup() {
        let config = RunConfig::default();
        assert_eq!(resolve_gene(&config, "7157").await.unwrap(), GeneId::new("7157"));
        assert_eq!(resolve_gene(&config, " hsa:472 ").await.unwrap(), GeneId::new("472"));
    }
}

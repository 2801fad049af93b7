//! Remote source clients and the interfaces the ranking pipeline consumes.

pub mod kegg;
pub mod ncbi;
pub mod archs4;

use async_trait::async_trait;

use pathrank_common::{DiseaseId, FetchError, GeneId, PathwayId};

pub use archs4::Archs4Client;
pub use kegg::{KeggClient, KeggRecord};
pub use ncbi::NcbiGeneResolver;

/// Pathway membership and pathway diagram retrieval.
#[async_trait]
pub trait PathwayLookup: Send + Sync {
    /// Pathways the gene belongs to, in the order the source lists them,
    /// without duplicates. An unknown gene yields an empty list.
    async fn fetch_pathways_for_gene(&self, gene: &GeneId) -> Result<Vec<PathwayId>, FetchError>;

    /// Raw KGML text of one pathway diagram.
    async fn fetch_document(&self, pathway: &PathwayId) -> Result<String, FetchError>;
}

/// Disease catalogue and the pathways each disease involves.
#[async_trait]
pub trait DiseaseLookup: Send + Sync {
    /// Every `(disease, name)` pair of the catalogue, in listing order.
    async fn list_diseases(&self) -> Result<Vec<(DiseaseId, String)>, FetchError>;

    /// Pathways the disease entry lists. An unknown disease yields an empty list.
    async fn fetch_disease_pathways(&self, disease: &DiseaseId) -> Result<Vec<PathwayId>, FetchError>;
}

/// Genes whose expression correlates with a given gene.
#[async_trait]
pub trait CoExpressionSource: Send + Sync {
    /// Up to `top_n` (symbol, correlation) pairs, strongest first. The
    /// queried gene itself is not included.
    async fn fetch_top_correlated(
        &self,
        symbol: &str,
        top_n: usize,
    ) -> Result<Vec<(String, f64)>, FetchError>;
}

/// Gene symbol → organism-local gene id.
#[async_trait]
pub trait SymbolResolver: Send + Sync {
    async fn resolve_to_gene_id(&self, symbol: &str) -> Result<Option<GeneId>, FetchError>;
}

//! pathrank-ingestion — Remote data sources for a ranking run:
//! - KEGG REST (pathway membership, KGML documents, gene and disease records)
//! - NCBI E-utilities (symbol → Entrez gene id)
//! - ARCHS4 (co-expression)

pub mod sources;

pub use sources::{CoExpressionSource, DiseaseLookup, PathwayLookup, SymbolResolver};

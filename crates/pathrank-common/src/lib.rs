//! pathrank-common — Shared types, errors, and configuration used across all pathrank crates.

pub mod error;
pub mod entities;
pub mod run_config;
pub mod sandbox;

// Re-export commonly used types
pub use entities::{CandidateScore, DiseaseId, GeneId, InteractionRecord, PathwayId};
pub use error::{FetchError, PathrankError, Result};
pub use run_config::{DiseaseSearchConfig, RunConfig, ScoringConfig, ExecutionConfig, RelationAggregation, ScoreWeights};

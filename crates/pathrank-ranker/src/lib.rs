//! pathrank-ranker — Pathway-neighbourhood ranking engine.
//! Scores relation types, pathway similarity and co-expression, and blends
//! them into one ranked list per reference gene. Also compares diseases by
//! the pathways they involve.

pub mod relation_score;
pub mod similarity;
pub mod combiner;
pub mod weights;
pub mod cancel;
pub mod pipeline;
pub mod disease;
pub mod export;

pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use disease::{find_similar_diseases, DiseaseMatch, DiseaseSearchReport};
pub use combiner::{aggregate_relation_scores, combine};
pub use pipeline::{run_analysis, RankingResult, RankingSources};
pub use relation_score::RelationKind;
pub use similarity::{jaccard, PathwaySimilarityScorer, SimilarityReport};

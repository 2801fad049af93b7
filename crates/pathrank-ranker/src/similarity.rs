//! Pathway-membership similarity between candidate genes and the reference.
//!
//! Similarity is the Jaccard index of the two genes' pathway sets. Lookups go
//! through a bounded worker pool; each gene's set is fetched at most once per
//! run and cached for the scorer's lifetime.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use pathrank_common::{ExecutionConfig, FetchError, GeneId, PathwayId};
use pathrank_ingestion::PathwayLookup;

use crate::cancel::Cancellation;

type PathwayCache = Arc<RwLock<HashMap<GeneId, Vec<PathwayId>>>>;

/// |A ∩ B| / |A ∪ B|, or 0 when both sets are empty.
pub fn jaccard(a: &BTreeSet<PathwayId>, b: &BTreeSet<PathwayId>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Outcome of [`PathwaySimilarityScorer::score_all`]. Every requested gene
/// ends up in exactly one of the three groups.
#[derive(Debug, Clone, Default)]
pub struct SimilarityReport {
    pub scores: HashMap<GeneId, f64>,
    pub failed: Vec<GeneId>,
    pub cancelled: Vec<GeneId>,
}

impl SimilarityReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }
}

#[derive(Debug, Clone)]
struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

pub struct PathwaySimilarityScorer<L: PathwayLookup + ?Sized + 'static> {
    lookup: Arc<L>,
    cache: PathwayCache,
    semaphore: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl<L: PathwayLookup + ?Sized + 'static> PathwaySimilarityScorer<L> {
    pub fn new(lookup: Arc<L>, max_concurrency: usize, max_retries: u32, backoff: Duration) -> Self {
        Self {
            lookup,
            cache: Arc::new(RwLock::new(HashMap::new())),
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            retry: RetryPolicy { max_retries, backoff },
        }
    }

    pub fn from_config(lookup: Arc<L>, exec: &ExecutionConfig) -> Self {
        Self::new(
            lookup,
            exec.similarity_concurrency,
            exec.max_retries,
            Duration::from_millis(exec.retry_backoff_ms),
        )
    }

    /// Pathways of `gene` in listing order, fetched with retries on a cache
    /// miss and cached afterwards.
    pub async fn pathways(&self, gene: &GeneId, cancel: &Cancellation) -> Result<Vec<PathwayId>, FetchError> {
        fetch_cached(self.lookup.as_ref(), &self.cache, gene, &self.retry, cancel).await
    }

    /// Similarity of one gene against `reference`. The reference set is
    /// never modified.
    pub async fn similarity(&self, gene: &GeneId, reference: &BTreeSet<PathwayId>) -> Result<f64, FetchError> {
        let pathways = fetch_cached(
            self.lookup.as_ref(),
            &self.cache,
            gene,
            &self.retry,
            &Cancellation::never(),
        )
        .await?;
        Ok(jaccard(&pathways.into_iter().collect(), reference))
    }

    /// Score every gene in `genes` against `reference` on the worker pool.
    ///
    /// Failed lookups are isolated per gene. On cancellation in-flight
    /// lookups are abandoned and the genes they were serving are reported
    /// as cancelled; scores already gathered are kept.
    pub async fn score_all(
        &self,
        genes: &[GeneId],
        reference: &BTreeSet<PathwayId>,
        cancel: &Cancellation,
    ) -> SimilarityReport {
        let mut unique: Vec<GeneId> = Vec::with_capacity(genes.len());
        let mut seen = HashSet::new();
        for gene in genes {
            if seen.insert(gene.clone()) {
                unique.push(gene.clone());
            }
        }

        let reference = Arc::new(reference.clone());
        let mut set = JoinSet::new();
        for gene in unique.iter().cloned() {
            let lookup = Arc::clone(&self.lookup);
            let cache = Arc::clone(&self.cache);
            let semaphore = Arc::clone(&self.semaphore);
            let reference = Arc::clone(&reference);
            let retry = self.retry.clone();
            let cancel = cancel.clone();

            set.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return (gene, Err(FetchError::Cancelled)),
                    p = semaphore.acquire_owned() => p,
                };
                let Ok(_hold) = permit else {
                    return (gene, Err(FetchError::Cancelled));
                };
                let result = fetch_cached(lookup.as_ref(), &cache, &gene, &retry, &cancel)
                    .await
                    .map(|pathways| jaccard(&pathways.into_iter().collect(), &reference));
                (gene, result)
            });
        }

        let mut report = SimilarityReport::default();
        let mut was_cancelled = false;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled(), if !was_cancelled => {
                    was_cancelled = true;
                    set.abort_all();
                }
                next = set.join_next() => match next {
                    Some(Ok((gene, Ok(score)))) => {
                        debug!(gene = %gene, score, "Similarity scored");
                        report.scores.insert(gene, score);
                    }
                    Some(Ok((gene, Err(FetchError::Cancelled)))) => report.cancelled.push(gene),
                    Some(Ok((gene, Err(e)))) => {
                        warn!(gene = %gene, error = %e, "Pathway lookup failed; gene scored without similarity");
                        report.failed.push(gene);
                    }
                    // aborted or panicked; accounted for below
                    Some(Err(_)) => {}
                    None => break,
                },
            }
        }

        for gene in unique {
            let accounted = report.scores.contains_key(&gene)
                || report.failed.contains(&gene)
                || report.cancelled.contains(&gene);
            if !accounted {
                if was_cancelled {
                    report.cancelled.push(gene);
                } else {
                    report.failed.push(gene);
                }
            }
        }
        report.failed.sort();
        report.cancelled.sort();

        info!(
            scored = report.scores.len(),
            failed = report.failed.len(),
            cancelled = report.cancelled.len(),
            "Similarity scoring finished"
        );
        report
    }
}

/// Cached pathway set for `gene`, fetching with retries on a miss.
async fn fetch_cached<L: PathwayLookup + ?Sized>(
    lookup: &L,
    cache: &PathwayCache,
    gene: &GeneId,
    retry: &RetryPolicy,
    cancel: &Cancellation,
) -> Result<Vec<PathwayId>, FetchError> {
    if let Some(hit) = cache.read().await.get(gene) {
        return Ok(hit.clone());
    }

    let mut attempt: u32 = 0;
    let pathways = loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            r = lookup.fetch_pathways_for_gene(gene) => r,
        };
        match outcome {
            Ok(p) => break p,
            Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                attempt += 1;
                let wait = retry.backoff * attempt;
                debug!(gene = %gene, attempt, error = %e, "Retrying pathway lookup in {:?}", wait);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                    _ = tokio::time::sleep(wait) => {}
                }
            }
            Err(e) => return Err(e),
        }
    };

    cache.write().await.insert(gene.clone(), pathways.clone());
    Ok(pathways)
}

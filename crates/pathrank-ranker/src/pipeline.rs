//! One ranking run, end to end.
//!
//! Stages:
//!   1. Resolve the reference gene (symbol → gene id)
//!   2. Fetch the reference gene's pathway set
//!   3. Fetch + analyse the first N pathway documents in parallel
//!   4. Pick the most frequently co-occurring genes as candidates
//!   5. Pathway similarity for every candidate
//!   6. Co-expression correlation (optional, non-fatal)
//!   7. Combine and rank

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use pathrank_common::{
    CandidateScore, FetchError, GeneId, InteractionRecord, PathrankError, PathwayId, Result, RunConfig,
};
use pathrank_ingestion::{CoExpressionSource, PathwayLookup, SymbolResolver};
use pathrank_kg::{analyse_document, DocumentAnalysis, GenePathwayAggregator, KgmlParser};

use crate::cancel::Cancellation;
use crate::combiner::{aggregate_relation_scores, combine};
use crate::similarity::{PathwaySimilarityScorer, SimilarityReport};
use crate::weights;

/// External services a run depends on.
#[derive(Clone)]
pub struct RankingSources {
    pub pathways: Arc<dyn PathwayLookup>,
    pub resolver: Arc<dyn SymbolResolver>,
    /// `None` skips the correlation signal entirely.
    pub coexpression: Option<Arc<dyn CoExpressionSource>>,
}

/// Everything a run produced, ranked scores included.
#[derive(Debug, Clone)]
pub struct RankingResult {
    pub symbol: String,
    pub reference: GeneId,
    /// Reference pathways in the order the lookup listed them.
    pub reference_pathways: Vec<PathwayId>,
    /// Documents analysed, in listing order.
    pub documents: Vec<PathwayId>,
    pub failed_documents: Vec<PathwayId>,
    pub interactions: Vec<InteractionRecord>,
    /// Candidate pool with co-occurrence counts, most frequent first.
    pub candidates: Vec<(GeneId, usize)>,
    pub similarity: SimilarityReport,
    pub correlation: HashMap<GeneId, f64>,
    pub scores: Vec<CandidateScore>,
    /// The run was cancelled part-way; scores cover the data gathered so far.
    pub cancelled: bool,
}

#[instrument(skip_all, fields(gene = %config.target.gene))]
pub async fn run_analysis(
    config: &RunConfig,
    sources: &RankingSources,
    cancel: &Cancellation,
) -> Result<RankingResult> {
    config.validate()?;
    weights::check(&config.scoring.weights)?;
    if cancel.is_cancelled() {
        return Err(PathrankError::Cancelled);
    }

    let symbol = config.target.gene.trim().to_string();
    let reference = resolve_reference(config, sources.resolver.as_ref(), cancel).await?;
    info!(symbol = %symbol, reference = %reference, "Reference gene resolved");

    // ── Reference pathways ────────────────────────────────────────────────
    let scorer = PathwaySimilarityScorer::from_config(Arc::clone(&sources.pathways), &config.execution);
    let reference_pathways = match scorer.pathways(&reference, cancel).await {
        Ok(p) => p,
        Err(FetchError::Cancelled) => return Err(PathrankError::Cancelled),
        Err(e) => return Err(e.into()),
    };
    if reference_pathways.is_empty() {
        return Err(PathrankError::NoCandidatePathways(reference));
    }
    info!(pathways = reference_pathways.len(), "Reference pathway set fetched");

    // ── Documents ─────────────────────────────────────────────────────────
    // first N in listing order
    let selected: Vec<PathwayId> = reference_pathways
        .iter()
        .take(config.execution.max_documents)
        .cloned()
        .collect();
    let parser = Arc::new(KgmlParser::new(&config.target.organism));
    let batch = analyse_documents(
        Arc::clone(&sources.pathways),
        parser,
        &selected,
        &reference,
        config.execution.document_concurrency,
        cancel,
    )
    .await;

    if batch.analyses.is_empty() {
        if cancel.is_cancelled() {
            return Err(PathrankError::Cancelled);
        }
        return Err(PathrankError::NoDocuments(reference));
    }

    let mut aggregator = GenePathwayAggregator::new();
    let mut interactions = Vec::new();
    let mut documents = Vec::with_capacity(batch.analyses.len());
    for analysis in batch.analyses {
        if !analysis.reference_present {
            debug!(pathway = %analysis.pathway, "Reference gene has no entry in this document");
        }
        documents.push(analysis.pathway);
        aggregator.merge(analysis.aggregator);
        interactions.extend(analysis.interactions);
    }
    info!(
        documents = documents.len(),
        failed = batch.failed.len(),
        genes = aggregator.gene_count(),
        interactions = interactions.len(),
        "Pathway documents analysed"
    );

    // ── Candidates + similarity ───────────────────────────────────────────
    let candidates = aggregator.top_genes(config.scoring.candidate_pool, Some(&reference));
    let candidate_ids: Vec<GeneId> = candidates.iter().map(|(g, _)| g.clone()).collect();
    let similarity = if cancel.is_cancelled() {
        SimilarityReport { cancelled: candidate_ids.clone(), ..SimilarityReport::default() }
    } else {
        let reference_set: BTreeSet<PathwayId> = reference_pathways.iter().cloned().collect();
        scorer.score_all(&candidate_ids, &reference_set, cancel).await
    };

    // ── Co-expression ─────────────────────────────────────────────────────
    let correlation = match &sources.coexpression {
        Some(source) if !cancel.is_cancelled() => {
            fetch_correlation(
                source.as_ref(),
                sources.resolver.as_ref(),
                &symbol,
                &reference,
                config.scoring.coexpression_top_n,
                cancel,
            )
            .await
        }
        _ => HashMap::new(),
    };

    // ── Combine ───────────────────────────────────────────────────────────
    let relation = aggregate_relation_scores(&interactions, config.scoring.relation_aggregation);
    let scores = combine(
        &candidate_ids,
        &relation,
        &similarity.scores,
        &correlation,
        &config.scoring.weights,
        config.output.top_n,
    );
    let cancelled = cancel.is_cancelled();
    info!(ranked = scores.len(), cancelled, "Ranking complete");

    Ok(RankingResult {
        symbol,
        reference,
        reference_pathways,
        documents,
        failed_documents: batch.failed,
        interactions,
        candidates,
        similarity,
        correlation,
        scores,
        cancelled,
    })
}

async fn resolve_reference(
    config: &RunConfig,
    resolver: &dyn SymbolResolver,
    cancel: &Cancellation,
) -> Result<GeneId> {
    if let Some(id) = config.target.gene_id.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(GeneId::parse(id));
    }
    let symbol = config.target.gene.trim();
    if symbol.is_empty() {
        return Err(PathrankError::Config("target.gene must not be empty".into()));
    }
    let resolved = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PathrankError::Cancelled),
        r = resolver.resolve_to_gene_id(symbol) => r?,
    };
    resolved.ok_or_else(|| PathrankError::UnknownGene(symbol.to_string()))
}

struct DocumentBatch {
    analyses: Vec<DocumentAnalysis>,
    failed: Vec<PathwayId>,
}

/// Fetch and analyse documents on a bounded pool. Results come back in
/// `pathways` order regardless of completion order.
async fn analyse_documents(
    lookup: Arc<dyn PathwayLookup>,
    parser: Arc<KgmlParser>,
    pathways: &[PathwayId],
    reference: &GeneId,
    concurrency: usize,
    cancel: &Cancellation,
) -> DocumentBatch {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut set = JoinSet::new();
    for (index, pathway) in pathways.iter().cloned().enumerate() {
        let lookup = Arc::clone(&lookup);
        let parser = Arc::clone(&parser);
        let semaphore = Arc::clone(&semaphore);
        let reference = reference.clone();
        let cancel = cancel.clone();

        set.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return (index, pathway, Err(FetchError::Cancelled)),
                p = semaphore.acquire_owned() => p,
            };
            let Ok(_hold) = permit else {
                return (index, pathway, Err(FetchError::Cancelled));
            };
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                r = lookup.fetch_document(&pathway) => r,
            };
            let analysis = fetched.map(|doc| analyse_document(&parser, &pathway, &doc, &reference));
            (index, pathway, analysis)
        });
    }

    let mut slots: Vec<Option<DocumentAnalysis>> = vec![None; pathways.len()];
    let mut failed = Vec::new();
    let mut aborted = false;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled(), if !aborted => {
                aborted = true;
                set.abort_all();
            }
            next = set.join_next() => match next {
                Some(Ok((index, _, Ok(analysis)))) => slots[index] = Some(analysis),
                Some(Ok((_, pathway, Err(FetchError::Cancelled)))) => {
                    debug!(pathway = %pathway, "Document fetch abandoned");
                }
                Some(Ok((_, pathway, Err(e)))) => {
                    warn!(pathway = %pathway, error = %e, "Pathway document unavailable; skipped");
                    failed.push(pathway);
                }
                Some(Err(e)) if e.is_panic() => warn!(error = %e, "Document task panicked"),
                Some(Err(_)) => {}
                None => break,
            },
        }
    }

    failed.sort();
    DocumentBatch {
        analyses: slots.into_iter().flatten().collect(),
        failed,
    }
}

/// Co-expressed genes mapped to gene ids. Any failure degrades to a
/// partial or empty map.
async fn fetch_correlation(
    source: &dyn CoExpressionSource,
    resolver: &dyn SymbolResolver,
    symbol: &str,
    reference: &GeneId,
    top_n: usize,
    cancel: &Cancellation,
) -> HashMap<GeneId, f64> {
    let pairs = tokio::select! {
        biased;
        _ = cancel.cancelled() => return HashMap::new(),
        r = source.fetch_top_correlated(symbol, top_n) => r,
    };
    let pairs = match pairs {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Co-expression unavailable; ranking without correlation");
            return HashMap::new();
        }
    };

    let mut correlation = HashMap::new();
    for (co_symbol, value) in pairs {
        let resolved = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            r = resolver.resolve_to_gene_id(&co_symbol) => r,
        };
        match resolved {
            Ok(Some(id)) if &id == reference => {}
            Ok(Some(id)) => {
                correlation.entry(id).or_insert(value);
            }
            Ok(None) => warn!(symbol = %co_symbol, "Co-expressed symbol has no gene id; skipped"),
            Err(e) => warn!(symbol = %co_symbol, error = %e, "Symbol resolution failed; skipped"),
        }
    }
    info!(genes = correlation.len(), "Co-expression correlations resolved");
    correlation
}

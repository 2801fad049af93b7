//! Disease similarity search.
//!
//! A query disease is compared against the catalogue by the Jaccard index of
//! the pathway sets each disease entry lists. Record fetches run on a bounded
//! worker pool; a failed fetch drops only that disease from the comparison.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use pathrank_common::{DiseaseId, DiseaseSearchConfig, FetchError, PathrankError, PathwayId, Result};
use pathrank_ingestion::DiseaseLookup;

use crate::cancel::Cancellation;
use crate::similarity::jaccard;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseMatch {
    pub disease: DiseaseId,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiseaseSearchReport {
    pub query: Option<DiseaseId>,
    pub query_pathways: Vec<PathwayId>,
    /// Diseases whose records were fetched and compared.
    pub compared: usize,
    /// Best matches first; ties broken by disease id.
    pub matches: Vec<DiseaseMatch>,
    pub failed: Vec<DiseaseId>,
    pub cancelled: bool,
}

/// Rank catalogue diseases by pathway overlap with `query`.
///
/// The first `max_checked` catalogue entries other than the query are
/// compared. Only matches with a positive score are reported. On
/// cancellation the matches gathered so far are returned with
/// `cancelled` set.
#[instrument(skip(lookup, config, cancel), fields(query = %query))]
pub async fn find_similar_diseases(
    lookup: Arc<dyn DiseaseLookup>,
    query: &DiseaseId,
    config: &DiseaseSearchConfig,
    cancel: &Cancellation,
) -> Result<DiseaseSearchReport> {
    let query_pathways = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PathrankError::Cancelled),
        r = lookup.fetch_disease_pathways(query) => r?,
    };
    if query_pathways.is_empty() {
        return Err(PathrankError::NoDiseasePathways(query.clone()));
    }
    let reference: Arc<BTreeSet<PathwayId>> = Arc::new(query_pathways.iter().cloned().collect());

    let catalogue = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PathrankError::Cancelled),
        r = lookup.list_diseases() => r?,
    };
    let candidates: Vec<(DiseaseId, String)> = catalogue
        .into_iter()
        .filter(|(id, _)| id != query)
        .take(config.max_checked)
        .collect();
    info!(candidates = candidates.len(), "Comparing disease pathway sets");

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut set = JoinSet::new();
    for (disease, name) in candidates {
        let lookup = Arc::clone(&lookup);
        let semaphore = Arc::clone(&semaphore);
        let reference = Arc::clone(&reference);
        let cancel = cancel.clone();

        set.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return (disease, name, Err(FetchError::Cancelled)),
                p = semaphore.acquire_owned() => p,
            };
            let Ok(_hold) = permit else {
                return (disease, name, Err(FetchError::Cancelled));
            };
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                r = lookup.fetch_disease_pathways(&disease) => r,
            };
            let score = result.map(|pathways| jaccard(&pathways.into_iter().collect(), &reference));
            (disease, name, score)
        });
    }

    let mut report = DiseaseSearchReport {
        query: Some(query.clone()),
        query_pathways,
        ..DiseaseSearchReport::default()
    };
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled(), if !report.cancelled => {
                report.cancelled = true;
                set.abort_all();
            }
            next = set.join_next() => match next {
                Some(Ok((disease, name, Ok(score)))) => {
                    report.compared += 1;
                    if score > 0.0 {
                        debug!(disease = %disease, score, "Disease overlaps query");
                        report.matches.push(DiseaseMatch { disease, name, score });
                    }
                }
                Some(Ok((_, _, Err(FetchError::Cancelled)))) => {}
                Some(Ok((disease, _, Err(e)))) => {
                    warn!(disease = %disease, error = %e, "Disease record unavailable; skipped");
                    report.failed.push(disease);
                }
                // aborted on cancellation
                Some(Err(_)) => {}
                None => break,
            },
        }
    }

    report.matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.disease.cmp(&b.disease))
    });
    report.matches.truncate(config.max_results);
    report.failed.sort();

    info!(
        compared = report.compared,
        matches = report.matches.len(),
        failed = report.failed.len(),
        cancelled = report.cancelled,
        "Disease search finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancellation;
    use pathrank_test_utils::MockDiseaseLookup;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio_test::assert_err;

    fn config(max_checked: usize, max_results: usize) -> DiseaseSearchConfig {
        DiseaseSearchConfig { max_checked, max_results, concurrency: 2 }
    }

    fn catalogue() -> MockDiseaseLookup {
        MockDiseaseLookup::new()
            .with("H00003", "Acute myeloid leukemia", &["hsa05221", "hsa04110", "hsa04151"])
            .with("H00004", "Chronic myeloid leukemia", &["hsa05220", "hsa04110", "hsa04151"])
            .with("H00005", "Chronic lymphocytic leukemia", &["hsa04110"])
            .with("H00010", "Huntington disease", &["hsa05016"])
            .with("H00020", "Colorectal cancer", &["hsa05210", "hsa04110", "hsa04151", "hsa05221"])
    }

    fn ids(report: &DiseaseSearchReport) -> Vec<String> {
        report.matches.iter().map(|m| m.disease.to_string()).collect()
    }

    #[tokio::test]
    async fn test_matches_sorted_by_overlap() {
        let lookup = Arc::new(catalogue());
        let report = find_similar_diseases(lookup, &"H00003".into(), &config(100, 10), &Cancellation::never())
            .await
            .unwrap();

        // H00020: 3 of 4, H00004: 2 of 4, H00005: 1 of 3; H00010 shares nothing
        assert_eq!(ids(&report), vec!["H00020", "H00004", "H00005"]);
        assert!((report.matches[0].score - 0.75).abs() < 1e-12);
        assert_eq!(report.matches[1].name, "Chronic myeloid leukemia");
        assert_eq!(report.compared, 4);
        assert!(!report.cancelled);
        assert_eq!(report.query_pathways.len(), 3);
    }

    #[tokio::test]
    async fn test_limits_apply_in_catalogue_order() {
        let lookup = Arc::new(catalogue());
        let report = find_similar_diseases(lookup, &"ds:H00003".into(), &config(2, 1), &Cancellation::never())
            .await
            .unwrap();
        // only H00004 and H00005 are checked; the query itself is skipped
        assert_eq!(report.compared, 2);
        assert_eq!(ids(&report), vec!["H00004"]);
    }

    #[tokio::test]
    async fn test_failed_records_are_skipped() {
        let lookup = Arc::new(catalogue().broken("H00020"));
        let report = find_similar_diseases(lookup, &"H00003".into(), &config(100, 10), &Cancellation::never())
            .await
            .unwrap();
        assert_eq!(report.failed, vec![DiseaseId::new("H00020")]);
        assert_eq!(ids(&report), vec!["H00004", "H00005"]);
        assert_eq!(report.compared, 3);
    }

    #[tokio::test]
    async fn test_query_without_pathways_is_rejected() {
        let lookup = Arc::new(catalogue().with("H00999", "Unmapped disease", &[]));
        let result =
            find_similar_diseases(lookup, &"H00999".into(), &config(100, 10), &Cancellation::never()).await;
        assert!(matches!(assert_err!(result), PathrankError::NoDiseasePathways(d) if d.as_str() == "H00999"));
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_matches() {
        let lookup = Arc::new(catalogue().slow("H00020", Duration::from_secs(30)));
        let (handle, signal) = cancellation();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            handle.cancel();
        });

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            find_similar_diseases(lookup, &"H00003".into(), &config(100, 10), &signal),
        )
        .await
        .expect("cancellation should end the search promptly")
        .unwrap();
        canceller.await.unwrap();

        assert!(report.cancelled);
        assert_eq!(ids(&report), vec!["H00004", "H00005"]);
        assert_eq!(report.compared, 3);
    }
}

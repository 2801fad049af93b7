use std::sync::Arc;

use anyhow::Context;
use comfy_table::{ContentArrangement, Table};
use tracing::warn;

use pathrank_common::{DiseaseId, RunConfig};
use pathrank_ingestion::sources::KeggClient;
use pathrank_ranker::{cancellation, find_similar_diseases, DiseaseSearchReport};

use super::OutputFormat;

pub async fn run(config: &RunConfig, disease: &str, format: OutputFormat) -> anyhow::Result<()> {
    let kegg = Arc::new(KeggClient::new(&config.sources, &config.target.organism)?);
    let query = resolve_disease(&kegg, disease).await?;

    let (handle, signal) = cancellation();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; reporting the diseases compared so far");
            handle.cancel();
        }
    });

    let report = find_similar_diseases(kegg, &query, &config.disease_search, &signal)
        .await
        .with_context(|| format!("searching diseases similar to {query}"));
    interrupt.abort();
    let report = report?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }
    Ok(())
}

/// Disease codes are used as given; anything else is a name search that
/// must match exactly one entry.
async fn resolve_disease(kegg: &KeggClient, disease: &str) -> anyhow::Result<DiseaseId> {
    if DiseaseId::looks_like_code(disease) {
        return Ok(DiseaseId::new(disease));
    }
    let hits = kegg
        .find_diseases(disease)
        .await
        .with_context(|| format!("searching KEGG DISEASE for {disease}"))?;
    pick_single_hit(disease, hits)
}

fn pick_single_hit(query: &str, mut hits: Vec<(DiseaseId, String)>) -> anyhow::Result<DiseaseId> {
    match hits.len() {
        0 => anyhow::bail!("no KEGG disease matches {query:?}"),
        1 => Ok(hits.remove(0).0),
        n => {
            let listed: Vec<String> = hits
                .iter()
                .take(10)
                .map(|(id, name)| format!("  {id}  {name}"))
                .collect();
            anyhow::bail!(
                "{n} KEGG diseases match {query:?}; pass one of their codes:\n{}",
                listed.join("\n")
            )
        }
    }
}

fn print_table(report: &DiseaseSearchReport) {
    if let Some(query) = &report.query {
        println!(
            "Query {query}: {} pathways, {} diseases compared",
            report.query_pathways.len(),
            report.compared
        );
    }
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "disease", "name", "similarity"]);
    for (rank, m) in report.matches.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            m.disease.to_string(),
            m.name.clone(),
            format!("{:.3}", m.score),
        ]);
    }
    println!("{table}");
    if !report.failed.is_empty() {
        println!("{} disease record(s) could not be fetched", report.failed.len());
    }
    if report.cancelled {
        println!("Search interrupted; results cover the diseases compared so far");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_name_hit_is_used() {
        let hits = vec![(DiseaseId::new("H00003"), "Acute myeloid leukemia; AML".to_string())];
        assert_eq!(pick_single_hit("myeloid", hits).unwrap(), DiseaseId::new("H00003"));
    }

    #[test]
    fn test_ambiguous_or_missing_names_fail() {
        assert!(pick_single_hit("none", Vec::new()).is_err());
        let hits = vec![
            (DiseaseId::new("H00003"), "Acute myeloid leukemia".to_string()),
            (DiseaseId::new("H00004"), "Chronic myeloid leukemia".to_string()),
        ];
        let err = pick_single_hit("leukemia", hits).unwrap_err().to_string();
        assert!(err.contains("H00004"));
    }
}

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use comfy_table::{ContentArrangement, Table};
use tracing::{info, warn};

use pathrank_common::RunConfig;
use pathrank_ingestion::sources::{Archs4Client, KeggClient, NcbiGeneResolver};
use pathrank_ingestion::CoExpressionSource;
use pathrank_ranker::export::write_csv_file;
use pathrank_ranker::{cancellation, run_analysis, RankingResult, RankingSources};

use super::OutputFormat;

pub async fn run(config: &RunConfig, coexpression: bool, format: OutputFormat) -> anyhow::Result<()> {
    let sources = RankingSources {
        pathways: Arc::new(KeggClient::new(&config.sources, &config.target.organism)?),
        resolver: Arc::new(NcbiGeneResolver::new(&config.sources)?),
        coexpression: if coexpression {
            Some(Arc::new(Archs4Client::new(&config.sources)?) as Arc<dyn CoExpressionSource>)
        } else {
            None
        },
    };

    let (handle, signal) = cancellation();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; ranking with the data gathered so far");
            handle.cancel();
        }
    });

    let result = run_analysis(config, &sources, &signal)
        .await
        .with_context(|| format!("ranking neighbours of {}", config.target.gene));
    interrupt.abort();
    let result = result?;

    match format {
        OutputFormat::Table => print_table(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result.scores)?),
    }

    if let Some(path) = &config.output.csv_path {
        write_csv_file(Path::new(path), &result.scores)
            .with_context(|| format!("writing {path}"))?;
        info!("Results saved to {path}");
    }
    Ok(())
}

fn print_table(result: &RankingResult) {
    println!(
        "Reference {} ({}): {} pathways, {} documents analysed, {} interactions",
        result.symbol,
        result.reference,
        result.reference_pathways.len(),
        result.documents.len(),
        result.interactions.len(),
    );
    if !result.failed_documents.is_empty() {
        println!("Unavailable documents: {}", join(&result.failed_documents));
    }
    if !result.similarity.failed.is_empty() {
        println!("Similarity lookups failed for: {}", join(&result.similarity.failed));
    }
    if result.cancelled {
        println!("Run interrupted; ranking is partial.");
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "gene_id", "total", "relation", "similarity", "correlation"]);
    for (rank, score) in result.scores.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            score.gene_id().to_string(),
            format!("{:.3}", score.total_score()),
            format!("{:.3}", score.relation_score()),
            format!("{:.3}", score.similarity_score()),
            format!("{:.3}", score.correlation()),
        ]);
    }
    println!("{table}");
    println!("{} gene(s)", result.scores.len());
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

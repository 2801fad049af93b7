use anyhow::Context;
use serde_json::json;

use pathrank_common::RunConfig;
use pathrank_ingestion::sources::{KeggClient, KeggRecord};

use super::{resolve_gene, OutputFormat};

pub async fn run(config: &RunConfig, gene: &str, format: OutputFormat) -> anyhow::Result<()> {
    let gene_id = resolve_gene(config, gene).await?;
    let kegg = KeggClient::new(&config.sources, &config.target.organism)?;
    let record = kegg
        .fetch_gene_record(&gene_id)
        .await?
        .with_context(|| format!("KEGG has no record for {}", gene_id.qualified(kegg.organism())))?;

    let pathways = record.pathways();
    let diseases = record.diseases();
    let drugs = record.drug_targets();
    match format {
        OutputFormat::Json => {
            let value = json!({
                "gene_id": gene_id,
                "full_name": record.full_name(gene),
                "symbols": record.symbols(),
                "definition": record.definition(),
                "orthology": record.orthology(),
                "pathways": pathways.iter().map(|(id, title)| json!({"id": id, "title": title})).collect::<Vec<_>>(),
                "diseases": diseases.iter().map(|(id, title)| json!({"id": id, "title": title})).collect::<Vec<_>>(),
                "drug_targets": drugs.iter().map(|(drug, ids)| json!({"drug": drug, "kegg_drug": ids})).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            println!("{} ({})", record.full_name(gene), gene_id.qualified(kegg.organism()));
            let symbols = record.symbols();
            if !symbols.is_empty() {
                println!("Symbols:    {}", symbols.join(", "));
            }
            if let Some(def) = record.definition() {
                println!("Definition: {def}");
            }
            println!("Pathways ({}):", pathways.len());
            for (id, title) in &pathways {
                println!("  {id}  {title}");
            }
            if !diseases.is_empty() {
                println!("Diseases ({}):", diseases.len());
                for (id, title) in &diseases {
                    println!("  {id}  {title}");
                }
            }
            let drug_lines = drug_target_lines(&record);
            if !drug_lines.is_empty() {
                println!("Drug targets ({}):", drug_lines.len());
                for line in &drug_lines {
                    println!("  {line}");
                }
            }
        }
    }
    Ok(())
}

/// One `drug  D00001, D00002` line per DRUG_TARGET entry.
fn drug_target_lines(record: &KeggRecord) -> Vec<String> {
    record
        .drug_targets()
        .into_iter()
        .map(|(drug, ids)| format!("{drug}  {}", ids.join(", ")))
        .collect()
}

use comfy_table::{ContentArrangement, Table};

use pathrank_common::RunConfig;
use pathrank_ingestion::sources::KeggClient;
use pathrank_ingestion::PathwayLookup;

use super::{resolve_gene, OutputFormat};

pub async fn run(config: &RunConfig, gene: &str, format: OutputFormat) -> anyhow::Result<()> {
    let gene_id = resolve_gene(config, gene).await?;
    let kegg = KeggClient::new(&config.sources, &config.target.organism)?;
    let pathways = kegg.fetch_pathways_for_gene(&gene_id).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pathways)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["pathway"]);
            for p in &pathways {
                table.add_row(vec![p.to_string()]);
            }
            println!("{}: {}", gene, gene_id.qualified(kegg.organism()));
            println!("{table}");
            println!("{} pathway(s)", pathways.len());
        }
    }
    Ok(())
}

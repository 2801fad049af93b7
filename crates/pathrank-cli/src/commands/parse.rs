//! Offline inspection of a KGML file.

use anyhow::Context;
use comfy_table::{ContentArrangement, Table};
use serde_json::json;

use pathrank_common::{GeneId, PathwayId};
use pathrank_kg::{analyse_document, extract_sections, KgmlParser};
use pathrank_ranker::RelationKind;

use super::OutputFormat;

pub fn run(file: &str, organism: &str, reference: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("reading {file}"))?;
    let sections = extract_sections(&text);
    let parser = KgmlParser::new(organism);
    let parsed = parser.parse_sections(&sections);
    let inherited = sections.relations.iter().filter(|r| r.inherited_subtype).count();

    let pathway = PathwayId::new(
        std::path::Path::new(file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file),
    );
    let analysis = reference.map(|r| analyse_document(&parser, &pathway, &text, &GeneId::parse(r)));

    match format {
        OutputFormat::Json => {
            let interactions = analysis.as_ref().map(|a| &a.interactions);
            let value = json!({
                "file": file,
                "gene_entries": parsed.entries.len(),
                "relations": parsed.relations.len(),
                "inherited_subtypes": inherited,
                "entries": parsed.entries,
                "interactions": interactions,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            println!(
                "{file}: {} gene entries, {} relations ({} with inherited subtype)",
                parsed.entries.len(),
                parsed.relations.len(),
                inherited
            );
            if let Some(a) = analysis {
                let mut table = Table::new();
                table.set_content_arrangement(ContentArrangement::Dynamic);
                table.set_header(vec!["gene_id", "relation", "strength"]);
                for record in &a.interactions {
                    let kind = RelationKind::from_label(record.relation_type.as_deref());
                    table.add_row(vec![
                        record.gene_id.to_string(),
                        record.relation_type.clone().unwrap_or_else(|| "-".to_string()),
                        format!("{:.2}", kind.strength()),
                    ]);
                }
                println!("{table}");
            }
        }
    }
    Ok(())
}

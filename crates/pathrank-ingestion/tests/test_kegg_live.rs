//! Live KEGG / NCBI / ARCHS4 smoke tests.
//!
//! Run with: cargo test --package pathrank-ingestion --test test_kegg_live -- --ignored --nocapture

use pathrank_common::run_config::SourceConfig;
use pathrank_common::{DiseaseId, GeneId, PathwayId};
use pathrank_ingestion::sources::{Archs4Client, KeggClient, NcbiGeneResolver};
use pathrank_ingestion::{CoExpressionSource, DiseaseLookup, PathwayLookup, SymbolResolver};

#[tokio::test]
#[ignore] // Requires network access
async fn test_tp53_pathways_and_cell_cycle_kgml() {
    let client = KeggClient::new(&SourceConfig::default(), "hsa").unwrap();

    let pathways = client
        .fetch_pathways_for_gene(&GeneId::new("7157"))
        .await
        .expect("KEGG link failed");
    println!("TP53 is in {} pathways", pathways.len());
    assert!(pathways.contains(&PathwayId::new("hsa04115")));

    let kgml = client
        .fetch_document(&PathwayId::new("hsa04110"))
        .await
        .expect("KEGG kgml failed");
    assert!(kgml.contains("<relation"));
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_atm_gene_record() {
    let client = KeggClient::new(&SourceConfig::default(), "hsa").unwrap();
    let record = client
        .fetch_gene_record(&GeneId::new("472"))
        .await
        .expect("KEGG get failed")
        .expect("ATM record missing");
    println!("ATM: {}", record.full_name("ATM"));
    assert!(!record.pathways().is_empty());
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_egfr_drug_targets() {
    let client = KeggClient::new(&SourceConfig::default(), "hsa").unwrap();
    let record = client
        .fetch_gene_record(&GeneId::new("1956"))
        .await
        .expect("KEGG get failed")
        .expect("EGFR record missing");
    let drugs = record.drug_targets();
    println!("EGFR targeted by {} drugs", drugs.len());
    assert!(drugs.iter().any(|(_, ids)| !ids.is_empty()));
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_aml_disease_pathways_and_catalogue() {
    let client = KeggClient::new(&SourceConfig::default(), "hsa").unwrap();
    let pathways = client
        .fetch_disease_pathways(&DiseaseId::new("H00003"))
        .await
        .expect("KEGG disease get failed");
    assert!(pathways.contains(&PathwayId::new("hsa05221")));

    let catalogue = client.list_diseases().await.expect("KEGG list failed");
    println!("{} diseases listed", catalogue.len());
    assert!(catalogue.iter().any(|(id, _)| id.as_str() == "H00003"));

    let hits = client.find_diseases("ataxia telangiectasia").await.expect("KEGG find failed");
    assert!(hits.iter().any(|(id, _)| id.as_str() == "H00040"));
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_ncbi_resolves_tp53() {
    let resolver = NcbiGeneResolver::new(&SourceConfig::default()).unwrap();
    let id = resolver.resolve_to_gene_id("TP53").await.expect("esearch failed");
    assert_eq!(id, Some(GeneId::new("7157")));
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_archs4_top_correlated() {
    let client = Archs4Client::new(&SourceConfig::default()).unwrap();
    let pairs = client.fetch_top_correlated("BRCA1", 5).await.expect("ARCHS4 failed");
    for (gene, corr) in &pairs {
        println!("{gene}\t{corr:.3}");
    }
    assert!(pairs.len() <= 5);
    assert!(pairs.iter().all(|(g, _)| g != "BRCA1"));
}

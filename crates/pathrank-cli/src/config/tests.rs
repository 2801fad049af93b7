#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_path_gives_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.target.organism, "hsa");
        assert_eq!(config.output.top_n, 20);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load(Some("/nonexistent/pathrank.toml")).is_err());
    }

    #[test]
    fn test_symbol_override_clears_pinned_id() {
        let mut config = RunConfig::default();
        config.target.gene_id = Some("7157".into());
        RankOverrides { gene: Some("ATM".into()), ..Default::default() }.apply(&mut config);
        assert_eq!(config.target.gene, "ATM");
        assert_eq!(config.target.gene_id, None);
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = RunConfig::default();
        RankOverrides {
            top_n: Some(5),
            documents: Some(10),
            candidates: Some(50),
            aggregation: Some(RelationAggregation::Max),
            no_csv: true,
            ..Default::default()
        }
        .apply(&mut config);
        assert_eq!(config.output.top_n, 5);
        assert_eq!(config.execution.max_documents, 10);
        assert_eq!(config.scoring.candidate_pool, 50);
        assert_eq!(config.scoring.relation_aggregation, RelationAggregation::Max);
        assert_eq!(config.output.csv_path, None);
    }

    #[test]
    fn test_csv_override_without_no_csv() {
        let mut config = RunConfig::default();
        RankOverrides { csv: Some("out.csv".into()), ..Default::default() }.apply(&mut config);
        assert_eq!(config.output.csv_path.as_deref(), Some("out.csv"));
    }
}

//! CSV export of ranked candidates.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use pathrank_common::{CandidateScore, Result};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    gene_id: &'a str,
    total_score: f64,
    relation_score: f64,
    similarity_score: f64,
    correlation: f64,
}

impl<'a> From<&'a CandidateScore> for CsvRow<'a> {
    fn from(c: &'a CandidateScore) -> Self {
        Self {
            gene_id: c.gene_id().as_str(),
            total_score: c.total_score(),
            relation_score: c.relation_score(),
            similarity_score: c.similarity_score(),
            correlation: c.correlation(),
        }
    }
}

/// Write `scores` in rank order, one row per gene, with a header row.
pub fn write_csv<W: Write>(writer: W, scores: &[CandidateScore]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if scores.is_empty() {
        wtr.write_record(["gene_id", "total_score", "relation_score", "similarity_score", "correlation"])?;
    }
    for score in scores {
        wtr.serialize(CsvRow::from(score))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, scores: &[CandidateScore]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(file, scores)?;
    tracing::info!(path = %path.display(), rows = scores.len(), "Ranking written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathrank_common::{GeneId, ScoreWeights};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_header_and_rows() {
        let w = ScoreWeights::default();
        let scores = vec![
            CandidateScore::from_signals(GeneId::new("472"), 0.75, 0.5, 0.0, &w),
            CandidateScore::from_signals(GeneId::new("7157"), 0.0, 0.2, 1.0, &w),
        ];
        let mut buf = Vec::new();
        write_csv(&mut buf, &scores).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "gene_id,total_score,relation_score,similarity_score,correlation");
        assert_eq!(lines[1], "472,1.25,0.75,0.5,0.0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_ranking_still_has_header() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "gene_id,total_score,relation_score,similarity_score,correlation\n"
        );
    }
}

//! Accuracy evaluation against a groundtruth ranking
//!
//! Both files hold tab-separated `query_id  doc_id  rank  score` rows.
//!
//! Recall here is *not* averaged per query. It is
//!
//! ```text
//!   sum over groundtruth queries q of |GT(q) ∩ RES(q)|
//!   --------------------------------------------------
//!          number of rows in the groundtruth file
//! ```
//!
//! where GT(q) and RES(q) are the *sets* of document ids listed for q.
//! Duplicate rows collapse in the numerator but still count in the
//! denominator, and queries missing from the result contribute zero.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::HarnessError;

/// Document ids per query id, plus the number of rows read
#[derive(Debug, Default)]
pub struct Ranking {
    groups: HashMap<String, HashSet<String>>,
    rows: usize,
}

impl Ranking {
    pub fn from_reader(reader: impl BufRead, source: &str) -> Result<Self> {
        let mut ranking = Ranking::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read {source}"))?;
            if line.trim().is_empty() {
                continue;
            }
            let mut cols = line.split('\t');
            let (Some(query), Some(doc)) = (cols.next(), cols.next()) else {
                return Err(HarnessError::Evaluation(format!(
                    "{source}:{}: expected tab-separated query_id and doc_id, got {line:?}",
                    idx + 1
                ))
                .into());
            };
            ranking
                .groups
                .entry(query.trim().to_string())
                .or_default()
                .insert(doc.trim().to_string());
            ranking.rows += 1;
        }
        Ok(ranking)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            HarnessError::Evaluation(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(file), &path.display().to_string())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn queries(&self) -> usize {
        self.groups.len()
    }

    fn hits_against(&self, groundtruth: &Ranking) -> usize {
        groundtruth
            .groups
            .iter()
            .map(|(query, expected)| match self.groups.get(query) {
                Some(found) => expected.intersection(found).count(),
                None => 0,
            })
            .sum()
    }
}

/// Recall of `result` against `groundtruth`, in [0, 1]
pub fn recall(result: &Ranking, groundtruth: &Ranking) -> Result<f64> {
    if groundtruth.rows == 0 {
        return Err(HarnessError::Evaluation("groundtruth has no rows".to_string()).into());
    }
    Ok(result.hits_against(groundtruth) as f64 / groundtruth.rows as f64)
}

/// Load both files and compute recall
pub fn recall_files(result_file: &Path, groundtruth_file: &Path) -> Result<f64> {
    let groundtruth = Ranking::load(groundtruth_file)?;
    let result = Ranking::load(result_file)?;
    recall(&result, &groundtruth)
        .with_context(|| format!("Scoring {}", result_file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;
    use tempfile::TempDir;

    fn ranking(text: &str) -> Ranking {
        Ranking::from_reader(text.as_bytes(), "inline").unwrap()
    }

    const GT: &str = "q1\td1\t1\t0.9\nq1\td2\t2\t0.8\nq2\td3\t1\t0.7\n";

    #[test]
    fn test_partial_recall_uses_row_denominator() {
        let result = ranking("q1\td1\t1\t0.95\nq2\td9\t1\t0.5\n");
        let r = recall(&result, &ranking(GT)).unwrap();
        assert_relative_eq!(r, 1.0 / 3.0);
    }

    #[test]
    fn test_identical_files_score_one() {
        assert_relative_eq!(recall(&ranking(GT), &ranking(GT)).unwrap(), 1.0);
    }

    #[test]
    fn test_disjoint_results_score_zero() {
        let result = ranking("q1\td7\t1\t1.0\nq2\td8\t1\t1.0\nq3\td3\t1\t1.0\n");
        assert_eq!(recall(&result, &ranking(GT)).unwrap(), 0.0);
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let shuffled = "q2\td3\t1\t0.7\nq1\td2\t2\t0.8\nq1\td1\t1\t0.9\n";
        let result = ranking("q1\td2\t1\t0.5\nq2\td3\t2\t0.4\n");
        assert_relative_eq!(
            recall(&result, &ranking(GT)).unwrap(),
            recall(&result, &ranking(shuffled)).unwrap()
        );
    }

    #[test]
    fn test_duplicates_collapse_in_numerator_only() {
        // q1/d1 listed twice in groundtruth: 2 rows, one set member
        let gt = ranking("q1\td1\t1\t0.9\nq1\td1\t1\t0.9\n");
        let result = ranking("q1\td1\t1\t0.9\nq1\td1\t2\t0.9\n");
        assert_relative_eq!(recall(&result, &gt).unwrap(), 0.5);
    }

    #[test]
    fn test_extra_result_queries_ignored() {
        let result = ranking("q1\td1\t1\t1\nq1\td2\t2\t1\nq2\td3\t1\t1\nq9\td1\t1\t1\n");
        assert_relative_eq!(recall(&result, &ranking(GT)).unwrap(), 1.0);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let gt = ranking("\nq1\td1\t1\t0.9\n\n");
        assert_eq!(gt.rows(), 1);
        assert_eq!(gt.queries(), 1);
    }

    #[test]
    fn test_empty_groundtruth_is_an_error() {
        let err = recall(&ranking(GT), &ranking("")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Evaluation(_))
        ));
    }

    #[test]
    fn test_malformed_row_is_an_error() {
        let err = Ranking::from_reader("q1 d1 1 0.9\n".as_bytes(), "gt.tsv").unwrap_err();
        assert!(err.to_string().contains("gt.tsv:1"), "got: {err}");
    }

    #[test]
    fn test_recall_files() {
        let tmp = TempDir::new().unwrap();
        let gt = tmp.path().join("gt.tsv");
        let res = tmp.path().join("results_a");
        fs::write(&gt, GT).unwrap();
        fs::write(&res, "q1\td1\t1\t0.95\nq2\td9\t1\t0.5\n").unwrap();

        assert_relative_eq!(recall_files(&res, &gt).unwrap(), 1.0 / 3.0);
    }

    #[test]
    fn test_missing_result_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let gt = tmp.path().join("gt.tsv");
        fs::write(&gt, GT).unwrap();
        assert!(recall_files(&tmp.path().join("results_x"), &gt).is_err());
    }
}

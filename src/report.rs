//! Sweep report: `report.tsv` plus the console summary

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::render::render_float;

/// One finished query variant
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub variant: String,
    /// Microseconds per query as reported by the query runner (0 if it reported none)
    pub latency_us: u64,
    /// Fraction in [0, 1]
    pub recall: f64,
}

impl ReportRow {
    /// `<variant>\t<latency>\t<recall>\n`
    pub fn tsv_line(&self) -> String {
        format!(
            "{}\t{}\t{}\n",
            self.variant,
            self.latency_us,
            render_float(self.recall)
        )
    }
}

/// Headerless TSV, one line per variant, appended as variants finish
pub struct ReportWriter {
    file: File,
    path: PathBuf,
}

impl ReportWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn append(&mut self, row: &ReportRow) -> Result<()> {
        self.file
            .write_all(row.tsv_line().as_bytes())
            .and_then(|()| self.file.flush())
            .with_context(|| format!("Failed to write report {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn print_summary(experiment: &str, rows: &[ReportRow]) {
    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📊 Results: {}", experiment);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if rows.is_empty() {
        println!("   No query variants configured");
        return;
    }

    let width = rows
        .iter()
        .map(|r| r.variant.len())
        .max()
        .unwrap_or(0)
        .max("variant".len());

    println!();
    println!("   {:<width$}  {:>12}  {:>8}", "variant", "µs/query", "recall");
    for row in rows {
        println!(
            "   {:<width$}  {:>12}  {:>7.2}%",
            row.variant,
            row.latency_us,
            row.recall * 100.0
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_tsv_line() {
        let row = ReportRow {
            variant: "fast".to_string(),
            latency_us: 812,
            recall: 0.95,
        };
        assert_eq!(row.tsv_line(), "fast\t812\t0.95\n");
    }

    #[test]
    fn test_perfect_recall_keeps_decimal() {
        let row = ReportRow {
            variant: "exact".to_string(),
            latency_us: 0,
            recall: 1.0,
        };
        assert_eq!(row.tsv_line(), "exact\t0\t1.0\n");
    }

    #[test]
    fn test_writer_appends_in_order_without_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.tsv");
        let mut writer = ReportWriter::create(&path).unwrap();

        for (name, latency) in [("b", 20), ("a", 10)] {
            writer
                .append(&ReportRow {
                    variant: name.to_string(),
                    latency_us: latency,
                    recall: 0.5,
                })
                .unwrap();
        }

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "b\t20\t0.5\na\t10\t0.5\n"
        );
    }
}

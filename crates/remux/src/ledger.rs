use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::Local;

use crate::outcome::OutcomeRecord;
use crate::report::ReconciliationReport;

/// Ledger filename, written inside the output directory. The leading
/// underscore keeps it sorted above the converted files.
pub const LEDGER_FILE_NAME: &str = "_conversion_log.txt";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only run ledger. One line per event, flushed to disk after every
/// write so a crash mid-run loses at most the in-flight record.
pub struct OutcomeLedger {
    file: File,
    path: PathBuf,
}

impl OutcomeLedger {
    /// Open a fresh ledger in the output directory and write the run
    /// header. Truncates any ledger left behind by a previous run.
    pub fn create(output_dir: &Path, source_dir: &Path) -> Result<Self> {
        let path = output_dir.join(LEDGER_FILE_NAME);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create ledger file: {}", path.display()))?;

        let mut ledger = Self { file, path };
        ledger.write_lines(&[
            format!("=== Run started: {} ===", Local::now().format(TIMESTAMP_FORMAT)),
            format!("Source path: {}", source_dir.display()),
            format!("Output path: {}", output_dir.display()),
            String::new(),
        ])?;
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one outcome line.
    pub fn append(&mut self, record: &OutcomeRecord) -> Result<()> {
        let line = format!(
            "[{}] {} | Original: {} -> New: {} | {}",
            record.at.format(TIMESTAMP_FORMAT),
            record.outcome.tag(),
            record.source_name,
            record.target_name,
            record.outcome.detail(),
        );
        self.write_lines(&[line])
    }

    /// Write the trailing reconciliation section.
    pub fn write_report(&mut self, report: &ReconciliationReport) -> Result<()> {
        let mut lines = vec![
            String::new(),
            "=== Final Reconciliation Report ===".to_string(),
        ];
        lines.extend(report.render_lines());
        self.write_lines(&lines)
    }

    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            writeln!(self.file, "{}", line)
                .with_context(|| format!("Failed to write ledger: {}", self.path.display()))?;
        }
        self.file
            .flush()
            .with_context(|| format!("Failed to flush ledger: {}", self.path.display()))?;
        Ok(())
    }
}

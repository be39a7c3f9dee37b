use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use anyhow::Result;
use humansize::{format_size, DECIMAL};
use log::warn;
use walkdir::WalkDir;

use crate::outcome::RunCounters;
use crate::plan::OUTPUT_EXTENSION;
use crate::scan::INPUT_EXTENSION;

/// End-of-run comparison between what the batch expected to produce and
/// what is actually on disk.
#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    /// Number of source recordings processed (one per input, any outcome)
    pub total_inputs: usize,
    /// Number of output files present at reconciliation time
    pub actual_outputs: usize,
    pub counters: RunCounters,
    /// Aggregate size of the source recordings
    pub total_source_bytes: u64,
    /// Expected output names (deduplicated) with no file on disk, sorted
    pub missing: Vec<String>,
}

impl ReconciliationReport {
    /// Completion by final output count. 0.0 for an empty batch.
    pub fn completion_pct(&self) -> f64 {
        if self.total_inputs == 0 {
            0.0
        } else {
            self.actual_outputs as f64 / self.total_inputs as f64 * 100.0
        }
    }

    /// Human-readable summary, printed to the console and written to the
    /// ledger verbatim.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "1. File counts:".to_string(),
            format!("   - source (.{}):  {}", INPUT_EXTENSION, self.total_inputs),
            format!("   - output (.{}): {}", OUTPUT_EXTENSION, self.actual_outputs),
            "2. Run outcome tallies:".to_string(),
            format!("   - ✅ succeeded: {}", self.counters.success),
            format!("   - ⏭️ skipped:   {}", self.counters.skip),
            format!("   - ❌ failed:    {}", self.counters.failed),
            format!("   - 📦 source size: {}", format_size(self.total_source_bytes, DECIMAL)),
            format!("   - 📈 completion: {:.1}% (by final output count)", self.completion_pct()),
        ];

        if self.missing.is_empty() {
            lines.push("✨ Every source file has a matching output.".to_string());
        } else {
            lines.push(format!(
                "⚠️  {} expected output(s) missing (check the failed items above):",
                self.missing.len()
            ));
            for name in &self.missing {
                lines.push(format!("   - {}", name));
            }
        }
        lines
    }
}

/// Fresh enumeration of output filenames. Independent of anything observed
/// during planning, so interference from outside the run still shows up.
pub fn list_output_names(output_dir: &Path) -> Result<HashSet<String>> {
    let mut names = HashSet::new();

    let walker = WalkDir::new(output_dir).max_depth(1).follow_links(false);
    for entry in walker.into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error reading output entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());
        if ext.as_deref() != Some(OUTPUT_EXTENSION) {
            continue;
        }

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.insert(name.to_string());
        }
    }

    Ok(names)
}

/// Diff the expected output names against the directory contents.
///
/// Duplicates in `expected` collapse before the diff, so two inputs that
/// normalized to the same output name count as satisfied by the single
/// file that survived. The causes of a missing name (unlogged failure,
/// external deletion, name collision) are not distinguished here.
pub fn reconcile(
    expected: &[String],
    counters: RunCounters,
    total_source_bytes: u64,
    output_dir: &Path,
) -> Result<ReconciliationReport> {
    let actual = list_output_names(output_dir)?;

    let expected_set: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
    let missing: Vec<String> = expected_set
        .iter()
        .filter(|name| !actual.contains(**name))
        .map(|name| name.to_string())
        .collect();

    Ok(ReconciliationReport {
        total_inputs: expected.len(),
        actual_outputs: actual.len(),
        counters,
        total_source_bytes,
        missing,
    })
}

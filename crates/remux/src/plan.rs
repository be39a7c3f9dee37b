use std::path::{Path, PathBuf};

use crate::normalize::canonical_stem;
use crate::scan::SourceItem;

/// File extension written by the remux step
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Where a recording's converted output lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Full path inside the output directory
    pub path: PathBuf,
    /// Filename including extension, as compared during reconciliation
    pub name: String,
}

impl OutputTarget {
    /// The canonical stem without the output extension, for display
    pub fn display_stem(&self) -> &str {
        self.name
            .strip_suffix(&format!(".{}", OUTPUT_EXTENSION))
            .unwrap_or(&self.name)
    }
}

/// Whether a recording still needs converting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanDecision {
    /// Output already present, leave it alone
    Skip,
    /// No output yet, hand to the converter
    Pending,
}

/// Compute the output target for a recording and decide whether work is
/// needed. Skip iff the target path exists at the moment of the check; the
/// window between this check and the conversion is not guarded against
/// outside writers.
pub fn plan(item: &SourceItem, output_dir: &Path) -> (OutputTarget, PlanDecision) {
    let name = format!("{}.{}", canonical_stem(&item.name), OUTPUT_EXTENSION);
    let path = output_dir.join(&name);

    let decision = if path.exists() {
        PlanDecision::Skip
    } else {
        PlanDecision::Pending
    };

    (OutputTarget { path, name }, decision)
}

use chrono::{DateTime, Local};

/// How processing a single recording ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Output already existed, conversion not attempted
    Skip,
    /// ffmpeg ran and exited cleanly
    Success,
    /// ffmpeg ran and reported an error
    Failed { reason: String },
    /// ffmpeg could not be launched at all
    Faulted { reason: String },
}

impl Outcome {
    /// Display tag used in the ledger and on the console
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Skip => "⏭️ skip",
            Outcome::Success => "✅ success",
            Outcome::Failed { .. } => "❌ failed",
            Outcome::Faulted { .. } => "💥 fault",
        }
    }

    /// Detail text for the ledger line
    pub fn detail(&self) -> String {
        match self {
            Outcome::Skip => "output already exists, nothing to do".to_string(),
            Outcome::Success => "conversion complete".to_string(),
            Outcome::Failed { reason } => format!("error: {}", reason),
            Outcome::Faulted { reason } => format!("could not run ffmpeg: {}", reason),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. } | Outcome::Faulted { .. })
    }
}

/// One ledger entry: what happened to one recording, and when
#[derive(Debug, Clone)]
pub struct OutcomeRecord {
    pub source_name: String,
    pub target_name: String,
    pub outcome: Outcome,
    pub at: DateTime<Local>,
}

impl OutcomeRecord {
    pub fn new(source_name: String, target_name: String, outcome: Outcome) -> Self {
        Self {
            source_name,
            target_name,
            outcome,
            at: Local::now(),
        }
    }
}

/// Running tallies for one batch, updated once per record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub success: usize,
    pub skip: usize,
    pub failed: usize,
}

impl RunCounters {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Skip => self.skip += 1,
            Outcome::Success => self.success += 1,
            Outcome::Failed { .. } | Outcome::Faulted { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.skip + self.failed
    }
}

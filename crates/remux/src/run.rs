use std::fs;
use std::path::PathBuf;
use anyhow::{Context, Result};
use log::info;
use thiserror::Error;

use crate::config::RemuxConfig;
use crate::ffmpeg::{self, Remuxer};
use crate::ledger::OutcomeLedger;
use crate::outcome::{Outcome, OutcomeRecord, RunCounters};
use crate::plan::{self, PlanDecision};
use crate::report::{self, ReconciliationReport};
use crate::scan::{self, INPUT_EXTENSION};

/// Fatal problems detected before any processing starts
#[derive(Debug, Error)]
pub enum RunError {
    #[error("source directory does not exist: {0}")]
    MissingSourceDir(PathBuf),
}

/// How a batch run ended
#[derive(Debug)]
pub enum RunStatus {
    /// Full pass over the inputs, reconciliation attached
    Completed(ReconciliationReport),
    /// Nothing to convert; no ledger was created
    NoMatchingFiles,
}

const DISPLAY_NAME_MAX: usize = 25;

fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        let cut: String = name.chars().take(max_chars).collect();
        format!("{}..", cut)
    } else {
        name.to_string()
    }
}

/// Convert every .ts recording in the source directory, one at a time, then
/// reconcile the output directory against what the batch expected to
/// produce.
///
/// Per-item conversion problems become ledger records and never abort the
/// pass. The only blocking wait is on the remux subprocess itself; a hung
/// tool hangs the run.
pub async fn run<R: Remuxer>(cfg: &RemuxConfig, remuxer: &R) -> Result<RunStatus> {
    if !cfg.source_dir.exists() {
        return Err(RunError::MissingSourceDir(cfg.source_dir.clone()).into());
    }

    let output_dir = cfg.output_dir();
    if output_dir.exists() {
        println!("📂 Output folder ready: {}", output_dir.display());
    } else {
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
        println!("📂 Created output folder: {}", output_dir.display());
    }

    let items = scan::scan_source_dir(&cfg.source_dir)?;
    if items.is_empty() {
        println!(
            "⚠️  No .{} files found in {}",
            INPUT_EXTENSION,
            cfg.source_dir.display()
        );
        return Ok(RunStatus::NoMatchingFiles);
    }

    let total = items.len();
    info!("Processing {} recording(s) from {}", total, cfg.source_dir.display());

    let mut ledger = OutcomeLedger::create(&output_dir, &cfg.source_dir)?;

    println!("\n🎬 Preparing to process {} video(s)", total);
    println!("📝 Run ledger: {}", ledger.path().display());
    println!("{}", "-".repeat(60));

    let mut counters = RunCounters::default();
    let mut expected = Vec::with_capacity(total);
    let mut total_source_bytes = 0u64;

    for (i, item) in items.iter().enumerate() {
        let index = i + 1;

        let (target, decision) = plan::plan(item, &output_dir);
        expected.push(target.name.clone());
        total_source_bytes += item.size;

        let outcome = match decision {
            PlanDecision::Skip => Outcome::Skip,
            PlanDecision::Pending => ffmpeg::execute(remuxer, item, &target).await,
        };
        counters.record(&outcome);

        let record = OutcomeRecord::new(item.name.clone(), target.name.clone(), outcome);

        let progress = index as f64 / total as f64 * 100.0;
        println!(
            "[{}/{}] {:.1}% | ✅:{} ⏭️:{} ❌:{} | {} {}",
            index,
            total,
            progress,
            counters.success,
            counters.skip,
            counters.failed,
            record.outcome.tag(),
            truncate_name(target.display_stem(), DISPLAY_NAME_MAX),
        );

        ledger.append(&record)?;
    }

    let report = report::reconcile(&expected, counters, total_source_bytes, &output_dir)?;

    println!("\n{} 📊 Final Reconciliation Report {}", "=".repeat(20), "=".repeat(20));
    for line in report.render_lines() {
        println!("{}", line);
    }
    ledger.write_report(&report)?;

    println!("{}", "=".repeat(60));
    println!("Converted videos: {}", output_dir.display());
    println!("Run ledger:       {}", ledger.path().display());

    Ok(RunStatus::Completed(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::RemuxStatus;
    use crate::ledger::LEDGER_FILE_NAME;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    /// Stub remuxer: succeeds by writing the input's name into the output
    /// file, or fails with scripted stderr for selected inputs. Records
    /// every invocation so tests can assert what was (not) attempted.
    struct ScriptedRemuxer {
        failures: HashMap<String, &'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRemuxer {
        fn succeeding() -> Self {
            Self {
                failures: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(name: &str, stderr: &'static str) -> Self {
            let mut failures = HashMap::new();
            failures.insert(name.to_string(), stderr);
            Self {
                failures,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Remuxer for ScriptedRemuxer {
        async fn remux(&self, input: &Path, output: &Path) -> Result<RemuxStatus> {
            let name = input
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap()
                .to_string();
            self.calls.lock().unwrap().push(name.clone());

            if let Some(stderr) = self.failures.get(&name) {
                Ok(RemuxStatus {
                    exit_code: 1,
                    stderr: stderr.to_string(),
                })
            } else {
                fs::write(output, name.as_bytes())?;
                Ok(RemuxStatus {
                    exit_code: 0,
                    stderr: String::new(),
                })
            }
        }
    }

    /// Stub that fails the test outright if the run loop ever invokes it
    struct PanicRemuxer;

    impl Remuxer for PanicRemuxer {
        async fn remux(&self, input: &Path, _output: &Path) -> Result<RemuxStatus> {
            panic!("remuxer invoked for {}", input.display());
        }
    }

    fn config_for(root: &Path) -> (RemuxConfig, PathBuf) {
        let source = root.join("recordings");
        fs::create_dir_all(&source).unwrap();
        let cfg = RemuxConfig {
            source_dir: source,
            output_folder_name: "out".to_string(),
        };
        let output_dir = cfg.output_dir();
        (cfg, output_dir)
    }

    fn completed(status: RunStatus) -> ReconciliationReport {
        match status {
            RunStatus::Completed(report) => report,
            other => panic!("expected a completed run, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn three_file_batch_covers_skip_success_and_failure() {
        let root = tempfile::tempdir().unwrap();
        let (cfg, output_dir) = config_for(root.path());
        fs::write(cfg.source_dir.join("done-already.ts"), b"a").unwrap();
        fs::write(cfg.source_dir.join("good_clip.ts"), b"bb").unwrap();
        fs::write(cfg.source_dir.join("bad_clip.ts"), b"ccc").unwrap();

        // One output pre-exists, so its source must be skipped.
        fs::create_dir_all(&output_dir).unwrap();
        fs::write(output_dir.join("done already.mp4"), b"old").unwrap();

        let remuxer = ScriptedRemuxer::failing_on("bad_clip.ts", "stream error at 00:00:01");
        let report = completed(run(&cfg, &remuxer).await.unwrap());

        assert_eq!(report.counters.success, 1);
        assert_eq!(report.counters.skip, 1);
        assert_eq!(report.counters.failed, 1);
        assert_eq!(report.counters.total(), 3);
        assert_eq!(report.total_inputs, 3);
        assert_eq!(report.missing, vec!["bad clip.mp4".to_string()]);

        // The skipped recording never reached the remuxer.
        assert_eq!(remuxer.calls(), vec!["bad_clip.ts", "good_clip.ts"]);

        let ledger = fs::read_to_string(output_dir.join(LEDGER_FILE_NAME)).unwrap();
        assert!(ledger.starts_with("=== Run started: "));
        let item_lines = ledger.lines().filter(|l| l.starts_with('[')).count();
        assert_eq!(item_lines, 3);
        assert!(ledger.contains("Original: bad_clip.ts -> New: bad clip.mp4 | error: stream error at 00:00:01"));
        assert!(ledger.contains("=== Final Reconciliation Report ==="));
        assert!(ledger.contains("   - bad clip.mp4"));
    }

    #[tokio::test]
    async fn preexisting_output_short_circuits_the_remuxer() {
        let root = tempfile::tempdir().unwrap();
        let (cfg, output_dir) = config_for(root.path());
        fs::write(cfg.source_dir.join("show.ts"), b"x").unwrap();
        fs::create_dir_all(&output_dir).unwrap();
        fs::write(output_dir.join("show.mp4"), b"already here").unwrap();

        let report = completed(run(&cfg, &PanicRemuxer).await.unwrap());
        assert_eq!(report.counters.skip, 1);
        assert!(report.missing.is_empty());
    }

    #[tokio::test]
    async fn colliding_names_first_conversion_wins() {
        let root = tempfile::tempdir().unwrap();
        let (cfg, output_dir) = config_for(root.path());
        fs::write(cfg.source_dir.join("My-Show.ts"), b"1").unwrap();
        fs::write(cfg.source_dir.join("My_Show.ts"), b"2").unwrap();

        let remuxer = ScriptedRemuxer::succeeding();
        let report = completed(run(&cfg, &remuxer).await.unwrap());

        // Sorted order puts My-Show.ts first; its output materializes
        // before the second item's existence check, so the second is
        // skipped. The diff dedups to one expected name and sees the one
        // file, so nothing is reported missing.
        assert_eq!(report.counters.success, 1);
        assert_eq!(report.counters.skip, 1);
        assert_eq!(report.total_inputs, 2);
        assert_eq!(report.actual_outputs, 1);
        assert!(report.missing.is_empty());

        let survivor = fs::read_to_string(output_dir.join("My Show.mp4")).unwrap();
        assert_eq!(survivor, "My-Show.ts");

        let ledger = fs::read_to_string(output_dir.join(LEDGER_FILE_NAME)).unwrap();
        let item_lines = ledger.lines().filter(|l| l.starts_with('[')).count();
        assert_eq!(item_lines, 2);
    }

    #[tokio::test]
    async fn colliding_names_retry_the_target_when_the_first_attempt_left_nothing() {
        let root = tempfile::tempdir().unwrap();
        let (cfg, output_dir) = config_for(root.path());
        fs::write(cfg.source_dir.join("Show-1.ts"), b"1").unwrap();
        fs::write(cfg.source_dir.join("Show_1.ts"), b"2").unwrap();

        // The first collider fails without producing output, so the second
        // still sees an absent target and converts it.
        let remuxer = ScriptedRemuxer::failing_on("Show-1.ts", "stream error at 00:00:01");
        let report = completed(run(&cfg, &remuxer).await.unwrap());

        assert_eq!(remuxer.calls(), vec!["Show-1.ts", "Show_1.ts"]);
        assert_eq!(report.counters.failed, 1);
        assert_eq!(report.counters.success, 1);

        // The collision masks the failure: the one expected name has a
        // file on disk, so reconciliation reports nothing missing.
        assert!(report.missing.is_empty());
        let survivor = fs::read_to_string(output_dir.join("Show 1.mp4")).unwrap();
        assert_eq!(survivor, "Show_1.ts");
    }

    #[tokio::test]
    async fn empty_source_dir_creates_no_ledger() {
        let root = tempfile::tempdir().unwrap();
        let (cfg, output_dir) = config_for(root.path());

        let status = run(&cfg, &PanicRemuxer).await.unwrap();
        assert!(matches!(status, RunStatus::NoMatchingFiles));
        assert!(!output_dir.join(LEDGER_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn missing_source_dir_is_a_typed_error() {
        let root = tempfile::tempdir().unwrap();
        let cfg = RemuxConfig {
            source_dir: root.path().join("does-not-exist"),
            output_folder_name: "out".to_string(),
        };

        let err = run(&cfg, &PanicRemuxer).await.unwrap_err();
        assert!(err.downcast_ref::<RunError>().is_some());
    }

    #[tokio::test]
    async fn faults_are_logged_and_the_pass_continues() {
        struct BrokenLauncher;
        impl Remuxer for BrokenLauncher {
            async fn remux(&self, _input: &Path, _output: &Path) -> Result<RemuxStatus> {
                Err(anyhow::anyhow!("ffmpeg not found on PATH"))
            }
        }

        let root = tempfile::tempdir().unwrap();
        let (cfg, output_dir) = config_for(root.path());
        fs::write(cfg.source_dir.join("one.ts"), b"1").unwrap();
        fs::write(cfg.source_dir.join("two.ts"), b"2").unwrap();

        let report = completed(run(&cfg, &BrokenLauncher).await.unwrap());
        assert_eq!(report.counters.failed, 2);
        assert_eq!(report.missing.len(), 2);

        let ledger = fs::read_to_string(output_dir.join(LEDGER_FILE_NAME)).unwrap();
        assert_eq!(ledger.matches("💥 fault").count(), 2);
        assert!(ledger.contains("could not run ffmpeg: ffmpeg not found on PATH"));
    }

    #[test]
    fn truncation_is_character_based() {
        assert_eq!(truncate_name("short", 25), "short");
        let long = "a very long recording name indeed";
        assert_eq!(truncate_name(long, 25), "a very long recording nam..");
        let unicode = "日本語のタイトル".repeat(5);
        let cut = truncate_name(&unicode, 25);
        assert_eq!(cut.chars().count(), 27);
    }
}

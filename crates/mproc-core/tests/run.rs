use std::{
    fs,
    path::Path,
    time::{Duration, Instant},
};

use tokio_util::sync::CancellationToken;

use mproc_core::{Orchestrator, OrchestratorConfig, RunRegistry, RunRequest};
use mproc_model::{ExecMode, ModifierRange};

fn ranges(specs: &[&str]) -> Vec<ModifierRange> {
    specs.iter().map(|s| s.parse().unwrap()).collect()
}

fn cfg(root: &Path) -> OrchestratorConfig {
    OrchestratorConfig::new(root).with_signals(false)
}

/// Journal lines without their timestamp prefix.
fn journal(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l[22..].to_string())
        .collect()
}

fn count(lines: &[String], needle: &str) -> usize {
    lines.iter().filter(|l| l.ends_with(needle)).count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fan_out_writes_one_file_per_variant() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(cfg(tmp.path()).with_concurrency(3));

    let report = orch
        .run(
            RunRequest::new("echo %0", ranges(&["3"])).with_input("mproc run 'echo %0' -m 3"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.summary.total, 3);
    assert!(report.summary.all_succeeded());
    for i in 1..=3 {
        let out = report.ctx.out_dir.join(format!("mp_{i}.out"));
        assert_eq!(fs::read_to_string(out).unwrap(), format!("{i}\n"));
    }

    let raw = fs::read_to_string(report.log_path()).unwrap();
    let stamp = &raw[..22];
    assert!(raw.lines().all(|l| l.starts_with(stamp)), "{raw}");

    let lines = journal(&report.log_path());
    assert_eq!(lines[0], "Input: mproc run 'echo %0' -m 3");
    assert_eq!(lines[1], format!("Output: {}", report.ctx.out_dir.display()));
    assert_eq!(lines[2], format!("Orchestrator pid: {}", std::process::id()));
    assert_eq!(lines[3], "Total of 3 jobs.");
    assert_eq!(lines[4], "Initialized worker pool of size 3.");
    assert_eq!(count(&lines, "Completed successfully."), 3);
    assert_eq!(count(&lines, "Done."), 1);
    assert_eq!(lines.last().unwrap(), "Done.");

    let registry = RunRegistry::new(tmp.path().join("pids"));
    assert!(!registry.entries().unwrap().contains(&std::process::id()));
}

#[tokio::test]
async fn each_job_launches_before_it_completes() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(cfg(tmp.path()).with_concurrency(2));

    let report = orch
        .run(RunRequest::new("echo %0", ranges(&["4"])), CancellationToken::new())
        .await
        .unwrap();

    let lines = journal(&report.log_path());
    for (i, line) in lines.iter().enumerate() {
        if let Some(handle) = line.strip_suffix(" Completed successfully.") {
            let launched = lines[..i]
                .iter()
                .any(|l| l.starts_with(handle) && l.contains("Executing command: \"echo "));
            assert!(launched, "no launch line before {line}");
        }
    }
}

#[tokio::test]
async fn three_stage_pipeline_without_ranges() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(cfg(tmp.path()));

    let report = orch
        .run(
            RunRequest::new(r"printf 'b\na\nc\n' | sort | head -n 2", vec![]),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.ctx.concurrency, 1);
    let out = fs::read_to_string(report.ctx.out_dir.join("mp.out")).unwrap();
    assert_eq!(out, "a\nb\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_ranges_cover_the_product() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(cfg(tmp.path()).with_concurrency(4));

    let report = orch
        .run(
            RunRequest::new("echo %0-%1", ranges(&["2", "10:30:10"])),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.summary.succeeded, 6);
    for a in 1..=2 {
        for b in [10, 20, 30] {
            let out = report.ctx.out_dir.join(format!("mp_{a}_{b}.out"));
            assert_eq!(fs::read_to_string(out).unwrap(), format!("{a}-{b}\n"));
        }
    }
}

#[tokio::test]
async fn failures_are_recorded_per_variant() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(cfg(tmp.path()));

    let report = orch
        .run(
            RunRequest::new("sh -c 'exit %0'", ranges(&["0:2"])),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.failed, 2);
    assert!(!report.summary.all_succeeded());

    let lines = journal(&report.log_path());
    assert_eq!(count(&lines, "Failed with exit status 1."), 1);
    assert_eq!(count(&lines, "Failed with exit status 2."), 1);
    assert_eq!(lines.last().unwrap(), "Done.");
}

#[tokio::test]
async fn shell_mode_runs_through_sh() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(cfg(tmp.path()).with_mode(ExecMode::Shell));

    let report = orch
        .run(
            RunRequest::new("echo hidden-%0 > /dev/null; echo shell-%0", ranges(&["2"])),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.summary.succeeded, 2);
    let out = fs::read_to_string(report.ctx.out_dir.join("mp_2.out")).unwrap();
    assert_eq!(out, "shell-2\n");
    let lines = journal(&report.log_path());
    assert_eq!(
        lines
            .iter()
            .filter(|l| l.contains("Executing command (shell mode)"))
            .count(),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_kills_running_and_skips_the_rest() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(cfg(tmp.path()).with_concurrency(2));
    let stop = CancellationToken::new();

    let trigger = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let report = orch
        .run(RunRequest::new("sleep 30 | cat", ranges(&["4"])), stop)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.cancelled);
    assert_eq!(report.summary.killed, 2);
    assert_eq!(report.summary.skipped, 2);
    assert!(report.ctx.out_dir.join("mp_1.out").is_file());
    assert!(report.ctx.out_dir.join("mp_2.out").is_file());
    assert!(!report.ctx.out_dir.join("mp_3.out").exists());
    assert!(!report.ctx.out_dir.join("mp_4.out").exists());

    let lines = journal(&report.log_path());
    assert_eq!(count(&lines, "Cancellation requested. Cleaning up."), 1);
    assert_eq!(count(&lines, "Manually killed."), 2);
    assert_eq!(count(&lines, "Skipped 2 undispatched jobs."), 1);
    assert_eq!(lines.last().unwrap(), "Done.");

    let registry = RunRegistry::new(tmp.path().join("pids"));
    assert!(registry.entries().unwrap().is_empty());
}

#[tokio::test]
async fn same_template_twice_gets_two_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(cfg(tmp.path()));

    let first = orch
        .run(RunRequest::new("true", vec![]), CancellationToken::new())
        .await
        .unwrap();
    let second = orch
        .run(RunRequest::new("true", vec![]), CancellationToken::new())
        .await
        .unwrap();

    assert_ne!(first.ctx.out_dir, second.ctx.out_dir);
    assert_eq!(first.ctx.command_hash, second.ctx.command_hash);
    assert!(
        second
            .ctx
            .out_dir
            .to_string_lossy()
            .ends_with(&format!("{}_1", first.ctx.command_hash))
    );
}

#[tokio::test]
async fn missing_program_fails_without_aborting_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(cfg(tmp.path()).with_concurrency(2));

    let report = orch
        .run(
            RunRequest::new("definitely-not-a-real-program-mproc %0", ranges(&["2"])),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.summary.failed, 2);
    assert!(report.ctx.out_dir.join("mp_1.out").exists());
    assert!(report.ctx.out_dir.join("mp_2.out").exists());
}

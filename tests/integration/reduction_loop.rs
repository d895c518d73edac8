//! End-to-end runs of the reduction loop over a working directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glsl_reduce::reduction::{
    build_judge, DispatchError, LineRemovalSource, ReducerConfig, ReductionDriver, ReductionError,
    ReductionKind, RenderOptions, RenderResult, RenderStatus, ShaderDispatcher, Termination,
    REDUCTION_INCOMPLETE,
};

/// Dispatcher whose renders always fail to compile with a fixed log.
struct CompileFailDispatcher {
    log: &'static str,
}

impl ShaderDispatcher for CompileFailDispatcher {
    fn render(
        &self,
        _shader: &Path,
        _options: &RenderOptions,
    ) -> Result<RenderResult, DispatchError> {
        Ok(RenderResult {
            status: RenderStatus::CompileError,
            image: None,
            log: self.log.to_string(),
        })
    }
}

/// Dispatcher that never answers.
struct DownDispatcher;

impl ShaderDispatcher for DownDispatcher {
    fn render(
        &self,
        _shader: &Path,
        _options: &RenderOptions,
    ) -> Result<RenderResult, DispatchError> {
        Err(DispatchError::Timeout {
            limit: std::time::Duration::from_secs(30),
        })
    }
}

fn seed_inputs(dir: &Path, source: &str) -> PathBuf {
    let shader = dir.join("variant.frag");
    fs::write(&shader, source).unwrap();
    fs::write(shader.with_extension("json"), r#"{"name":"variant"}"#).unwrap();
    shader
}

fn no_image_driver(dir: &Path, cfg: ReducerConfig, log: &'static str) -> ReductionDriver {
    let judge = build_judge(
        &cfg,
        Arc::new(CompileFailDispatcher { log }),
        Arc::new(glsl_reduce::reduction::ToolValidator {
            tool: "glslangValidator".into(),
        }),
        None,
        dir,
    )
    .unwrap();
    ReductionDriver::new(cfg, Box::new(LineRemovalSource), judge)
}

#[test]
fn no_image_run_spends_its_budget_in_successes() {
    let dir = tempfile::tempdir().unwrap();
    let shader = seed_inputs(dir.path(), "a\nb\nc\nd\ne\nf\ng\nh\n");
    let cfg = ReducerConfig {
        kind: ReductionKind::NoImage,
        reduce_everywhere: true,
        max_steps: 5,
        seed: 42,
        ..Default::default()
    };

    let summary = no_image_driver(dir.path(), cfg, "ERROR: 0:1").run(&shader).unwrap();

    assert_eq!(summary.termination, Termination::BudgetReached);
    assert_eq!(summary.steps_attempted, 5);
    assert_eq!(summary.steps_accepted, 5);
    assert!(dir.path().join("variant_005_success.frag").exists());
    assert!(!dir.path().join(REDUCTION_INCOMPLETE).exists());

    // Each accepted step removed one line from the previous one.
    let final_src = fs::read_to_string(&summary.final_path).unwrap();
    assert_eq!(final_src.lines().count(), 3);
    let step5 = fs::read_to_string(dir.path().join("variant_005_success.frag")).unwrap();
    assert_eq!(step5, final_src);
}

#[test]
fn diagnostic_pattern_gates_acceptance() {
    let dir = tempfile::tempdir().unwrap();
    let shader = seed_inputs(dir.path(), "a\nb\nc\n");
    let cfg = ReducerConfig {
        kind: ReductionKind::NoImage,
        reduce_everywhere: true,
        max_steps: 4,
        error_pattern: Some("undeclared identifier".into()),
        ..Default::default()
    };

    // Log never matches the pattern: every candidate is rejected.
    let summary = no_image_driver(dir.path(), cfg, "ERROR: syntax")
        .run(&shader)
        .unwrap();

    assert_eq!(summary.steps_accepted, 0);
    assert_eq!(summary.termination, Termination::BudgetReached);
    for index in 1..=4 {
        assert!(dir
            .path()
            .join(format!("variant_{index:03}_failure.frag"))
            .exists());
    }
    // Nothing was accepted, so the final file is the original.
    let final_src = fs::read_to_string(summary.final_path).unwrap();
    assert_eq!(final_src, "a\nb\nc\n");
}

#[test]
fn discarded_rejections_leave_no_step_records() {
    let dir = tempfile::tempdir().unwrap();
    let shader = seed_inputs(dir.path(), "a\nb\nc\n");
    let cfg = ReducerConfig {
        kind: ReductionKind::NoImage,
        reduce_everywhere: true,
        max_steps: 3,
        error_pattern: Some("undeclared identifier".into()),
        keep_rejected_steps: false,
        ..Default::default()
    };

    no_image_driver(dir.path(), cfg, "ERROR: syntax")
        .run(&shader)
        .unwrap();

    // Only the inputs and the final pair remain.
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "variant.frag",
            "variant.json",
            "variant_reduced_final.frag",
            "variant_reduced_final.json",
        ]
    );
}

#[test]
fn fatal_oracle_failure_leaves_marker_and_exception_dump() {
    let dir = tempfile::tempdir().unwrap();
    let shader = seed_inputs(dir.path(), "a\nb\n");
    let cfg = ReducerConfig {
        kind: ReductionKind::NoImage,
        reduce_everywhere: true,
        stop_on_error: true,
        ..Default::default()
    };
    let judge = build_judge(
        &cfg,
        Arc::new(DownDispatcher),
        Arc::new(glsl_reduce::reduction::ToolValidator {
            tool: "glslangValidator".into(),
        }),
        None,
        dir.path(),
    )
    .unwrap();
    let mut driver = ReductionDriver::new(cfg, Box::new(LineRemovalSource), judge);

    let err = driver.run(&shader).unwrap_err();
    assert!(matches!(err, ReductionError::Oracle(_)));

    // Resumable state: marker in place, the failed step recorded, and a dump
    // explaining what happened.
    assert!(dir.path().join(REDUCTION_INCOMPLETE).exists());
    assert!(dir.path().join("variant_001_error.frag").exists());
    let dump = fs::read_to_string(dir.path().join("variant_exception.txt")).unwrap();
    assert!(dump.contains("timed out"));
    assert!(!dir.path().join("variant_reduced_final.frag").exists());
}

#[test]
fn missing_metadata_fails_before_touching_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    let shader = dir.path().join("variant.frag");
    fs::write(&shader, "a\n").unwrap();

    let cfg = ReducerConfig {
        kind: ReductionKind::NoImage,
        ..Default::default()
    };
    let err = no_image_driver(dir.path(), cfg, "").run(&shader).unwrap_err();
    assert!(matches!(err, ReductionError::Usage(_)));
    assert!(!dir.path().join(REDUCTION_INCOMPLETE).exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

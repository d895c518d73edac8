//! Judge construction from the reduction kind, exercised with real files.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use glsl_reduce::reduction::{
    build_judge, DispatchError, Program, ReducerConfig, ReductionKind, RenderOptions, RenderResult,
    RenderStatus, ShaderDispatcher, ToolValidator, UsageError, CORPUS_DIR,
};

struct FixedImageDispatcher {
    image: Vec<u8>,
}

impl ShaderDispatcher for FixedImageDispatcher {
    fn render(
        &self,
        _shader: &Path,
        _options: &RenderOptions,
    ) -> Result<RenderResult, DispatchError> {
        Ok(RenderResult {
            status: RenderStatus::ImageReady,
            image: Some(self.image.clone()),
            log: String::new(),
        })
    }
}

fn validator() -> Arc<ToolValidator> {
    Arc::new(ToolValidator {
        tool: "glslangValidator".into(),
    })
}

fn program() -> Program {
    Program::from_source("void main() {}\n".into())
}

#[test]
fn identical_and_not_identical_partition_on_the_same_reference() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("reference.png");
    fs::write(&reference, b"reference-image-bytes").unwrap();

    let dispatcher = Arc::new(FixedImageDispatcher {
        image: b"reference-image-bytes".to_vec(),
    });

    let identical = build_judge(
        &ReducerConfig {
            kind: ReductionKind::Identical,
            ..Default::default()
        },
        dispatcher.clone(),
        validator(),
        Some(&reference),
        dir.path(),
    )
    .unwrap();
    let not_identical = build_judge(
        &ReducerConfig {
            kind: ReductionKind::NotIdentical,
            ..Default::default()
        },
        dispatcher,
        validator(),
        Some(&reference),
        dir.path(),
    )
    .unwrap();

    let candidate = dir.path().join("c.frag");
    fs::write(&candidate, "void main() {}\n").unwrap();
    assert!(identical.evaluate(&program(), &candidate).unwrap());
    assert!(!not_identical.evaluate(&program(), &candidate).unwrap());
}

#[test]
fn threshold_kinds_agree_on_the_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("reference.png");
    fs::write(&reference, b"identical").unwrap();

    // Identical content has distance zero, strictly below any positive
    // threshold.
    let dispatcher = Arc::new(FixedImageDispatcher {
        image: b"identical".to_vec(),
    });
    let below = build_judge(
        &ReducerConfig {
            kind: ReductionKind::BelowThreshold,
            threshold: 100.0,
            ..Default::default()
        },
        dispatcher.clone(),
        validator(),
        Some(&reference),
        dir.path(),
    )
    .unwrap();
    let above = build_judge(
        &ReducerConfig {
            kind: ReductionKind::AboveThreshold,
            threshold: 100.0,
            ..Default::default()
        },
        dispatcher,
        validator(),
        Some(&reference),
        dir.path(),
    )
    .unwrap();

    let candidate = dir.path().join("c.frag");
    fs::write(&candidate, "void main() {}\n").unwrap();
    assert!(below.evaluate(&program(), &candidate).unwrap());
    assert!(!above.evaluate(&program(), &candidate).unwrap());
}

#[test]
fn reference_kinds_require_a_readable_reference() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = Arc::new(FixedImageDispatcher { image: vec![] });

    let err = build_judge(
        &ReducerConfig {
            kind: ReductionKind::NotIdentical,
            ..Default::default()
        },
        dispatcher.clone(),
        validator(),
        None,
        dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, UsageError::MissingReferenceImage { .. }));

    let err = build_judge(
        &ReducerConfig {
            kind: ReductionKind::Identical,
            ..Default::default()
        },
        dispatcher,
        validator(),
        Some(&dir.path().join("missing.png")),
        dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, UsageError::ReferenceImageNotFound { .. }));
}

#[test]
fn fuzz_kind_builds_its_corpus_under_the_work_dir() {
    let dir = tempfile::tempdir().unwrap();
    let judge = build_judge(
        &ReducerConfig {
            kind: ReductionKind::Fuzz,
            ..Default::default()
        },
        Arc::new(FixedImageDispatcher {
            image: b"fresh-image".to_vec(),
        }),
        validator(),
        None,
        dir.path(),
    )
    .unwrap();

    let candidate = dir.path().join("c.frag");
    fs::write(&candidate, "void main() {}\n").unwrap();
    assert!(judge.evaluate(&program(), &candidate).unwrap());
    assert!(!judge.evaluate(&program(), &candidate).unwrap());

    let corpus = dir.path().join(CORPUS_DIR);
    assert_eq!(fs::read_dir(corpus).unwrap().count(), 1);
}

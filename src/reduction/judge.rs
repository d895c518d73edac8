//! Judges: the predicate deciding whether a candidate still exhibits the
//! property being reduced toward.
//!
//! One strategy object is selected at configuration-resolution time from the
//! reduction kind; the hot loop never branches on the kind again. Judges
//! hold a shared handle to the execution backend and are read-only over the
//! engine's state: re-evaluating the same candidate may re-render but never
//! corrupts the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use sha2::{Digest as _, Sha256};

use super::config::{ReducerConfig, ReductionKind};
use super::compare::{ExactComparator, HistogramComparator, ImageComparator};
use super::dispatch::{RenderOptions, ShaderDispatcher};
use super::errors::{JudgeError, UsageError};
use super::program::Program;

/// Name of the corpus subdirectory used by the fuzzing judge.
pub const CORPUS_DIR: &str = "corpus";

/// Verdict over one candidate.
///
/// `Ok(true)` means the candidate keeps the property and the reduction may
/// commit it; `Err(JudgeError::OracleUnavailable)` is the distinguished
/// "could not judge" outcome the driver records as an `error` step.
pub trait Judge {
    fn evaluate(&self, program: &Program, candidate: &Path) -> Result<bool, JudgeError>;
}

impl std::fmt::Debug for dyn Judge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Judge")
    }
}

/// Compile a diagnostic pattern with "matches anywhere, across newlines"
/// semantics.
pub fn compile_error_pattern(pattern: &str) -> Result<Regex, UsageError> {
    RegexBuilder::new(pattern)
        .dot_matches_new_line(true)
        .build()
        .map_err(|err| UsageError::BadErrorPattern {
            detail: err.to_string(),
        })
}

// ----------------------------------------------------------------------------
// Validator boundary
// ----------------------------------------------------------------------------

/// Result of a validation pass over a candidate shader.
#[derive(Clone, Debug)]
pub struct ValidationReport {
    /// Whether the shader validated cleanly.
    pub valid: bool,
    /// Validator output; empty when clean.
    pub message: String,
}

/// Contract for the external shader validator.
pub trait ShaderValidator {
    fn validate(&self, shader: &Path) -> std::io::Result<ValidationReport>;
}

/// Validator backed by an external tool invoked as `tool <shader>`.
///
/// A non-zero exit is an invalid shader; stdout and stderr are combined
/// into the report message.
#[derive(Clone, Debug)]
pub struct ToolValidator {
    pub tool: PathBuf,
}

impl ShaderValidator for ToolValidator {
    fn validate(&self, shader: &Path) -> std::io::Result<ValidationReport> {
        let output = Command::new(&self.tool).arg(shader).output()?;
        let mut message = String::from_utf8_lossy(&output.stdout).into_owned();
        message.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(ValidationReport {
            valid: output.status.success(),
            message,
        })
    }
}

// ----------------------------------------------------------------------------
// Strategy variants
// ----------------------------------------------------------------------------

/// Accepts while rendering fails to produce an image; an optional pattern
/// must additionally match the diagnostic log.
pub struct NoImageJudge {
    dispatcher: Arc<dyn ShaderDispatcher>,
    pattern: Option<Regex>,
    skip_render: bool,
}

impl Judge for NoImageJudge {
    fn evaluate(&self, _program: &Program, candidate: &Path) -> Result<bool, JudgeError> {
        let reply = self.dispatcher.render(
            candidate,
            &RenderOptions {
                skip_render: self.skip_render,
            },
        )?;
        if reply.produced_image() {
            return Ok(false);
        }
        match &self.pattern {
            None => Ok(true),
            Some(re) => Ok(re.is_match(&reply.log)),
        }
    }
}

/// Renders and compares against a fixed reference image. A candidate that
/// fails to render is rejected; "wrong image" and "no image" are different
/// properties.
pub struct ImageJudge {
    dispatcher: Arc<dyn ShaderDispatcher>,
    reference: Vec<u8>,
    comparator: Box<dyn ImageComparator>,
}

impl Judge for ImageJudge {
    fn evaluate(&self, _program: &Program, candidate: &Path) -> Result<bool, JudgeError> {
        let reply = self
            .dispatcher
            .render(candidate, &RenderOptions::default())?;
        let Some(image) = reply.image.as_deref() else {
            return Ok(false);
        };
        Ok(self.comparator.accept(&self.reference, image))
    }
}

/// Accepts when validation reports an error whose message matches the
/// pattern (any error when no pattern is set). Never renders.
pub struct ValidatorErrorJudge {
    validator: Arc<dyn ShaderValidator>,
    pattern: Option<Regex>,
}

impl Judge for ValidatorErrorJudge {
    fn evaluate(&self, _program: &Program, candidate: &Path) -> Result<bool, JudgeError> {
        let report = self.validator.validate(candidate)?;
        if report.valid {
            return Ok(false);
        }
        match &self.pattern {
            None => Ok(true),
            Some(re) => Ok(re.is_match(&report.message)),
        }
    }
}

/// Accepts unconditionally; exercises the engine without a real oracle.
pub struct AlwaysReduceJudge;

impl Judge for AlwaysReduceJudge {
    fn evaluate(&self, _program: &Program, _candidate: &Path) -> Result<bool, JudgeError> {
        Ok(true)
    }
}

/// Accepts candidates whose rendered image is novel relative to the
/// accumulated corpus; novel images are recorded so later candidates are
/// judged against them too.
pub struct FuzzingJudge {
    dispatcher: Arc<dyn ShaderDispatcher>,
    corpus_dir: PathBuf,
}

impl Judge for FuzzingJudge {
    fn evaluate(&self, _program: &Program, candidate: &Path) -> Result<bool, JudgeError> {
        let reply = self
            .dispatcher
            .render(candidate, &RenderOptions::default())?;
        let Some(image) = reply.image.as_deref() else {
            return Ok(false);
        };

        let digest = Sha256::digest(image);
        let mut name = String::with_capacity(68);
        for byte in digest {
            name.push_str(&format!("{byte:02x}"));
        }
        name.push_str(".png");

        fs::create_dir_all(&self.corpus_dir)?;
        let entry = self.corpus_dir.join(&name);
        if entry.exists() {
            return Ok(false);
        }
        fs::write(&entry, image)?;
        Ok(true)
    }
}

// ----------------------------------------------------------------------------
// Selection
// ----------------------------------------------------------------------------

/// Build the judge strategy for a run.
///
/// `reference_image` is required by the image-comparison kinds and loaded
/// once here; the corpus directory lives under `work_dir`.
pub fn build_judge(
    cfg: &ReducerConfig,
    dispatcher: Arc<dyn ShaderDispatcher>,
    validator: Arc<dyn ShaderValidator>,
    reference_image: Option<&Path>,
    work_dir: &Path,
) -> Result<Box<dyn Judge>, UsageError> {
    let pattern = match cfg.error_pattern.as_deref() {
        Some(p) if !p.is_empty() => Some(compile_error_pattern(p)?),
        _ => None,
    };

    let load_reference = || -> Result<Vec<u8>, UsageError> {
        let path = reference_image.ok_or(UsageError::MissingReferenceImage {
            kind: cfg.kind.name(),
        })?;
        fs::read(path).map_err(|_| UsageError::ReferenceImageNotFound {
            path: path.to_path_buf(),
        })
    };

    let judge: Box<dyn Judge> = match cfg.kind {
        ReductionKind::NoImage => Box::new(NoImageJudge {
            dispatcher,
            pattern,
            skip_render: cfg.skip_render,
        }),
        ReductionKind::NotIdentical => Box::new(ImageJudge {
            dispatcher,
            reference: load_reference()?,
            comparator: Box::new(ExactComparator {
                accept_identical: false,
            }),
        }),
        ReductionKind::Identical => Box::new(ImageJudge {
            dispatcher,
            reference: load_reference()?,
            comparator: Box::new(ExactComparator {
                accept_identical: true,
            }),
        }),
        ReductionKind::BelowThreshold => Box::new(ImageJudge {
            dispatcher,
            reference: load_reference()?,
            comparator: Box::new(HistogramComparator {
                threshold: cfg.threshold,
                accept_above: false,
            }),
        }),
        ReductionKind::AboveThreshold => Box::new(ImageJudge {
            dispatcher,
            reference: load_reference()?,
            comparator: Box::new(HistogramComparator {
                threshold: cfg.threshold,
                accept_above: true,
            }),
        }),
        ReductionKind::ValidatorError => {
            if pattern.is_none() {
                return Err(UsageError::MissingErrorPattern {
                    kind: cfg.kind.name(),
                });
            }
            Box::new(ValidatorErrorJudge { validator, pattern })
        }
        ReductionKind::AlwaysReduce => Box::new(AlwaysReduceJudge),
        ReductionKind::Fuzz => Box::new(FuzzingJudge {
            dispatcher,
            corpus_dir: work_dir.join(CORPUS_DIR),
        }),
    };
    Ok(judge)
}

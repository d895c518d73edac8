//! Shader reduction engine modules.
//!
//! The driver module owns the step loop and the working directory; resume
//! encodes progress in artifact filenames so an interrupted run restarts
//! from its last accepted step. Judges decide candidate acceptance and are
//! selected once per run from the reduction kind; dispatch hides whether
//! rendering happens in a local subprocess or on a remote worker.
//!
//! # Invariants
//! - Step records are append-only; a tagged artifact is never rewritten.
//! - Candidate application is pure: the current program changes only when
//!   the driver commits an accepted step.
//! - A fixed seed replays the whole run's choices.

pub mod compare;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod driver;
pub mod errors;
pub mod judge;
pub mod opportunity;
pub mod program;
pub mod resume;
pub mod rng;

pub use compare::{ExactComparator, HistogramComparator, ImageComparator};
pub use config::{check_input_files, ReducerConfig, ReductionKind};
pub use context::{IdGenerator, ReductionContext};
pub use dispatch::{
    JobClient, LocalDispatcher, LocalDispatcherConfig, RemoteDispatcher, RenderJob, RenderOptions,
    RenderResult, RenderStatus, ShaderDispatcher, MANAGE_API_SUFFIX,
};
pub use driver::{
    ReductionDriver, ReductionSummary, Termination, EXCEPTION_SUFFIX, FINAL_SUFFIX,
};
pub use errors::{
    DispatchError, ErrorClass, JudgeError, ReductionError, TransportError, UsageError,
};
pub use judge::{
    build_judge, AlwaysReduceJudge, FuzzingJudge, ImageJudge, Judge, NoImageJudge,
    ShaderValidator, ToolValidator, ValidationReport, ValidatorErrorJudge, CORPUS_DIR,
};
pub use opportunity::{LineRemoval, LineRemovalSource, OpportunitySource, ReductionOpportunity};
pub use program::{Program, ReductionState, ShadingLanguageVersion};
pub use resume::{
    candidate_name, latest_any_step, latest_successful_step, marker_present, parse_step_artifact,
    step_artifact_name, StepOutcome, REDUCTION_INCOMPLETE, SHADER_EXT,
};
pub use rng::ReductionRng;

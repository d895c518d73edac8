//! The reduction driver: owns the step loop, artifact persistence, and the
//! resume protocol.
//!
//! The working directory is the only durable record of progress. Every
//! judged candidate becomes a tagged step artifact before the next step
//! starts, so a crash at any point loses at most the step in flight.
//!
//! # Invariants
//! - Step indices are allocated strictly increasing and never reused, even
//!   across resume.
//! - The current program only changes on a `success` step.
//! - The completion marker exists for exactly the lifetime of a logically
//!   in-progress run; a fatal error leaves it in place.

use std::fs;
use std::path::{Path, PathBuf};

use super::config::{check_input_files, ReducerConfig};
use super::context::ReductionContext;
use super::errors::{JudgeError, ReductionError, UsageError};
use super::judge::Judge;
use super::opportunity::OpportunitySource;
use super::program::{Program, ReductionState};
use super::resume::{
    candidate_name, clear_marker, latest_any_step, latest_successful_step, marker_present,
    place_marker, step_artifact_name, StepOutcome, SHADER_EXT,
};

/// Suffix of the final reduced shader, `<base>_reduced_final.frag`.
pub const FINAL_SUFFIX: &str = "reduced_final";

/// Suffix of the fatal-error dump, `<base>_exception.txt`.
pub const EXCEPTION_SUFFIX: &str = "exception";

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Termination {
    /// No opportunities remained; the program is fully reduced.
    Exhausted,
    /// The step budget ran out with opportunities remaining.
    BudgetReached,
}

/// Outcome of a completed (non-fatal) run.
#[derive(Clone, Debug)]
pub struct ReductionSummary {
    /// Steps judged during this invocation (excludes steps recorded by a
    /// prior interrupted run).
    pub steps_attempted: u32,
    /// Accepted steps during this invocation.
    pub steps_accepted: u32,
    /// Why the loop stopped.
    pub termination: Termination,
    /// Path of the final reduced shader.
    pub final_path: PathBuf,
}

struct Session {
    work_dir: PathBuf,
    base: String,
    metadata: Vec<u8>,
    state: ReductionState,
    ctx: ReductionContext,
    /// Index the next judged candidate will be recorded under.
    next_index: u32,
}

impl Session {
    fn artifact_path(&self, index: u32, outcome: StepOutcome) -> PathBuf {
        self.work_dir
            .join(step_artifact_name(&self.base, index, outcome))
    }
}

/// Drives one reduction run over a shader file.
pub struct ReductionDriver {
    cfg: ReducerConfig,
    source: Box<dyn OpportunitySource>,
    judge: Box<dyn Judge>,
}

impl ReductionDriver {
    pub fn new(
        cfg: ReducerConfig,
        source: Box<dyn OpportunitySource>,
        judge: Box<dyn Judge>,
    ) -> Self {
        Self { cfg, source, judge }
    }

    /// Run the reduction to completion.
    ///
    /// `shader` is the original `<base>.frag`; artifacts are written next to
    /// it. Usage errors are returned before the directory is touched. Any
    /// later failure writes `<base>_exception.txt` and leaves the completion
    /// marker in place so the run can be resumed.
    pub fn run(&mut self, shader: &Path) -> Result<ReductionSummary, ReductionError> {
        check_input_files(shader)?;
        self.cfg.validate()?;

        let mut session = self.prepare(shader)?;
        match self.reduce(&mut session) {
            Ok(summary) => Ok(summary),
            Err(err) => {
                let dump = session
                    .work_dir
                    .join(format!("{}_{EXCEPTION_SUFFIX}.txt", session.base));
                // Marker stays in place; the dump is best-effort.
                let _ = fs::write(dump, format!("{err}\n"));
                Err(err)
            }
        }
    }

    /// Resolve the starting program and step index, honoring resume.
    ///
    /// A fresh run starts from the original file at index 1. Resume starts
    /// from the latest `success` artifact (the original if none) and
    /// allocates indices after the latest recorded step of any outcome, so
    /// a re-attempted step never overwrites a prior record.
    fn prepare(&mut self, shader: &Path) -> Result<Session, ReductionError> {
        let work_dir = shader
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let base = shader
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let metadata_path = shader.with_extension("json");
        let metadata = fs::read(&metadata_path)?;
        // Corrupt metadata would poison every candidate's sidecar; reject it
        // up front as a usage error.
        if let Err(err) = serde_json::from_slice::<serde_json::Value>(&metadata) {
            return Err(UsageError::MalformedMetadata {
                path: metadata_path,
                detail: err.to_string(),
            }
            .into());
        }

        let (program, next_index) = if self.cfg.resume {
            if !marker_present(&work_dir) {
                return Err(UsageError::NothingToResume {
                    work_dir: work_dir.clone(),
                }
                .into());
            }
            let program = match latest_successful_step(&work_dir, &base)? {
                Some(index) => Program::from_file(&work_dir.join(step_artifact_name(
                    &base,
                    index,
                    StepOutcome::Success,
                )))?,
                None => Program::from_file(shader)?,
            };
            let next_index = latest_any_step(&work_dir, &base)?.map_or(1, |i| i + 1);
            // Take over the marker so a takeover of a takeover still works.
            clear_marker(&work_dir)?;
            place_marker(&work_dir)?;
            (program, next_index)
        } else {
            let program = Program::from_file(shader)?;
            place_marker(&work_dir)?;
            (program, 1)
        };

        let ctx = ReductionContext::new(program.version, self.cfg.reduce_everywhere, self.cfg.seed);
        Ok(Session {
            work_dir,
            base,
            metadata,
            state: ReductionState::initial(program),
            ctx,
            next_index,
        })
    }

    fn reduce(&mut self, session: &mut Session) -> Result<ReductionSummary, ReductionError> {
        let mut attempted = 0u32;
        let mut accepted = 0u32;

        let termination = loop {
            // Recorded steps count against the budget across resumes.
            if session.next_index > self.cfg.max_steps {
                break Termination::BudgetReached;
            }

            let ops = self.source.enumerate(&session.state.program, &session.ctx);
            if ops.is_empty() {
                break Termination::Exhausted;
            }
            let pick = session.ctx.rng.pick_index(ops.len());
            let op = &ops[pick];
            let candidate = op.apply(&session.state.program);

            let index = session.next_index;
            session.next_index += 1;
            attempted += 1;

            let candidate_path = session.work_dir.join(candidate_name(&session.base, index));
            candidate.write_to(&candidate_path)?;
            fs::write(candidate_path.with_extension("json"), &session.metadata)?;

            let verdict = self.judge.evaluate(&candidate, &candidate_path);
            if self.cfg.verbose {
                eprintln!(
                    "step={index} op={} lines={} verdict={}",
                    op.describe(),
                    candidate.line_count(),
                    match &verdict {
                        Ok(true) => "success",
                        Ok(false) => "failure",
                        Err(_) => "error",
                    }
                );
            }

            match verdict {
                Ok(true) => {
                    record_step(&candidate_path, &session.artifact_path(index, StepOutcome::Success))?;
                    session.state = session.state.clone().advance(candidate);
                    accepted += 1;
                }
                Ok(false) => {
                    if self.cfg.keep_rejected_steps {
                        record_step(
                            &candidate_path,
                            &session.artifact_path(index, StepOutcome::Failure),
                        )?;
                    } else {
                        discard_candidate(&candidate_path)?;
                    }
                }
                Err(JudgeError::OracleUnavailable(cause)) => {
                    record_step(&candidate_path, &session.artifact_path(index, StepOutcome::Error))?;
                    if self.cfg.stop_on_error {
                        return Err(ReductionError::Oracle(JudgeError::OracleUnavailable(cause)));
                    }
                }
                Err(err) => return Err(ReductionError::Oracle(err)),
            }
        };

        let final_path = self.finalize(session)?;
        Ok(ReductionSummary {
            steps_attempted: attempted,
            steps_accepted: accepted,
            termination,
            final_path,
        })
    }

    /// Write the final result and retire the marker.
    ///
    /// The final file is written before the marker is removed: if the write
    /// fails the run is still resumable.
    fn finalize(&self, session: &Session) -> Result<PathBuf, ReductionError> {
        let final_path = session
            .work_dir
            .join(format!("{}_{FINAL_SUFFIX}.{SHADER_EXT}", session.base));
        session.state.program.write_to(&final_path)?;
        fs::write(final_path.with_extension("json"), &session.metadata)?;
        clear_marker(&session.work_dir)?;
        Ok(final_path)
    }
}

/// Promote a judged candidate to its tagged record.
///
/// Rename clobbers, which is wanted: a stale record at the target name can
/// only be a leftover from a run that crashed before allocating past it.
fn record_step(candidate: &Path, artifact: &Path) -> std::io::Result<()> {
    fs::rename(candidate, artifact)?;
    fs::rename(
        candidate.with_extension("json"),
        artifact.with_extension("json"),
    )
}

fn discard_candidate(candidate: &Path) -> std::io::Result<()> {
    fs::remove_file(candidate)?;
    fs::remove_file(candidate.with_extension("json"))
}

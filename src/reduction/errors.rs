//! Error types for the reduction stages.
//!
//! Errors are stage-specific to keep diagnostics precise and avoid a
//! single monolithic error enum that grows unbounded. All enums are
//! `#[non_exhaustive]` to allow adding variants without breaking callers;
//! consumers should include a fallback match arm.
//!
//! # Design Notes
//! - Usage errors are reported before any reduction step is attempted and
//!   never mutate working-directory state.
//! - Oracle failures (dispatch-level) are recoverable by default; the driver
//!   records them as `error`-tagged step artifacts and only aborts under the
//!   stop-on-error policy.
//! - I/O errors preserve their source to keep diagnostics actionable.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Errors from configuration and input resolution.
///
/// These occur before the reduction loop starts; the working directory's
/// reduction state is untouched when one is returned.
#[derive(Debug)]
#[non_exhaustive]
pub enum UsageError {
    /// The shader to reduce does not exist.
    ShaderNotFound { path: PathBuf },
    /// The shader's sidecar metadata file does not exist.
    MetadataNotFound { path: PathBuf },
    /// The sidecar metadata file is not valid JSON.
    MalformedMetadata { path: PathBuf, detail: String },
    /// A reference image was named but does not exist.
    ReferenceImageNotFound { path: PathBuf },
    /// The selected reduction kind needs a reference image and none was given.
    MissingReferenceImage { kind: &'static str },
    /// The selected reduction kind needs a diagnostic pattern and none was given.
    MissingErrorPattern { kind: &'static str },
    /// The diagnostic pattern failed to compile.
    BadErrorPattern { detail: String },
    /// A remote server was configured without a client token.
    MissingClientToken,
    /// Resume was requested but no completion marker is present.
    NothingToResume { work_dir: PathBuf },
    /// The step budget is zero.
    ZeroStepBudget,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShaderNotFound { path } => {
                write!(f, "shader not found: {}", path.display())
            }
            Self::MetadataNotFound { path } => {
                write!(f, "shader metadata not found: {}", path.display())
            }
            Self::MalformedMetadata { path, detail } => {
                write!(f, "shader metadata {} is not valid JSON: {detail}", path.display())
            }
            Self::ReferenceImageNotFound { path } => {
                write!(f, "reference image not found: {}", path.display())
            }
            Self::MissingReferenceImage { kind } => {
                write!(f, "reduction kind {kind} requires a reference image")
            }
            Self::MissingErrorPattern { kind } => {
                write!(f, "reduction kind {kind} requires an error pattern")
            }
            Self::BadErrorPattern { detail } => {
                write!(f, "error pattern does not compile: {detail}")
            }
            Self::MissingClientToken => {
                write!(f, "a client token is required when a server is configured")
            }
            Self::NothingToResume { work_dir } => {
                write!(
                    f,
                    "resume requested but no reduction is in progress in {}",
                    work_dir.display()
                )
            }
            Self::ZeroStepBudget => write!(f, "step budget must be at least 1"),
        }
    }
}

impl std::error::Error for UsageError {}

/// Classification of transport errors for retry decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient error, worth retrying (timeout, connection reset, 5xx).
    Retryable,
    /// Permanent error, don't retry (auth failure, malformed reply).
    Permanent,
}

/// Error from a remote job client.
///
/// Carries its own classification so the dispatcher's retry loop never has
/// to guess from message text.
#[derive(Debug)]
pub struct TransportError {
    /// Retry classification.
    pub class: ErrorClass,
    /// Human-readable context; not stable for machine parsing.
    pub detail: String,
}

impl TransportError {
    /// Creates a retryable transport error.
    pub fn retryable(detail: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Retryable,
            detail: detail.into(),
        }
    }

    /// Creates a permanent transport error.
    pub fn permanent(detail: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Permanent,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            ErrorClass::Retryable => "retryable",
            ErrorClass::Permanent => "permanent",
        };
        write!(f, "transport error ({class}): {}", self.detail)
    }
}

impl std::error::Error for TransportError {}

/// Errors from executing a candidate shader.
///
/// These are oracle failures from the driver's perspective: the candidate
/// could not be judged, which is distinct from "candidate rejected".
#[derive(Debug)]
#[non_exhaustive]
pub enum DispatchError {
    /// The renderer process could not be spawned.
    Spawn(io::Error),
    /// The render exceeded the per-invocation timeout and was killed.
    Timeout { limit: Duration },
    /// The remote transport failed permanently.
    Transport(TransportError),
    /// Retries were exhausted against the remote backend.
    RetriesExhausted { attempts: u32 },
    /// The backend's reply could not be interpreted.
    InvalidReply { detail: String },
    /// I/O error reading render output.
    Io(io::Error),
}

impl DispatchError {
    /// Creates an invalid-reply error.
    pub fn invalid_reply(detail: impl Into<String>) -> Self {
        Self::InvalidReply {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to spawn renderer: {err}"),
            Self::Timeout { limit } => {
                write!(f, "render timed out after {}s", limit.as_secs())
            }
            Self::Transport(err) => write!(f, "{err}"),
            Self::RetriesExhausted { attempts } => {
                write!(f, "remote backend failed after {attempts} attempts")
            }
            Self::InvalidReply { detail } => write!(f, "invalid backend reply: {detail}"),
            Self::Io(err) => write!(f, "render I/O error: {err}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(err) | Self::Io(err) => Some(err),
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Errors from judging a candidate.
#[derive(Debug)]
#[non_exhaustive]
pub enum JudgeError {
    /// The execution backend could not produce a verdict.
    ///
    /// The driver treats this differently from a rejected candidate: the
    /// step is recorded with the `error` tag and the run continues unless
    /// stop-on-error is set.
    OracleUnavailable(DispatchError),
    /// I/O error reading candidate or reference artifacts.
    Io(io::Error),
}

impl fmt::Display for JudgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OracleUnavailable(err) => write!(f, "oracle unavailable: {err}"),
            Self::Io(err) => write!(f, "judge I/O error: {err}"),
        }
    }
}

impl std::error::Error for JudgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::OracleUnavailable(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<DispatchError> for JudgeError {
    fn from(err: DispatchError) -> Self {
        Self::OracleUnavailable(err)
    }
}

impl From<io::Error> for JudgeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Errors surfaced by the reduction driver.
///
/// Any of these terminates the run. `Usage` is reported before the loop
/// starts; the others leave the completion marker in place so the run can
/// be resumed.
#[derive(Debug)]
#[non_exhaustive]
pub enum ReductionError {
    /// Bad configuration or missing input files.
    Usage(UsageError),
    /// I/O failure persisting a step artifact or the final result.
    Artifact(io::Error),
    /// Oracle failure under the stop-on-error policy.
    Oracle(JudgeError),
}

impl fmt::Display for ReductionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(err) => write!(f, "{err}"),
            Self::Artifact(err) => write!(f, "failed to persist artifact: {err}"),
            Self::Oracle(err) => write!(f, "stopping on oracle failure: {err}"),
        }
    }
}

impl std::error::Error for ReductionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Usage(err) => Some(err),
            Self::Artifact(err) => Some(err),
            Self::Oracle(err) => Some(err),
        }
    }
}

impl From<UsageError> for ReductionError {
    fn from(err: UsageError) -> Self {
        Self::Usage(err)
    }
}

impl From<io::Error> for ReductionError {
    fn from(err: io::Error) -> Self {
        Self::Artifact(err)
    }
}

//! Resolved run configuration.
//!
//! Produced by the (out-of-scope) CLI/config layer; validated here before
//! any reduction step is attempted. Defaults mirror the reference tool:
//! threshold 100.0, 250 steps, retry limit 2, 30 second render timeout.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use super::errors::UsageError;

/// The property being preserved while reducing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReductionKind {
    /// Reduce while image generation fails to produce an image.
    NoImage,
    /// Reduce while the produced image differs from the reference.
    NotIdentical,
    /// Reduce while the produced image is identical to the reference.
    Identical,
    /// Reduce while the histogram distance to the reference is below the
    /// threshold.
    BelowThreshold,
    /// Reduce while the histogram distance to the reference is at or above
    /// the threshold.
    AboveThreshold,
    /// Reduce while the validator reports a matching error.
    ValidatorError,
    /// Accept every candidate; for exercising the engine.
    AlwaysReduce,
    /// Accept candidates that produce images novel to the corpus.
    Fuzz,
}

impl ReductionKind {
    /// Stable kebab-case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::NoImage => "no-image",
            Self::NotIdentical => "not-identical",
            Self::Identical => "identical",
            Self::BelowThreshold => "below-threshold",
            Self::AboveThreshold => "above-threshold",
            Self::ValidatorError => "validator-error",
            Self::AlwaysReduce => "always-reduce",
            Self::Fuzz => "fuzz",
        }
    }

    /// Whether this kind compares against a reference image.
    pub fn needs_reference(self) -> bool {
        matches!(
            self,
            Self::NotIdentical | Self::Identical | Self::BelowThreshold | Self::AboveThreshold
        )
    }
}

impl fmt::Display for ReductionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReductionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "no-image" => Ok(Self::NoImage),
            "not-identical" => Ok(Self::NotIdentical),
            "identical" => Ok(Self::Identical),
            "below-threshold" => Ok(Self::BelowThreshold),
            "above-threshold" => Ok(Self::AboveThreshold),
            "validator-error" => Ok(Self::ValidatorError),
            "always-reduce" => Ok(Self::AlwaysReduce),
            "fuzz" => Ok(Self::Fuzz),
            other => Err(format!("unknown reduction kind: {other}")),
        }
    }
}

/// Resolved configuration for one reduction run.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ReducerConfig {
    /// Property to preserve.
    pub kind: ReductionKind,
    /// Histogram-distance threshold for the threshold kinds.
    pub threshold: f64,
    /// Maximum reduction steps before giving up and writing the final file.
    pub max_steps: u32,
    /// Remote retry limit (additional attempts after the first).
    pub retry_limit: u32,
    /// Per-render wall-clock limit.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// RNG seed; same seed replays the same run.
    pub seed: u64,
    /// Substring checked against validator/compiler diagnostics. Matched
    /// anywhere in the message, across newlines.
    pub error_pattern: Option<String>,
    /// Compile-only requests to the backend.
    pub skip_render: bool,
    /// Permit semantics-risky transformations.
    pub reduce_everywhere: bool,
    /// Abort on the first oracle failure instead of recording and moving on.
    pub stop_on_error: bool,
    /// Persist rejected candidates as `failure`-tagged artifacts.
    pub keep_rejected_steps: bool,
    /// Continue a previous interrupted reduction.
    pub resume: bool,
    /// Emit step-by-step diagnostics on stderr.
    pub verbose: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            kind: ReductionKind::AlwaysReduce,
            threshold: 100.0,
            max_steps: 250,
            retry_limit: 2,
            timeout: Duration::from_secs(30),
            seed: 0,
            error_pattern: None,
            skip_render: false,
            reduce_everywhere: false,
            stop_on_error: false,
            keep_rejected_steps: true,
            resume: false,
            verbose: false,
        }
    }
}

impl ReducerConfig {
    /// Validate kind/flag combinations.
    ///
    /// Reference-image presence is checked at judge construction, where the
    /// image path is known; resume preconditions are checked at driver
    /// setup, where the working directory is known.
    pub fn validate(&self) -> Result<(), UsageError> {
        if self.max_steps == 0 {
            return Err(UsageError::ZeroStepBudget);
        }
        if self.kind == ReductionKind::ValidatorError
            && self.error_pattern.as_deref().unwrap_or("").is_empty()
        {
            return Err(UsageError::MissingErrorPattern {
                kind: self.kind.name(),
            });
        }
        Ok(())
    }
}

/// Check the input shader and its sidecar metadata file exist.
///
/// `shader` is the path to the `.frag` file; the metadata sidecar must sit
/// next to it with a `.json` extension.
pub fn check_input_files(shader: &Path) -> Result<(), UsageError> {
    if !shader.is_file() {
        return Err(UsageError::ShaderNotFound {
            path: shader.to_path_buf(),
        });
    }
    let metadata = shader.with_extension("json");
    if !metadata.is_file() {
        return Err(UsageError::MetadataNotFound { path: metadata });
    }
    Ok(())
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

//! Resume protocol: step artifact naming and the completion marker.
//!
//! Reduction progress is encoded purely in the working directory's file
//! listing; there is no separate journal that could drift from it. A step
//! artifact is named `<base>_<index:03>_<tag>.frag`, records are append-only,
//! and scanning the listing recovers everything resume needs.
//!
//! # Invariants
//! - Tagged artifact names are never rewritten; candidates are written under
//!   an untagged name and renamed once judged.
//! - The completion marker exists iff a run is logically in progress.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Marker file present in the working directory while a run is in progress.
pub const REDUCTION_INCOMPLETE: &str = "REDUCTION_INCOMPLETE";

/// Extension used for step artifacts and the final result.
pub const SHADER_EXT: &str = "frag";

/// Outcome tag of one recorded step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StepOutcome {
    /// The candidate was accepted and became the current program.
    Success,
    /// The candidate was rejected by the judge.
    Failure,
    /// The judge could not produce a verdict (oracle failure).
    Error,
}

impl StepOutcome {
    /// Stable lowercase tag used in artifact filenames.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }

    /// Parse a filename tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Untagged name a candidate is written under while being judged.
pub fn candidate_name(base: &str, index: u32) -> String {
    format!("{base}_{index:03}.{SHADER_EXT}")
}

/// Tagged artifact name for a judged step.
pub fn step_artifact_name(base: &str, index: u32, outcome: StepOutcome) -> String {
    format!("{base}_{index:03}_{}.{SHADER_EXT}", outcome.tag())
}

/// Parse `<base>_<index>_<tag>.frag` back into its index and outcome.
///
/// Returns `None` for the original file, untagged candidates, and files
/// belonging to a different base name.
pub fn parse_step_artifact(file_name: &str, base: &str) -> Option<(u32, StepOutcome)> {
    let stem = file_name.strip_suffix(&format!(".{SHADER_EXT}"))?;
    let rest = stem.strip_prefix(base)?.strip_prefix('_')?;
    let (index_part, tag) = rest.split_once('_')?;
    if index_part.is_empty() || !index_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = index_part.parse::<u32>().ok()?;
    Some((index, StepOutcome::from_tag(tag)?))
}

fn scan_steps(
    work_dir: &Path,
    base: &str,
    mut keep: impl FnMut(StepOutcome) -> bool,
) -> io::Result<Option<u32>> {
    let mut latest: Option<u32> = None;
    for entry in fs::read_dir(work_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some((index, outcome)) = parse_step_artifact(name, base) {
            if keep(outcome) {
                latest = Some(latest.map_or(index, |cur| cur.max(index)));
            }
        }
    }
    Ok(latest)
}

/// Highest step index tagged `success`, or `None` if only step 0 (the
/// original file) exists.
pub fn latest_successful_step(work_dir: &Path, base: &str) -> io::Result<Option<u32>> {
    scan_steps(work_dir, base, |o| o == StepOutcome::Success)
}

/// Highest step index with any outcome tag. Resuming allocates the next
/// index from here so re-attempted steps never reuse an index.
pub fn latest_any_step(work_dir: &Path, base: &str) -> io::Result<Option<u32>> {
    scan_steps(work_dir, base, |_| true)
}

/// Path of the completion marker in a working directory.
pub fn marker_path(work_dir: &Path) -> PathBuf {
    work_dir.join(REDUCTION_INCOMPLETE)
}

/// Whether a run is logically in progress in this directory.
pub fn marker_present(work_dir: &Path) -> bool {
    marker_path(work_dir).exists()
}

/// Place the marker at run start.
pub fn place_marker(work_dir: &Path) -> io::Result<()> {
    fs::write(marker_path(work_dir), b"")
}

/// Remove the marker on normal termination (or resume takeover).
pub fn clear_marker(work_dir: &Path) -> io::Result<()> {
    fs::remove_file(marker_path(work_dir))
}

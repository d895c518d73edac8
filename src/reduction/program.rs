//! In-memory shader program and reduction state.
//!
//! The program is a plain text representation plus its detected shading
//! language version. Parsing into a richer form is a collaborator concern;
//! the engine only needs wholesale replacement semantics.
//!
//! # Invariants
//! - A `Program` is never mutated in place: applying an opportunity builds a
//!   new one, and the driver commits it only on acceptance.
//! - Exactly one `ReductionState` is current at any time.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Shading language version detected from the `#version` directive.
///
/// Shaders without a directive default to `100 es`, mirroring how GLSL ES
/// treats version-less fragment shaders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ShadingLanguageVersion {
    /// Version number as written in the directive, e.g. 100, 300, 450.
    pub number: u16,
    /// Whether this is an ES profile (`es` suffix, or an ES-only number).
    pub es: bool,
}

impl ShadingLanguageVersion {
    /// The implicit default for shaders with no `#version` directive.
    pub const fn essl_100() -> Self {
        Self {
            number: 100,
            es: true,
        }
    }

    /// Detect the version from shader source.
    ///
    /// Scans for the first `#version` directive; malformed directives fall
    /// back to the default rather than failing, since the engine must be
    /// able to keep reducing shaders that no longer compile.
    pub fn from_source(source: &str) -> Self {
        for line in source.lines() {
            let trimmed = line.trim_start();
            let Some(rest) = trimmed.strip_prefix("#version") else {
                continue;
            };
            let mut parts = rest.split_whitespace();
            let Some(number) = parts.next().and_then(|n| n.parse::<u16>().ok()) else {
                break;
            };
            let es = parts.next() == Some("es") || number == 100;
            return Self { number, es };
        }
        Self::essl_100()
    }
}

impl fmt::Display for ShadingLanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.es && self.number != 100 {
            write!(f, "{} es", self.number)
        } else {
            write!(f, "{}", self.number)
        }
    }
}

/// A shader program owned by the reduction state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    /// Full shader source text.
    pub source: String,
    /// Detected language version (read-only during a run).
    pub version: ShadingLanguageVersion,
}

impl Program {
    /// Build a program from source text, detecting the version.
    pub fn from_source(source: String) -> Self {
        let version = ShadingLanguageVersion::from_source(&source);
        Self { source, version }
    }

    /// Load a program from a shader file.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        Ok(Self::from_source(fs::read_to_string(path)?))
    }

    /// Write the program's source to a file.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.source.as_bytes())
    }

    /// Number of source lines.
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }
}

/// The engine's current program plus step provenance.
///
/// Each accepted step produces a fresh state that supersedes the prior one;
/// nothing outside the driver holds a long-lived reference.
#[derive(Clone, Debug)]
pub struct ReductionState {
    /// The current program.
    pub program: Program,
    /// Whether this is still the unreduced starting program.
    pub is_initial: bool,
}

impl ReductionState {
    /// State for the starting shader (or a resumed artifact).
    pub fn initial(program: Program) -> Self {
        Self {
            program,
            is_initial: true,
        }
    }

    /// Derive the successor state from an accepted candidate.
    pub fn advance(self, program: Program) -> Self {
        Self {
            program,
            is_initial: false,
        }
    }
}

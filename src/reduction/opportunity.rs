//! Reduction opportunities and their enumeration.
//!
//! The engine treats opportunity application as opaque: an opportunity
//! yields a new candidate program and never mutates the current one.
//! Richer transformation catalogues implement `OpportunitySource`; the
//! built-in line-removal source keeps the engine exercisable on its own.

use super::context::ReductionContext;
use super::program::Program;

/// A single candidate simplification of the current program.
pub trait ReductionOpportunity {
    /// Produce the candidate program. Must not mutate `program`.
    fn apply(&self, program: &Program) -> Program;

    /// Short description for verbose logs.
    fn describe(&self) -> String;
}

/// Enumerates the opportunities applicable to a program under the context's
/// policy. An empty result means the program is fully reduced.
pub trait OpportunitySource {
    fn enumerate(
        &self,
        program: &Program,
        ctx: &ReductionContext,
    ) -> Vec<Box<dyn ReductionOpportunity>>;
}

/// Removal of a single source line.
#[derive(Clone, Copy, Debug)]
pub struct LineRemoval {
    /// Zero-based line index in the program this was enumerated against.
    pub line: usize,
}

impl ReductionOpportunity for LineRemoval {
    fn apply(&self, program: &Program) -> Program {
        let mut out = String::with_capacity(program.source.len());
        for (i, line) in program.source.lines().enumerate() {
            if i == self.line {
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }
        Program::from_source(out)
    }

    fn describe(&self) -> String {
        format!("remove-line:{}", self.line)
    }
}

/// Line-granularity opportunity source.
///
/// Preprocessor directives (`#version`, `#extension`) are never candidates.
/// Without reduce-everywhere only blank and comment-only lines qualify;
/// with it, any remaining line does.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineRemovalSource;

impl LineRemovalSource {
    fn is_directive(line: &str) -> bool {
        let t = line.trim_start();
        t.starts_with("#version") || t.starts_with("#extension")
    }

    fn is_safe(line: &str) -> bool {
        let t = line.trim();
        t.is_empty() || t.starts_with("//")
    }
}

impl OpportunitySource for LineRemovalSource {
    fn enumerate(
        &self,
        program: &Program,
        ctx: &ReductionContext,
    ) -> Vec<Box<dyn ReductionOpportunity>> {
        let mut out: Vec<Box<dyn ReductionOpportunity>> = Vec::new();
        for (i, line) in program.source.lines().enumerate() {
            if Self::is_directive(line) {
                continue;
            }
            if !ctx.reduce_everywhere && !Self::is_safe(line) {
                continue;
            }
            out.push(Box::new(LineRemoval { line: i }));
        }
        out
    }
}

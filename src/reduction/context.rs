//! Shared context for opportunity enumeration and application.
//!
//! One context is exclusively owned by one run: the RNG and identifier
//! counter advance monotonically and are never shared across concurrent
//! runs, so replaying a seed replays the whole run's choices.

use super::program::ShadingLanguageVersion;
use super::rng::ReductionRng;

/// Generator of run-unique synthetic identifiers.
///
/// Transformations that introduce new symbols draw names from here; ids are
/// strictly increasing so a fresh name can never collide with a prior
/// allocation within the run.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Create a generator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn fresh_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Allocate a synthetic symbol name with the given prefix.
    pub fn fresh_name(&mut self, prefix: &str) -> String {
        format!("{prefix}_{}", self.fresh_id())
    }
}

/// Policy and non-determinism inputs shared by all opportunity applications
/// during one run.
#[derive(Debug)]
pub struct ReductionContext {
    /// Detected shading-language version; restricts which transformations
    /// are legal. Read-only during the run.
    pub version: ShadingLanguageVersion,
    /// Permit transformations that are normally considered semantics-risky.
    pub reduce_everywhere: bool,
    /// Seeded choice source.
    pub rng: ReductionRng,
    /// Synthetic identifier source.
    pub id_gen: IdGenerator,
}

impl ReductionContext {
    /// Build a context for one run.
    pub fn new(version: ShadingLanguageVersion, reduce_everywhere: bool, seed: u64) -> Self {
        Self {
            version,
            reduce_everywhere,
            rng: ReductionRng::new(seed),
            id_gen: IdGenerator::new(),
        }
    }
}

//! Property-based and exhaustive soundness tests.
//!
//! Run with: `cargo test --test property`

mod deterministic_runs;
mod step_naming;

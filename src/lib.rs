//! Automated test-case reducer for graphics shaders.
//!
//! ## Scope
//! This crate shrinks a shader that triggers some behavior (a crash, a wrong
//! image, a validator error) down to a smaller shader that still triggers
//! it. The loop repeatedly picks a reduction opportunity, applies it to get
//! a candidate, asks a judge whether the behavior survived, and commits or
//! reverts accordingly.
//!
//! ## Key invariants
//! - Progress is durable: every judged candidate is persisted as a tagged
//!   step artifact before the next step begins, and an interrupted run is
//!   resumable from the working directory alone.
//! - Determinism: a fixed seed replays the same sequence of choices.
//! - Candidate application is pure; the current program changes only when a
//!   step is accepted.
//!
//! ## Run flow
//! 1) Resolve configuration and inputs; place the in-progress marker.
//! 2) Enumerate opportunities, pick one, apply it to build a candidate.
//! 3) Judge the candidate (render locally or remotely, compare, validate).
//! 4) Record the step artifact (`success`, `failure`, or `error`).
//! 5) Repeat until no opportunities remain or the step budget is spent,
//!    then write `<base>_reduced_final.frag` and clear the marker.
//!
//! ## Notable entry points
//! - `ReductionDriver`: the step loop.
//! - `build_judge` / `ReductionKind`: oracle selection.
//! - `LocalDispatcher` / `RemoteDispatcher`: execution backends.
//! - `latest_successful_step` and friends: the resume protocol.

pub mod reduction;

pub use reduction::{
    build_judge, LocalDispatcher, LocalDispatcherConfig, ReducerConfig, ReductionDriver,
    ReductionError, ReductionKind, ReductionSummary, RemoteDispatcher, Termination,
};

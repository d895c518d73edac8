//! Integration tests for the shader reduction engine.
//!
//! Run with: `cargo test --test integration`

mod judge_selection;
mod reduction_loop;

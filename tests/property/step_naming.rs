//! Property tests for step artifact naming and directory scans.
//!
//! The working directory is the only record of progress, so the naming
//! scheme must round-trip exactly and the scans must agree with a naive
//! in-memory reconstruction.

use std::fs;

use proptest::prelude::*;

use glsl_reduce::reduction::{
    candidate_name, latest_any_step, latest_successful_step, parse_step_artifact,
    step_artifact_name, StepOutcome,
};

fn outcome_strategy() -> impl Strategy<Value = StepOutcome> {
    prop_oneof![
        Just(StepOutcome::Success),
        Just(StepOutcome::Failure),
        Just(StepOutcome::Error),
    ]
}

proptest! {
    #[test]
    fn artifact_names_round_trip(
        base in "[a-z][a-z0-9]{0,11}",
        index in 0u32..100_000,
        outcome in outcome_strategy(),
    ) {
        let name = step_artifact_name(&base, index, outcome);
        prop_assert_eq!(parse_step_artifact(&name, &base), Some((index, outcome)));
    }

    #[test]
    fn untagged_candidates_are_never_records(
        base in "[a-z][a-z0-9]{0,11}",
        index in 0u32..100_000,
    ) {
        let name = candidate_name(&base, index);
        prop_assert_eq!(parse_step_artifact(&name, &base), None);
    }

    #[test]
    fn foreign_bases_are_ignored(
        base in "[a-z]{3,8}",
        other in "[a-z]{3,8}",
        index in 0u32..1000,
        outcome in outcome_strategy(),
    ) {
        prop_assume!(base != other);
        let name = step_artifact_name(&other, index, outcome);
        // A different base must not contribute records, except when it is an
        // extension of ours that still parses as digits-plus-tag (it cannot,
        // since the remainder starts with a letter).
        prop_assert_eq!(parse_step_artifact(&name, &base), None);
    }

    #[test]
    fn scans_agree_with_naive_reconstruction(
        steps in prop::collection::btree_map(1u32..300, outcome_strategy(), 0..12),
    ) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("variant.frag"), "x").unwrap();
        for (&index, &outcome) in &steps {
            let name = step_artifact_name("variant", index, outcome);
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let expect_any = steps.keys().max().copied();
        let expect_success = steps
            .iter()
            .filter(|(_, &o)| o == StepOutcome::Success)
            .map(|(&i, _)| i)
            .max();

        prop_assert_eq!(latest_any_step(dir.path(), "variant").unwrap(), expect_any);
        prop_assert_eq!(
            latest_successful_step(dir.path(), "variant").unwrap(),
            expect_success
        );
    }
}

//! Replaying a seed replays the whole run.

use std::fs;
use std::path::Path;

use proptest::prelude::*;

use glsl_reduce::reduction::{
    AlwaysReduceJudge, LineRemovalSource, ReducerConfig, ReductionDriver, ReductionRng,
};

fn run_once(dir: &Path, source: &str, seed: u64, max_steps: u32) -> Vec<(String, String)> {
    let shader = dir.join("variant.frag");
    fs::write(&shader, source).unwrap();
    fs::write(shader.with_extension("json"), "{}").unwrap();

    ReductionDriver::new(
        ReducerConfig {
            reduce_everywhere: true,
            seed,
            max_steps,
            ..Default::default()
        },
        Box::new(LineRemovalSource),
        Box::new(AlwaysReduceJudge),
    )
    .run(&shader)
    .unwrap();

    let mut artifacts: Vec<(String, String)> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .map(|p| {
            (
                p.file_name().unwrap().to_string_lossy().into_owned(),
                fs::read_to_string(&p).unwrap(),
            )
        })
        .collect();
    artifacts.sort();
    artifacts
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn same_seed_same_artifacts(
        seed in any::<u64>(),
        lines in prop::collection::vec("[a-z]{1,8}", 2..8),
        max_steps in 1u32..6,
    ) {
        let mut source = String::new();
        for line in &lines {
            source.push_str(line);
            source.push('\n');
        }

        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        prop_assert_eq!(
            run_once(a.path(), &source, seed, max_steps),
            run_once(b.path(), &source, seed, max_steps)
        );
    }

    #[test]
    fn pick_index_stays_in_range(seed in any::<u64>(), n in 1usize..64) {
        let mut rng = ReductionRng::new(seed);
        for _ in 0..128 {
            prop_assert!(rng.pick_index(n) < n);
        }
    }
}

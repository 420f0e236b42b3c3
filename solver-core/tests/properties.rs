use proptest::prelude::*;
use solver_core::{Hotspot, Solver, SolverConfig, SubstepPlan, derived_tau, stable_substep_count};

fn config() -> impl Strategy<Value = SolverConfig> {
    (0.01f64..2.0, 0.1f64..20.0, 0.1f64..=1.0).prop_map(|(alpha, mu, margin)| SolverConfig {
        alpha,
        mu,
        margin,
    })
}

fn hotspots(n: usize) -> impl Strategy<Value = Vec<Hotspot>> {
    prop::collection::vec((0..n, 0..n, 0.0f64..1.0), 1..6)
        .prop_map(|v| v.into_iter().map(|(x, y, a)| Hotspot::new(x, y, a)).collect())
}

fn assert_peak_never_grows(s: &mut Solver, jumps: usize) -> Result<(), TestCaseError> {
    let mut peak = s.peak();
    for _ in 0..jumps {
        s.jump().unwrap();
        let next = s.peak();
        prop_assert!(next <= peak * (1.0 + 1e-5), "{} -> {}", peak, next);
        prop_assert!(s.field().iter().all(|&v| v >= 0.0 && v.is_finite()));
        peak = next;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn substep_count_is_minimal_and_stable(
        alpha in 0.001f64..10.0,
        mu in 0.01f64..100.0,
        margin in 0.05f64..=1.0,
        n in 2usize..512,
    ) {
        let dx = 1.0 / (n - 1) as f64;
        let plan = SubstepPlan::derive(alpha, mu, dx, margin).unwrap();
        let bound = margin * plan.dt_max;
        prop_assert!(plan.k >= 1);
        prop_assert!(plan.dt <= bound * (1.0 + 1e-9));
        if plan.k > 1 {
            prop_assert!(plan.tau / (plan.k - 1) as f64 > bound * (1.0 - 1e-9));
        }
        // Independent of N and alpha.
        prop_assert_eq!(plan.k, stable_substep_count(1.0, mu, margin).unwrap());
    }

    #[test]
    fn tau_decreases_with_grid_size(
        alpha in 0.01f64..2.0,
        mu in 0.1f64..20.0,
        n in 2usize..400,
        extra in 1usize..100,
    ) {
        let coarse = derived_tau(alpha, mu, 1.0 / (n - 1) as f64);
        let fine = derived_tau(alpha, mu, 1.0 / (n + extra - 1) as f64);
        prop_assert!(fine < coarse);
    }

    #[test]
    fn maximum_never_grows(
        cfg in config(),
        (n, seed) in (2usize..20).prop_flat_map(|n| (Just(n), hotspots(n))),
        jumps in 1usize..4,
    ) {
        let mut s = Solver::new(n).unwrap();
        s.set_config(cfg).unwrap();
        s.seed(&seed).unwrap();
        assert_peak_never_grows(&mut s, jumps)?;
    }

    #[test]
    fn maximum_never_grows_from_full_field(
        cfg in config(),
        (n, values) in (2usize..16)
            .prop_flat_map(|n| (Just(n), prop::collection::vec(0.0f32..1.0, n * n))),
        jumps in 1usize..4,
    ) {
        let mut s = Solver::new(n).unwrap();
        s.set_config(cfg).unwrap();
        s.seed_field(&values).unwrap();
        assert_peak_never_grows(&mut s, jumps)?;
    }

    #[test]
    fn weighted_total_is_conserved(cfg in config(), spots in hotspots(12)) {
        let mut s = Solver::new(12).unwrap();
        s.set_config(cfg).unwrap();
        s.seed(&spots).unwrap();
        let before = s.weighted_total();
        s.jump().unwrap();
        prop_assert!((s.weighted_total() - before).abs() <= 1e-3 * before.max(1e-3));
    }

    #[test]
    fn replay_is_deterministic(cfg in config(), spots in hotspots(10)) {
        let run = || {
            let mut s = Solver::new(10).unwrap();
            s.set_config(cfg).unwrap();
            s.seed(&spots).unwrap();
            s.jump().unwrap();
            s.jump().unwrap();
            s.snapshot_field()
        };
        prop_assert_eq!(run(), run());
    }
}

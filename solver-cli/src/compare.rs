use anyhow::{Result, ensure};
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use solver_core::{REFERENCE_MARGIN, RUN_MARGIN, Solver};
use std::io::{self, Write};

use crate::ic::{IcFamily, MIN_IC_SIZE};
use crate::record::parse_mu_set;

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Grid size N (NxN)
    #[arg(long, default_value_t = 64)]
    pub n: usize,

    /// Diffusivity
    #[arg(long, default_value_t = 0.2)]
    pub alpha: f64,

    /// Comma-separated mu set
    #[arg(long, default_value = "2,5,10,20")]
    pub mu_set: String,

    /// Interactive stability margin
    #[arg(long, default_value_t = RUN_MARGIN)]
    pub s_run: f64,

    /// Reference stability margin
    #[arg(long, default_value_t = REFERENCE_MARGIN)]
    pub s_ref: f64,

    /// Initial condition family
    #[arg(long, value_enum, default_value_t = IcFamily::Gaussians)]
    pub ic: IcFamily,

    /// RNG seed for the initial condition
    #[arg(long, default_value_t = 123)]
    pub seed: u64,
}

/// One output line: both margins jumping the same field by the same τ.
#[derive(Debug, Serialize)]
pub struct CompareRow {
    pub mu: f64,
    pub tau: f64,
    pub k_run: u32,
    pub k_ref: u32,
    pub run_ms: f64,
    pub ref_ms: f64,
    pub max_abs_diff: f32,
}

pub fn run(args: &CompareArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for row in compare(args)? {
        serde_json::to_writer(&mut out, &row)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

pub fn compare(args: &CompareArgs) -> Result<Vec<CompareRow>> {
    ensure!(args.n >= MIN_IC_SIZE, "n must be >= {MIN_IC_SIZE}, got {}", args.n);
    let mu_values = parse_mu_set(&args.mu_set)?;

    let initial = args
        .ic
        .generate(&mut ChaCha8Rng::seed_from_u64(args.seed), args.n);

    let mut rows = Vec::with_capacity(mu_values.len());
    for mu in mu_values {
        let mut fast = Solver::new(args.n)?;
        let mut reference = Solver::new(args.n)?;
        for s in [&mut fast, &mut reference] {
            s.set_alpha(args.alpha)?;
            s.set_mu(mu)?;
            s.seed_field(&initial)?;
        }
        fast.set_margin(args.s_run)?;
        reference.set_margin(args.s_ref)?;

        let a = fast.jump()?;
        let b = reference.jump()?;

        let max_abs_diff = fast
            .field()
            .iter()
            .zip(reference.field())
            .map(|(p, q)| (p - q).abs())
            .fold(0.0f32, f32::max);

        log::debug!("mu={mu}: k_run={} k_ref={} diff={max_abs_diff:.3e}", a.k, b.k);
        rows.push(CompareRow {
            mu,
            tau: a.tau,
            k_run: a.k,
            k_ref: b.k,
            run_ms: a.compute_ms,
            ref_ms: b.compute_ms,
            max_abs_diff,
        });
    }
    Ok(rows)
}

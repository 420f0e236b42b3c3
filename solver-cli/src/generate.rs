use anyhow::{Context, Result, ensure};
use clap::Args;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use solver_core::{REFERENCE_MARGIN, Solver};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::ic::{IcFamily, MIN_IC_SIZE};
use crate::record::{DatasetWriter, MetaRow, SampleReader, Split, TARGET_FILE, parse_mu_set};

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Output directory
    #[arg(long)]
    pub out: PathBuf,

    /// Split label written into meta.jsonl
    #[arg(long, value_enum, default_value_t = Split::Train)]
    pub split: Split,

    /// Grid size N (NxN)
    #[arg(long, default_value_t = 64)]
    pub n: usize,

    /// Trajectory start index (for deterministic split-by-range)
    #[arg(long, default_value_t = 0)]
    pub traj_start: usize,

    /// Number of trajectories to generate
    #[arg(long, default_value_t = 100)]
    pub traj_count: usize,

    /// Samples per trajectory
    #[arg(long, default_value_t = 8)]
    pub t_steps: usize,

    /// Diffusivity alpha min (sampled per trajectory)
    #[arg(long, default_value_t = 0.05)]
    pub alpha_min: f64,

    /// Diffusivity alpha max (sampled per trajectory)
    #[arg(long, default_value_t = 0.5)]
    pub alpha_max: f64,

    /// Comma-separated mu set, e.g. "2,5,10,20"
    #[arg(long, default_value = "2,5,10,20")]
    pub mu_set: String,

    /// Reference stability margin used for the targets
    #[arg(long, default_value_t = REFERENCE_MARGIN)]
    pub s_ref: f64,

    /// Base RNG seed
    #[arg(long, default_value_t = 123)]
    pub seed: u64,
}

impl GenerateArgs {
    fn validate(&self) -> Result<Vec<f64>> {
        ensure!(self.n >= MIN_IC_SIZE, "n must be >= {MIN_IC_SIZE}, got {}", self.n);
        ensure!(
            self.alpha_min > 0.0 && self.alpha_max > self.alpha_min,
            "need 0 < alpha_min < alpha_max, got [{}, {})",
            self.alpha_min,
            self.alpha_max
        );
        ensure!(
            self.s_ref > 0.0 && self.s_ref <= 1.0,
            "s_ref must lie in (0, 1], got {}",
            self.s_ref
        );
        parse_mu_set(&self.mu_set)
    }
}

/// Stable per-trajectory seed, so any index range can be regenerated alone.
pub fn trajectory_seed(base: u64, traj_idx: usize) -> u64 {
    base ^ (traj_idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

pub fn run(args: &GenerateArgs) -> Result<()> {
    let mu_values = args.validate()?;
    let mut writer = DatasetWriter::create(&args.out, args.n)?;
    let mut last_target = None;

    for traj_idx in args.traj_start..args.traj_start + args.traj_count {
        let traj_seed = trajectory_seed(args.seed, traj_idx);
        let mut rng = ChaCha8Rng::seed_from_u64(traj_seed);

        let alpha = rng.gen_range(args.alpha_min..args.alpha_max);
        let family = IcFamily::sample(&mut rng);
        let initial = family.generate(&mut rng, args.n);

        let mut solver = Solver::new(args.n)?;
        solver.set_alpha(alpha)?;
        solver.set_margin(args.s_ref)?;
        solver.seed_field(&initial)?;

        log::debug!(
            "trajectory {traj_idx}: seed={traj_seed:#x} alpha={alpha:.4} ic={}",
            family.as_str()
        );

        for step_idx in 0..args.t_steps {
            let mu = *mu_values
                .choose(&mut rng)
                .context("mu set is empty")?;
            solver.set_mu(mu)?;

            let input = solver.snapshot_field();
            let step = solver.jump()?;
            let target = solver.snapshot_field();

            let row = MetaRow {
                global_sample_idx: writer.samples(),
                split: args.split,
                traj_idx,
                step_idx,
                base_seed: args.seed,
                traj_seed,
                n: args.n,
                dx: solver.dx(),
                alpha,
                mu,
                tau: step.tau,
                s_ref: args.s_ref,
                k_used_ref: step.k,
                compute_ms: step.compute_ms,
                ic_type: family.as_str().to_string(),
            };
            writer.write_sample(&input, &target, &row)?;
            last_target = Some(target);
        }
    }

    let samples = writer.finish()?;
    verify_tail(&args.out, args.n, samples, last_target.as_deref())?;
    log::info!("wrote dataset to {}", args.out.display());
    log::info!(
        "samples: {samples} (traj_count={} * t_steps={})",
        args.traj_count,
        args.t_steps
    );
    Ok(())
}

/// Re-reads the target file: sample count and last sample must match.
fn verify_tail(dir: &Path, n: usize, samples: u64, last: Option<&[f32]>) -> Result<()> {
    let path = dir.join(TARGET_FILE);
    let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = SampleReader::new(file, n);
    let found = reader.sample_count()?;
    ensure!(found == samples, "{} holds {found} samples, wrote {samples}", path.display());
    if let Some(expected) = last {
        ensure!(
            reader.read(samples - 1)? == expected,
            "last sample of {} does not match",
            path.display()
        );
    }
    Ok(())
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::clock::{Clock, InstantClock};
use crate::error::{SolverError, SolverResult};
use crate::grid::{Field, Grid};
use crate::kernel;
use crate::stability::{self, SubstepPlan};

/// Physical and numerical parameters. Changing them never touches the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Diffusivity α > 0.
    pub alpha: f64,
    /// Jump parameter μ > 0; τ = μ·dx²/α.
    pub mu: f64,
    /// Stability margin s ∈ (0, 1].
    pub margin: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            alpha: 0.2,
            mu: 10.0,
            margin: stability::RUN_MARGIN,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> SolverResult<()> {
        stability::check_alpha(self.alpha)?;
        stability::check_mu(self.mu)?;
        stability::check_margin(self.margin)?;
        Ok(())
    }
}

/// Point stimulus added to the current field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub x: usize,
    pub y: usize,
    pub amplitude: f64,
}

impl Hotspot {
    pub fn new(x: usize, y: usize, amplitude: f64) -> Self {
        Hotspot { x, y, amplitude }
    }
}

/// Outcome of one τ-jump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Simulated duration advanced.
    pub tau: f64,
    /// Substeps used.
    pub k: u32,
    /// Wall-clock time of the substep loop alone.
    pub compute_ms: f64,
}

/// τ-jump diffusion solver over an N×N field.
///
/// Owns both field buffers; one caller drives it at a time.
#[derive(Debug)]
pub struct Solver<C = InstantClock> {
    config: SolverConfig,
    field: Field,
    clock: C,
}

impl Solver {
    pub fn new(n: usize) -> SolverResult<Solver> {
        Solver::with_clock(n, InstantClock::new())
    }
}

impl<C: Clock> Solver<C> {
    pub fn with_clock(n: usize, clock: C) -> SolverResult<Solver<C>> {
        let grid = Grid::new(n)?;
        Ok(Solver {
            config: SolverConfig::default(),
            field: Field::zeros(grid),
            clock,
        })
    }

    /// Reallocates a zeroed N×N field. Configuration is kept.
    pub fn configure(&mut self, n: usize) -> SolverResult<()> {
        let grid = Grid::new(n).inspect_err(|e| log::warn!("configure rejected: {e}"))?;
        self.field = Field::zeros(grid);
        log::trace!("configured {n}x{n} grid, dx={}", grid.dx());
        Ok(())
    }

    // ---- Parameters ----

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    pub fn set_config(&mut self, config: SolverConfig) -> SolverResult<()> {
        config
            .validate()
            .inspect_err(|e| log::warn!("config rejected: {e}"))?;
        self.config = config;
        Ok(())
    }

    pub fn set_alpha(&mut self, alpha: f64) -> SolverResult<()> {
        self.config.alpha =
            stability::check_alpha(alpha).inspect_err(|e| log::warn!("{e}"))?;
        Ok(())
    }

    pub fn set_mu(&mut self, mu: f64) -> SolverResult<()> {
        self.config.mu = stability::check_mu(mu).inspect_err(|e| log::warn!("{e}"))?;
        Ok(())
    }

    pub fn set_margin(&mut self, margin: f64) -> SolverResult<()> {
        self.config.margin =
            stability::check_margin(margin).inspect_err(|e| log::warn!("{e}"))?;
        Ok(())
    }

    // ---- Accessors ----

    pub fn grid(&self) -> Grid {
        self.field.grid()
    }

    pub fn field_size(&self) -> usize {
        self.grid().n()
    }

    pub fn dx(&self) -> f64 {
        self.grid().dx()
    }

    pub fn current_tau(&self) -> f64 {
        stability::derived_tau(self.config.alpha, self.config.mu, self.dx())
    }

    /// Current values, row-major. Borrowed; see [`Self::snapshot_field`] for a copy.
    pub fn field(&self) -> &[f32] {
        self.field.values()
    }

    pub fn snapshot_field(&self) -> Vec<f32> {
        self.field.values().to_vec()
    }

    pub fn value_at(&self, x: usize, y: usize) -> Option<f32> {
        self.field.get(x, y)
    }

    pub fn peak(&self) -> f32 {
        self.field.max()
    }

    pub fn weighted_total(&self) -> f64 {
        self.field.weighted_total()
    }

    // ---- Seeding ----

    fn check_hotspot(&self, h: &Hotspot) -> SolverResult<()> {
        let grid = self.grid();
        if !grid.contains(h.x, h.y) {
            return Err(SolverError::OutOfBounds { x: h.x, y: h.y, n: grid.n() });
        }
        if !(h.amplitude >= 0.0 && (h.amplitude as f32).is_finite()) {
            return Err(SolverError::InvalidAmplitude { amplitude: h.amplitude });
        }
        Ok(())
    }

    pub fn add_hotspot(&mut self, x: usize, y: usize, amplitude: f64) -> SolverResult<()> {
        self.seed(&[Hotspot::new(x, y, amplitude)])
    }

    /// Adds every hotspot, or none of them if any is invalid or would push
    /// a cell (repeated coordinates accumulate) past [`Field::MAX_VALUE`].
    pub fn seed(&mut self, hotspots: &[Hotspot]) -> SolverResult<()> {
        let grid = self.grid();
        let mut totals: HashMap<usize, f32> = HashMap::new();
        for h in hotspots {
            self.check_hotspot(h)
                .inspect_err(|e| log::warn!("seed rejected: {e}"))?;
            let idx = grid.index(h.x, h.y);
            let total = totals.entry(idx).or_insert(self.field.values()[idx]);
            *total += h.amplitude as f32;
            if !(*total <= Field::MAX_VALUE) {
                log::warn!("seed rejected: cell ({}, {}) would reach {}", h.x, h.y, *total);
                return Err(SolverError::InvalidAmplitude { amplitude: h.amplitude });
            }
        }
        for h in hotspots {
            self.field.add(h.x, h.y, h.amplitude as f32)?;
        }
        Ok(())
    }

    /// Replaces the field with a full initial condition.
    pub fn seed_field(&mut self, values: &[f32]) -> SolverResult<()> {
        if let Some(&bad) = values.iter().find(|v| !(0.0..=Field::MAX_VALUE).contains(*v)) {
            log::warn!("seed_field rejected value {bad}");
            return Err(SolverError::InvalidAmplitude { amplitude: bad as f64 });
        }
        self.field.load(values)
    }

    pub fn reset(&mut self) {
        self.field.clear();
        log::trace!("field reset");
    }

    // ---- Stepping ----

    pub fn plan(&self, margin: f64) -> SolverResult<SubstepPlan> {
        SubstepPlan::derive(self.config.alpha, self.config.mu, self.dx(), margin)
    }

    /// Advances the field by exactly τ using the configured margin.
    pub fn jump(&mut self) -> SolverResult<StepResult> {
        self.jump_with_margin(self.config.margin)
    }

    /// Same τ as [`Self::jump`], with a caller-chosen margin (e.g. the
    /// stricter reference margin).
    pub fn jump_with_margin(&mut self, margin: f64) -> SolverResult<StepResult> {
        let plan = self.plan(margin)?;
        let n = self.field_size();
        let coeff = kernel::diffusion_number(self.config.alpha, plan.dt, self.dx());

        let t0 = self.clock.now_ms();
        for _ in 0..plan.k {
            let (input, output) = self.field.buffers();
            #[cfg(feature = "parallel")]
            kernel::apply_step_parallel(input, output, n, coeff);
            #[cfg(not(feature = "parallel"))]
            kernel::apply_step(input, output, n, coeff);
            self.field.swap();
        }
        let compute_ms = (self.clock.now_ms() - t0).max(0.0);

        log::debug!(
            "jump: tau={:.6e} k={} dt={:.3e} c={coeff} {compute_ms:.3}ms",
            plan.tau,
            plan.k,
            plan.dt
        );

        Ok(StepResult {
            tau: plan.tau,
            k: plan.k,
            compute_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Advances 1ms per reading.
    struct TickClock(Cell<f64>);

    impl Clock for TickClock {
        fn now_ms(&self) -> f64 {
            let t = self.0.get();
            self.0.set(t + 1.0);
            t
        }
    }

    #[test]
    fn defaults_are_the_run_configuration() {
        let s = Solver::new(16).unwrap();
        let c = s.config();
        assert_eq!((c.alpha, c.mu, c.margin), (0.2, 10.0, 0.8));
        assert_eq!(s.field_size(), 16);
        assert!(s.field().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rejected_setters_leave_config_unchanged() {
        let mut s = Solver::new(8).unwrap();
        let before = s.config();
        assert!(s.set_alpha(0.0).is_err());
        assert!(s.set_alpha(-1.0).is_err());
        assert!(s.set_mu(0.0).is_err());
        assert!(s.set_mu(f64::NAN).is_err());
        assert!(s.set_margin(0.0).is_err());
        assert!(s.set_margin(1.2).is_err());
        assert_eq!(s.config(), before);

        s.set_margin(1.0).unwrap();
        assert_eq!(s.config().margin, 1.0);
    }

    #[test]
    fn set_config_is_all_or_nothing() {
        let mut s = Solver::new(8).unwrap();
        let bad = SolverConfig { alpha: 0.5, mu: 3.0, margin: 0.0 };
        assert!(s.set_config(bad).is_err());
        assert_eq!(s.config(), SolverConfig::default());
    }

    #[test]
    fn config_change_keeps_field() {
        let mut s = Solver::new(8).unwrap();
        s.add_hotspot(3, 4, 0.5).unwrap();
        s.set_mu(2.0).unwrap();
        assert_eq!(s.value_at(3, 4), Some(0.5));
    }

    #[test]
    fn hotspot_is_additive_and_unclamped() {
        let mut s = Solver::new(8).unwrap();
        s.add_hotspot(1, 2, 0.75).unwrap();
        s.add_hotspot(1, 2, 0.75).unwrap();
        assert_eq!(s.value_at(1, 2), Some(1.5));
    }

    #[test]
    fn seed_list_fails_atomically() {
        let mut s = Solver::new(8).unwrap();
        let spots = [Hotspot::new(1, 1, 1.0), Hotspot::new(8, 0, 1.0)];
        assert_eq!(s.seed(&spots), Err(SolverError::OutOfBounds { x: 8, y: 0, n: 8 }));
        assert!(s.field().iter().all(|&v| v == 0.0));

        let spots = [Hotspot::new(1, 1, 1.0), Hotspot::new(2, 2, -0.1)];
        assert!(matches!(s.seed(&spots), Err(SolverError::InvalidAmplitude { .. })));
        assert!(s.field().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn stacked_hotspots_cannot_overflow_a_cell() {
        let mut s = Solver::new(8).unwrap();
        let big = 3e37;
        s.add_hotspot(3, 3, big).unwrap();
        assert!(matches!(s.add_hotspot(3, 3, big), Err(SolverError::InvalidAmplitude { .. })));
        assert_eq!(s.value_at(3, 3), Some(big as f32));

        // Repeats within one list accumulate before anything is applied.
        let spots = [
            Hotspot::new(1, 1, 2e37),
            Hotspot::new(5, 5, 1.0),
            Hotspot::new(1, 1, 2e37),
            Hotspot::new(1, 1, 2e37),
        ];
        assert!(matches!(s.seed(&spots), Err(SolverError::InvalidAmplitude { .. })));
        assert_eq!(s.value_at(1, 1), Some(0.0));
        assert_eq!(s.value_at(5, 5), Some(0.0));

        assert!(matches!(s.add_hotspot(0, 0, 3e38), Err(SolverError::InvalidAmplitude { .. })));

        s.jump().unwrap();
        assert!(s.field().iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!(s.peak() > 0.0 && s.peak() <= big as f32);
        assert!(s.value_at(3, 4).unwrap() > 0.0);
    }

    #[test]
    fn overflowing_grid_size_is_rejected_before_allocation() {
        let wraps = 1usize << (usize::BITS / 2);
        assert!(matches!(
            Solver::new(wraps),
            Err(SolverError::InvalidConfig { parameter: "n", .. })
        ));
        let mut s = Solver::new(4).unwrap();
        assert!(s.configure(wraps).is_err());
        assert_eq!(s.field_size(), 4);
    }

    #[test]
    fn seed_field_rejects_values_outside_cell_range() {
        let mut s = Solver::new(3).unwrap();
        let mut ic = vec![0.5f32; 9];
        ic[4] = -1.0;
        assert!(s.seed_field(&ic).is_err());
        assert!(s.field().iter().all(|&v| v == 0.0));
        ic[4] = f32::INFINITY;
        assert!(s.seed_field(&ic).is_err());
        ic[4] = f32::MAX;
        assert!(s.seed_field(&ic).is_err());
        ic[4] = 0.25;
        s.seed_field(&ic).unwrap();
        assert_eq!(s.value_at(1, 1), Some(0.25));
    }

    #[test]
    fn configure_reallocates_and_zeroes() {
        let mut s = Solver::new(8).unwrap();
        s.set_alpha(0.3).unwrap();
        s.add_hotspot(2, 2, 1.0).unwrap();
        s.configure(12).unwrap();
        assert_eq!(s.field_size(), 12);
        assert_eq!(s.field().len(), 144);
        assert!(s.field().iter().all(|&v| v == 0.0));
        assert_eq!(s.config().alpha, 0.3);

        assert!(s.configure(1).is_err());
        assert_eq!(s.field_size(), 12);
    }

    #[test]
    fn compute_time_brackets_the_loop() {
        let mut s = Solver::with_clock(8, TickClock(Cell::new(0.0))).unwrap();
        let r = s.jump().unwrap();
        assert_eq!(r.compute_ms, 1.0);
        assert_eq!(r.k, 50);
    }

    #[test]
    fn reference_margin_uses_more_substeps_for_same_tau() {
        let mut run = Solver::new(16).unwrap();
        let mut reference = Solver::new(16).unwrap();
        let a = run.jump().unwrap();
        let b = reference.jump_with_margin(stability::REFERENCE_MARGIN).unwrap();
        assert_eq!(a.tau, b.tau);
        assert_eq!((a.k, b.k), (50, 100));
        assert!(reference.jump_with_margin(0.0).is_err());
    }

    #[test]
    fn snapshot_is_detached() {
        let mut s = Solver::new(4).unwrap();
        s.add_hotspot(1, 1, 1.0).unwrap();
        let snap = s.snapshot_field();
        s.reset();
        assert_eq!(snap[5], 1.0);
        assert_eq!(s.value_at(1, 1), Some(0.0));
    }
}

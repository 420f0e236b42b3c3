//! Substep count for a τ-jump from the explicit stencil's stability bound.
//!
//! τ = μ·dx²/α and dt_max = dx²/(C·α), with C the stencil constant. The
//! minimal k with τ/k ≤ s·dt_max is always derived from those two quantities
//! rather than from the cancelled closed form C·μ/s.

use crate::error::{SolverError, SolverResult};

/// Stability constant of the four-neighbour 2D Laplacian: dt ≤ dx²/(4α).
pub const STENCIL_STABILITY_CONSTANT: f64 = 4.0;

/// Margin for interactive stepping.
pub const RUN_MARGIN: f64 = 0.8;

/// Margin for reference (ground-truth) generation.
pub const REFERENCE_MARGIN: f64 = 0.4;

/// Ratios at most this far (relative) above an integer are taken as that
/// integer. The resulting Δt may exceed s·dt_max by the same relative amount.
pub const SNAP_TOLERANCE: f64 = 1e-9;

pub fn derived_tau(alpha: f64, mu: f64, dx: f64) -> f64 {
    mu * dx * dx / alpha
}

pub fn dt_max(alpha: f64, dx: f64) -> f64 {
    dx * dx / (STENCIL_STABILITY_CONSTANT * alpha)
}

pub fn check_alpha(alpha: f64) -> SolverResult<f64> {
    if !(alpha.is_finite() && alpha > 0.0) {
        return Err(SolverError::config("alpha", alpha, "must be finite and > 0"));
    }
    Ok(alpha)
}

pub fn check_mu(mu: f64) -> SolverResult<f64> {
    if !(mu.is_finite() && mu > 0.0) {
        return Err(SolverError::config("mu", mu, "must be finite and > 0"));
    }
    Ok(mu)
}

pub fn check_margin(margin: f64) -> SolverResult<f64> {
    if !(margin > 0.0 && margin <= 1.0) {
        return Err(SolverError::config("margin", margin, "must lie in (0, 1]"));
    }
    Ok(margin)
}

/// Everything one τ-jump needs: its duration, the substep count and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubstepPlan {
    pub tau: f64,
    pub dt_max: f64,
    pub k: u32,
    pub dt: f64,
}

impl SubstepPlan {
    /// `mu` may be zero here: a zero-length jump is one no-op substep.
    pub fn derive(alpha: f64, mu: f64, dx: f64, margin: f64) -> SolverResult<SubstepPlan> {
        check_alpha(alpha)?;
        check_margin(margin)?;
        if !(mu.is_finite() && mu >= 0.0) {
            return Err(SolverError::config("mu", mu, "must be finite and >= 0"));
        }
        if !(dx.is_finite() && dx > 0.0) {
            return Err(SolverError::config("dx", dx, "must be finite and > 0"));
        }

        let tau = derived_tau(alpha, mu, dx);
        let dt_max = dt_max(alpha, dx);
        let ratio = tau / (margin * dt_max);

        // Only rounding noise above an integer is dropped; anything below
        // already ceils to that integer.
        let floor = ratio.floor();
        let raw = if ratio - floor <= SNAP_TOLERANCE * floor.max(1.0) {
            floor
        } else {
            ratio.ceil()
        };
        if !raw.is_finite() || raw > u32::MAX as f64 {
            return Err(SolverError::config("mu", mu, "jump needs more substeps than fit in u32"));
        }
        let k = (raw as u32).max(1);

        Ok(SubstepPlan {
            tau,
            dt_max,
            k,
            dt: tau / k as f64,
        })
    }
}

/// Minimal stable substep count. Independent of dx, so it is evaluated on
/// the unit spacing.
pub fn stable_substep_count(alpha: f64, mu: f64, margin: f64) -> SolverResult<u32> {
    SubstepPlan::derive(alpha, mu, 1.0, margin).map(|p| p.k)
}

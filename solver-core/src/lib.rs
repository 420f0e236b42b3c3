//! τ-jump explicit diffusion on a uniform N×N grid.
//!
//! A [`Solver`] advances a scalar field by a physical duration
//! τ = μ·dx²/α per [`Solver::jump`], splitting it into the minimal number
//! of substeps that keeps the explicit five-point update stable under the
//! configured safety margin.

pub mod clock;
pub mod context;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod solver;
pub mod stability;

pub use clock::{Clock, InstantClock};
pub use context::SolverContext;
pub use error::{SolverError, SolverResult};
pub use grid::{Field, Grid};
pub use solver::{Hotspot, Solver, SolverConfig, StepResult};
pub use stability::{
    REFERENCE_MARGIN, RUN_MARGIN, SubstepPlan, derived_tau, stable_substep_count,
};

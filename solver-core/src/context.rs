//! Explicitly scoped holder for a single solver, for hosts that need one
//! long-lived instance (a UI page, a worker). Empty until configured.

use crate::clock::{Clock, InstantClock};
use crate::error::{SolverError, SolverResult};
use crate::solver::Solver;

#[derive(Debug, Default)]
pub struct SolverContext<C = InstantClock> {
    clock: C,
    solver: Option<Solver<C>>,
}

impl<C: Clock + Clone> SolverContext<C> {
    pub fn new(clock: C) -> Self {
        SolverContext { clock, solver: None }
    }

    pub fn is_configured(&self) -> bool {
        self.solver.is_some()
    }

    /// Creates the solver, or resizes the existing one keeping its config.
    /// On error the previous state (configured or not) is kept.
    pub fn configure(&mut self, n: usize) -> SolverResult<()> {
        match self.solver.as_mut() {
            Some(solver) => solver.configure(n),
            None => {
                self.solver = Some(Solver::with_clock(n, self.clock.clone())?);
                Ok(())
            }
        }
    }

    pub fn solver(&self) -> SolverResult<&Solver<C>> {
        self.solver.as_ref().ok_or(SolverError::NotInitialized)
    }

    pub fn solver_mut(&mut self) -> SolverResult<&mut Solver<C>> {
        self.solver.as_mut().ok_or(SolverError::NotInitialized)
    }

    /// Drops the solver; later calls fail with `NotInitialized`.
    pub fn release(&mut self) -> Option<Solver<C>> {
        self.solver.take()
    }
}

use solver_core::{Clock, REFERENCE_MARGIN, SolverContext, SolverError, StepResult};
use wasm_bindgen::prelude::*;

/// Browser high-resolution timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }
}

fn js_err(e: SolverError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct Solver {
    ctx: SolverContext<PerformanceClock>,
    reference_margin: f64,
}

#[wasm_bindgen]
impl Solver {
    #[wasm_bindgen(constructor)]
    pub fn new(n: usize) -> Result<Solver, JsValue> {
        let mut solver = Solver::unconfigured();
        solver.configure(n)?;
        Ok(solver)
    }

    /// A solver with no grid yet; every call fails until `configure`.
    pub fn unconfigured() -> Solver {
        Solver {
            ctx: SolverContext::new(PerformanceClock),
            reference_margin: REFERENCE_MARGIN,
        }
    }

    /// Resize to N×N. Zeroes the field, keeps parameters.
    pub fn configure(&mut self, n: usize) -> Result<(), JsValue> {
        self.ctx.configure(n).map_err(js_err)
    }

    // Parameters
    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), JsValue> {
        self.ctx.solver_mut().and_then(|s| s.set_alpha(alpha)).map_err(js_err)
    }

    pub fn set_mu(&mut self, mu: f64) -> Result<(), JsValue> {
        self.ctx.solver_mut().and_then(|s| s.set_mu(mu)).map_err(js_err)
    }

    pub fn set_margin(&mut self, s: f64) -> Result<(), JsValue> {
        self.ctx.solver_mut().and_then(|solver| solver.set_margin(s)).map_err(js_err)
    }

    pub fn set_reference_margin(&mut self, s: f64) -> Result<(), JsValue> {
        self.reference_margin = solver_core::stability::check_margin(s).map_err(js_err)?;
        Ok(())
    }

    pub fn get_dx(&self) -> Result<f64, JsValue> {
        self.ctx.solver().map(|s| s.dx()).map_err(js_err)
    }

    pub fn current_tau(&self) -> Result<f64, JsValue> {
        self.ctx.solver().map(|s| s.current_tau()).map_err(js_err)
    }

    pub fn field_size(&self) -> Result<usize, JsValue> {
        self.ctx.solver().map(|s| s.field_size()).map_err(js_err)
    }

    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.ctx.solver_mut().map(|s| s.reset()).map_err(js_err)
    }

    pub fn add_hotspot(&mut self, x: usize, y: usize, amplitude: f64) -> Result<(), JsValue> {
        self.ctx
            .solver_mut()
            .and_then(|s| s.add_hotspot(x, y, amplitude))
            .map_err(js_err)
    }

    /// Row-major copy, length N².
    pub fn snapshot_field(&self) -> Result<Vec<f32>, JsValue> {
        self.ctx.solver().map(|s| s.snapshot_field()).map_err(js_err)
    }

    pub fn jump(&mut self) -> Result<StepInfo, JsValue> {
        self.ctx
            .solver_mut()
            .and_then(|s| s.jump())
            .map(StepInfo::from)
            .map_err(js_err)
    }

    pub fn jump_reference(&mut self) -> Result<StepInfo, JsValue> {
        let margin = self.reference_margin;
        self.ctx
            .solver_mut()
            .and_then(|s| s.jump_with_margin(margin))
            .map(StepInfo::from)
            .map_err(js_err)
    }
}

#[wasm_bindgen]
#[derive(Clone, Copy, Debug)]
pub struct StepInfo {
    k: u32,
    compute_ms: f64,
    tau: f64,
}

impl From<StepResult> for StepInfo {
    fn from(r: StepResult) -> Self {
        StepInfo {
            k: r.k,
            compute_ms: r.compute_ms,
            tau: r.tau,
        }
    }
}

#[wasm_bindgen]
impl StepInfo {
    #[wasm_bindgen(getter)]
    pub fn k(&self) -> u32 { self.k }

    #[wasm_bindgen(getter)]
    pub fn compute_ms(&self) -> f64 { self.compute_ms }

    #[wasm_bindgen(getter)]
    pub fn tau(&self) -> f64 { self.tau }
}

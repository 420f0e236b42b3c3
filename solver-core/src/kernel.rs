//! Explicit five-point diffusion substep.
//!
//! next = u + c·(up + down + left + right − 4u), c = α·Δt/dx².
//!
//! Edges are zero-flux: a neighbour that falls off the grid is replaced by
//! its mirror image across the edge node (u₋₁ = u₁), so corners see their
//! two interior neighbours twice each.

/// Mirror an off-grid neighbour index back inside `0..n`.
#[inline]
fn below(i: usize, n: usize) -> usize {
    if i == 0 { 1.min(n - 1) } else { i - 1 }
}

#[inline]
fn above(i: usize, n: usize) -> usize {
    if i + 1 == n { i.saturating_sub(1) } else { i + 1 }
}

/// Writes row `y` of the next field. Reads only `input`.
#[inline]
fn update_row(input: &[f32], out_row: &mut [f32], n: usize, y: usize, c: f32) {
    let row = y * n;
    let row_up = below(y, n) * n;
    let row_down = above(y, n) * n;

    for x in 0..n {
        let u = input[row + x];
        let up = input[row_up + x];
        let down = input[row_down + x];
        let left = input[row + below(x, n)];
        let right = input[row + above(x, n)];

        let lap = (up + down + left + right) - 4.0 * u;
        out_row[x] = (u + c * lap).max(0.0);
    }
}

/// One substep from `input` into `output`, both N×N row-major.
///
/// `coeff` is α·Δt/dx²; stability requires `coeff <= 0.25`.
pub fn apply_step(input: &[f32], output: &mut [f32], n: usize, coeff: f32) {
    debug_assert_eq!(input.len(), n * n);
    debug_assert_eq!(output.len(), n * n);

    for (y, out_row) in output.chunks_exact_mut(n).enumerate() {
        update_row(input, out_row, n, y, coeff);
    }
}

/// Row-parallel [`apply_step`]. Produces bit-identical output.
#[cfg(feature = "parallel")]
pub fn apply_step_parallel(input: &[f32], output: &mut [f32], n: usize, coeff: f32) {
    use rayon::prelude::*;

    debug_assert_eq!(input.len(), n * n);
    debug_assert_eq!(output.len(), n * n);

    output
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(y, out_row)| update_row(input, out_row, n, y, coeff));
}

/// Per-substep coefficient α·Δt/dx², rounded once to the field precision.
pub fn diffusion_number(alpha: f64, dt: f64, dx: f64) -> f32 {
    (alpha * dt / (dx * dx)) as f32
}

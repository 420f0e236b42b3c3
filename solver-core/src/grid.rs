//! Uniform N×N grid on the unit square and its double-buffered scalar field.

use crate::error::{SolverError, SolverResult};

/// Node-centred grid: N nodes per axis spanning [0, 1], so dx = 1/(N-1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    n: usize,
    dx: f64,
}

impl Grid {
    pub const MIN_SIZE: usize = 2;

    pub fn new(n: usize) -> SolverResult<Grid> {
        if n < Self::MIN_SIZE {
            return Err(SolverError::config("n", n as f64, "grid needs at least 2 nodes per axis"));
        }
        // N² cells of 4 bytes each must be addressable.
        if n.checked_mul(n).and_then(|cells| cells.checked_mul(4)).is_none() {
            return Err(SolverError::config("n", n as f64, "N*N cells overflow the address space"));
        }
        Ok(Grid {
            n,
            dx: 1.0 / ((n - 1) as f64),
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn cell_count(&self) -> usize {
        self.n * self.n
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.n && y < self.n
    }

    /// Row-major index; `y` selects the row.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.n + x
    }
}

/// Scalar field with a current buffer and a scratch buffer for the next
/// substep. The two are exchanged after every substep, never copied.
#[derive(Debug, Clone)]
pub struct Field {
    grid: Grid,
    current: Vec<f32>,
    next: Vec<f32>,
}

impl Field {
    /// Largest value a cell may hold. Four neighbours of this size still
    /// sum to a finite f32, so the stencil cannot overflow.
    pub const MAX_VALUE: f32 = f32::MAX / 8.0;

    pub fn zeros(grid: Grid) -> Field {
        let size = grid.cell_count();
        Field {
            grid,
            current: vec![0.0; size],
            next: vec![0.0; size],
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn values(&self) -> &[f32] {
        &self.current
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.grid
            .contains(x, y)
            .then(|| self.current[self.grid.index(x, y)])
    }

    pub fn add(&mut self, x: usize, y: usize, amount: f32) -> SolverResult<()> {
        if !self.grid.contains(x, y) {
            return Err(SolverError::OutOfBounds { x, y, n: self.grid.n() });
        }
        let idx = self.grid.index(x, y);
        self.current[idx] += amount;
        Ok(())
    }

    /// Replaces the current values wholesale.
    pub fn load(&mut self, values: &[f32]) -> SolverResult<()> {
        if values.len() != self.current.len() {
            return Err(SolverError::FieldLength {
                expected: self.current.len(),
                actual: values.len(),
            });
        }
        self.current.copy_from_slice(values);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.current.fill(0.0);
        self.next.fill(0.0);
    }

    /// Read-only current buffer plus writable next buffer, for one substep.
    pub(crate) fn buffers(&mut self) -> (&[f32], &mut [f32]) {
        (&self.current, &mut self.next)
    }

    pub(crate) fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    pub fn max(&self) -> f32 {
        self.current.iter().copied().fold(0.0, f32::max)
    }

    /// Total with trapezoid weights (edges ½, corners ¼): the quantity the
    /// zero-flux boundary conserves.
    pub fn weighted_total(&self) -> f64 {
        let n = self.grid.n();
        let weight = |i: usize| if i == 0 || i == n - 1 { 0.5 } else { 1.0 };
        let mut total = 0.0;
        for y in 0..n {
            for x in 0..n {
                total += weight(x) * weight(y) * self.current[self.grid.index(x, y)] as f64;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rejects_degenerate_sizes() {
        assert!(matches!(Grid::new(0), Err(SolverError::InvalidConfig { .. })));
        assert!(matches!(Grid::new(1), Err(SolverError::InvalidConfig { .. })));
        let g = Grid::new(2).unwrap();
        assert_eq!(g.dx(), 1.0);
    }

    #[test]
    fn grid_rejects_sizes_whose_buffer_overflows() {
        let half_bits = usize::BITS / 2;
        // N² wraps to zero.
        let wraps = 1usize << half_bits;
        // N² fits but N²·4 bytes does not.
        let too_many_bytes = 1usize << (half_bits - 1);
        for n in [usize::MAX, wraps, too_many_bytes] {
            assert!(
                matches!(Grid::new(n), Err(SolverError::InvalidConfig { parameter: "n", .. })),
                "n = {n}"
            );
        }
        assert!(Grid::new((1usize << (half_bits - 1)) - 1).is_ok());
    }

    #[test]
    fn dx_spans_unit_square() {
        let g = Grid::new(64).unwrap();
        assert!((g.dx() - 1.0 / 63.0).abs() < 1e-15);
        assert_eq!(g.cell_count(), 64 * 64);
        assert_eq!(g.index(3, 2), 2 * 64 + 3);
    }

    #[test]
    fn add_out_of_bounds_leaves_field_untouched() {
        let mut f = Field::zeros(Grid::new(4).unwrap());
        f.add(1, 1, 0.5).unwrap();
        let before = f.values().to_vec();
        let err = f.add(4, 0, 1.0).unwrap_err();
        assert_eq!(err, SolverError::OutOfBounds { x: 4, y: 0, n: 4 });
        assert_eq!(f.values(), &before[..]);
    }

    #[test]
    fn load_checks_length() {
        let mut f = Field::zeros(Grid::new(3).unwrap());
        assert_eq!(
            f.load(&[1.0; 8]),
            Err(SolverError::FieldLength { expected: 9, actual: 8 })
        );
        f.load(&[0.25; 9]).unwrap();
        assert_eq!(f.get(2, 2), Some(0.25));
        assert_eq!(f.get(3, 0), None);
    }

    #[test]
    fn swap_exchanges_roles() {
        let mut f = Field::zeros(Grid::new(2).unwrap());
        {
            let (_, next) = f.buffers();
            next.fill(7.0);
        }
        f.swap();
        assert!(f.values().iter().all(|&v| v == 7.0));
    }

    #[test]
    fn weighted_total_of_uniform_field_is_unit_area() {
        let mut f = Field::zeros(Grid::new(5).unwrap());
        f.load(&[1.0; 25]).unwrap();
        // (N-1)^2 interior-equivalent cells, i.e. area / dx^2.
        assert!((f.weighted_total() - 16.0).abs() < 1e-12);
    }
}

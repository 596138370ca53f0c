// SPDX: CC0-1.0

use crate::{Complex, Number};
use core::f64::consts::PI;
use ndarray::Array2;

/// Magnitudes are floored here before taking log10.
pub const MAGNITUDE_FLOOR: Number = 1e-10;

/// Function values over a grid and the real arrays derived from them.
#[derive(Clone, Debug)]
pub struct ValueField {
    values: Array2<Complex>,
}

impl ValueField {
    pub fn new(values: Array2<Complex>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &Array2<Complex> {
        &self.values
    }

    /// Argument in (-π, π].
    pub fn phase(&self) -> Array2<Number> {
        self.values.mapv(|v| {
            let arg = v.arg();
            if arg == -PI {
                PI
            } else {
                arg
            }
        })
    }

    pub fn magnitude(&self) -> Array2<Number> {
        self.values.mapv(|v| v.norm())
    }

    pub fn log_magnitude(&self) -> Array2<Number> {
        self.values.mapv(|v| {
            let mag = v.norm();
            // f64::max would swallow NaN
            if mag.is_nan() {
                mag
            } else {
                mag.max(MAGNITUDE_FLOOR).log10()
            }
        })
    }

    pub fn real_part(&self) -> Array2<Number> {
        self.values.mapv(|v| v.re)
    }

    pub fn imag_part(&self) -> Array2<Number> {
        self.values.mapv(|v| v.im)
    }
}

/// Rows of a 2-D array as nested vectors.
pub fn nested<T: Clone>(array: &Array2<T>) -> Vec<Vec<T>> {
    array.rows().into_iter().map(|row| row.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NAN;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn derives_components() {
        let field = ValueField::new(array![
            [Complex::new(3.0, 4.0), Complex::new(-1.0, -0.0)],
            [Complex::new(0.0, 0.0), NAN],
        ]);

        let mag = field.magnitude();
        assert_abs_diff_eq!(mag[[0, 0]], 5.0);
        assert_eq!(mag[[1, 0]], 0.0);
        assert!(mag[[1, 1]].is_nan());

        let phase = field.phase();
        assert_abs_diff_eq!(phase[[0, 0]], (4.0f64).atan2(3.0));
        assert_eq!(phase[[0, 1]], PI);
        assert!(phase[[1, 1]].is_nan());

        let log_mag = field.log_magnitude();
        assert_abs_diff_eq!(log_mag[[0, 0]], 5.0f64.log10());
        assert_abs_diff_eq!(log_mag[[1, 0]], -10.0, epsilon = 1e-12);
        assert!(log_mag[[1, 1]].is_nan());

        assert_eq!(field.real_part()[[0, 0]], 3.0);
        assert_eq!(field.imag_part()[[0, 0]], 4.0);
    }

    #[test]
    fn nests_by_row() {
        let a = array![[1, 2, 3], [4, 5, 6]];
        assert_eq!(nested(&a), vec![vec![1, 2, 3], vec![4, 5, 6]]);
    }
}

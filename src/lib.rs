// SPDX: CC0-1.0

pub mod algebra;
pub mod analysis;
pub mod config;
pub mod eval;
pub mod field;
pub mod lex;
pub mod parse;
pub mod plane;
pub mod project;
pub mod request;
pub mod shell;
pub mod stdlib;
pub mod zeta;

use serde::Serialize;

pub type Number = f64;
pub type Complex = num_complex::Complex64;

pub const NAN: Complex = Complex::new(Number::NAN, Number::NAN);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl From<Complex> for Point<Number> {
    fn from(z: Complex) -> Self {
        Self { x: z.re, y: z.im }
    }
}

/// Ordered sequence of points, stored as separate coordinate columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Polyline {
    pub x: Vec<Number>,
    pub y: Vec<Number>,
}

impl Polyline {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Point<Number>> + '_ {
        self.x.iter().zip(&self.y).map(|(&x, &y)| Point { x, y })
    }
}

impl FromIterator<Point<Number>> for Polyline {
    fn from_iter<I: IntoIterator<Item = Point<Number>>>(iter: I) -> Self {
        let (x, y) = iter.into_iter().map(|p| (p.x, p.y)).unzip();
        Self { x, y }
    }
}

/// `n` evenly spaced samples from `start` to `end`, both included.
pub fn linspace(start: Number, end: Number, n: usize) -> Vec<Number> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as Number;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        end
                    } else {
                        start + step * i as Number
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_ends() {
        let xs = linspace(-1.0, 1.0, 5);
        assert_eq!(xs, [-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(linspace(3.0, 4.0, 1), [3.0]);
        assert!(linspace(3.0, 4.0, 0).is_empty());
    }

    #[test]
    fn polyline_collects_points() {
        let line: Polyline = [Complex::new(1.0, 2.0), Complex::new(3.0, 4.0)]
            .into_iter()
            .map(Point::from)
            .collect();
        assert_eq!(line.x, [1.0, 3.0]);
        assert_eq!(line.y, [2.0, 4.0]);
        assert_eq!(line.points().nth(1), Some(Point { x: 3.0, y: 4.0 }));
    }
}

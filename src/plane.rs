// SPDX: CC0-1.0

//! The τ-plane, τ = 1/z. The origin of either plane stands for the point at
//! infinity of the other and is never sampled.

use crate::{linspace, Complex, Number, Point, Polyline};
use core::{f64::consts::TAU, fmt};
use ndarray::{Array, Array2, Dimension, Zip};

/// Samples per reference circle.
pub const CIRCLE_POINTS: usize = 1000;

/// Default zone-of-interest radius, in multiples of `delta`.
pub const ZONE_FACTOR: Number = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaneErrTyp {
    /// Zero where the origin is excluded.
    Origin,
    Delta(Number),
    Bounds { min: Number, max: Number },
    Resolution(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaneErr {
    pub typ: PlaneErrTyp,
    /// Row-major position of the offending element of an array input.
    pub at: Option<usize>,
}

impl PlaneErr {
    const fn new(typ: PlaneErrTyp) -> Self {
        Self { typ, at: None }
    }

    pub const fn is_domain(&self) -> bool {
        matches!(self.typ, PlaneErrTyp::Origin)
    }
}

impl fmt::Display for PlaneErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            PlaneErrTyp::Origin => {
                write!(f, "zero is excluded from the plane (it maps to infinity)")?;
                if let Some(at) = self.at {
                    write!(f, " at element {at}")?;
                }
                Ok(())
            }
            PlaneErrTyp::Delta(delta) => {
                write!(f, "delta must be a positive finite number, got {delta}")
            }
            PlaneErrTyp::Bounds { min, max } => write!(
                f,
                "bounds [{min}, {max}] are empty or lie inside the excluded band around 0"
            ),
            PlaneErrTyp::Resolution(n) => {
                write!(f, "resolution must be at least 2 samples, got {n}")
            }
        }
    }
}

impl std::error::Error for PlaneErr {}

/// Mesh of an x axis and a y axis.
#[derive(Clone, Debug)]
pub struct ComplexGrid {
    xs: Vec<Number>,
    ys: Vec<Number>,
    x: Array2<Number>,
    y: Array2<Number>,
}

impl ComplexGrid {
    pub fn from_axes(xs: Vec<Number>, ys: Vec<Number>) -> Self {
        let shape = (ys.len(), xs.len());
        let x = Array2::from_shape_fn(shape, |(_, col)| xs[col]);
        let y = Array2::from_shape_fn(shape, |(row, _)| ys[row]);
        Self { xs, ys, x, y }
    }

    pub fn axis_x(&self) -> &[Number] {
        &self.xs
    }

    pub fn axis_y(&self) -> &[Number] {
        &self.ys
    }

    pub fn x(&self) -> &Array2<Number> {
        &self.x
    }

    pub fn y(&self) -> &Array2<Number> {
        &self.y
    }

    pub fn shape(&self) -> (usize, usize) {
        self.x.dim()
    }

    pub fn samples(&self) -> Array2<Complex> {
        Zip::from(&self.x)
            .and(&self.y)
            .map_collect(|&re, &im| Complex::new(re, im))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinatePlane {
    delta: Number,
}

impl CoordinatePlane {
    pub fn new(delta: Number) -> Result<Self, PlaneErr> {
        if delta.is_finite() && delta > 0.0 {
            Ok(Self { delta })
        } else {
            Err(PlaneErr::new(PlaneErrTyp::Delta(delta)))
        }
    }

    /// Radius of the unsampled band around the origin.
    pub const fn delta(&self) -> Number {
        self.delta
    }

    /// z ↦ τ = 1/z
    pub fn forward(&self, z: Complex) -> Result<Complex, PlaneErr> {
        invert(z)
    }

    /// τ ↦ z = 1/τ
    pub fn inverse(&self, tau: Complex) -> Result<Complex, PlaneErr> {
        invert(tau)
    }

    pub fn forward_all<D: Dimension>(
        &self,
        zs: &Array<Complex, D>,
    ) -> Result<Array<Complex, D>, PlaneErr> {
        invert_all(zs)
    }

    pub fn inverse_all<D: Dimension>(
        &self,
        taus: &Array<Complex, D>,
    ) -> Result<Array<Complex, D>, PlaneErr> {
        invert_all(taus)
    }

    /// Sample positions along one axis of [min, max]. Whenever the interval
    /// reaches into (-delta, delta) the band is cut out and each remaining
    /// side gets a share of `resolution` proportional to its distance from 0.
    pub fn make_axis(
        &self,
        min: Number,
        max: Number,
        resolution: usize,
    ) -> Result<Vec<Number>, PlaneErr> {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(PlaneErr::new(PlaneErrTyp::Bounds { min, max }));
        }
        if resolution < 2 {
            return Err(PlaneErr::new(PlaneErrTyp::Resolution(resolution)));
        }

        let delta = self.delta;
        if max <= -delta || min >= delta {
            return Ok(linspace(min, max, resolution));
        }

        let span = max - min;
        let share = |bound: Number| {
            // truncation is intended
            ((resolution as Number * bound.abs() / span) as usize).max(2)
        };
        let mut axis = Vec::with_capacity(resolution);
        if min < -delta {
            axis.extend(linspace(min, -delta, share(min)));
        }
        if max > delta {
            axis.extend(linspace(delta, max, share(max)));
        }
        if axis.is_empty() {
            return Err(PlaneErr::new(PlaneErrTyp::Bounds { min, max }));
        }
        Ok(axis)
    }

    /// Square grid over [min, max] × [min, max].
    pub fn make_grid(
        &self,
        min: Number,
        max: Number,
        resolution: usize,
    ) -> Result<ComplexGrid, PlaneErr> {
        let axis = self.make_axis(min, max, resolution)?;
        Ok(ComplexGrid::from_axes(axis.clone(), axis))
    }

    /// Marks the edge of the excluded band.
    pub fn boundary_circle(&self) -> Polyline {
        reference_circle(self.delta)
    }

    pub fn default_epsilon(&self) -> Number {
        ZONE_FACTOR * self.delta
    }

    pub fn zone_circle(&self, epsilon: Option<Number>) -> Polyline {
        reference_circle(epsilon.unwrap_or_else(|| self.default_epsilon()))
    }
}

fn invert(z: Complex) -> Result<Complex, PlaneErr> {
    if z == Complex::new(0.0, 0.0) {
        Err(PlaneErr::new(PlaneErrTyp::Origin))
    } else {
        Ok(z.inv())
    }
}

fn invert_all<D: Dimension>(zs: &Array<Complex, D>) -> Result<Array<Complex, D>, PlaneErr> {
    if let Some(at) = zs.iter().position(|z| *z == Complex::new(0.0, 0.0)) {
        return Err(PlaneErr {
            typ: PlaneErrTyp::Origin,
            at: Some(at),
        });
    }
    Ok(zs.mapv(|z| z.inv()))
}

/// Circle of `radius` about the origin, closed (first and last point coincide).
pub fn reference_circle(radius: Number) -> Polyline {
    linspace(0.0, TAU, CIRCLE_POINTS)
        .into_iter()
        .map(|theta| Point {
            x: radius * theta.cos(),
            y: radius * theta.sin(),
        })
        .collect()
}

// SPDX: CC0-1.0

use crate::{plane::ComplexGrid, Complex, Number, Point, Polyline, NAN};
use core::{fmt, str::FromStr};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Below this modulus a τ sample stands for the point at infinity.
pub const INFINITY_RADIUS: Number = 1e-10;

/// Coordinate system a grid is sampled in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneKind {
    /// τ = 1/z; evaluated at z = 1/τ.
    #[default]
    #[serde(rename = "tau_plane")]
    Tau,
    /// Grid values are evaluated directly.
    #[serde(rename = "z_plane")]
    Z,
    /// w = log τ, sampled directly in w; evaluated at z = exp(-w).
    #[serde(rename = "w_plane")]
    W,
}

impl PlaneKind {
    pub const fn exhaustive() -> &'static [PlaneKind] {
        &[Self::Tau, Self::Z, Self::W]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tau => "tau_plane",
            Self::Z => "z_plane",
            Self::W => "w_plane",
        }
    }

    /// Maps one grid value to the point handed to the evaluator.
    pub fn to_eval(&self, v: Complex) -> Complex {
        match self {
            Self::Tau => v.inv(),
            Self::Z => v,
            Self::W => (-v).exp(),
        }
    }

    /// Display coordinates of a τ-space point in this plane.
    pub fn display(&self, tau: Complex) -> Point<Number> {
        match self {
            Self::Tau | Self::Z => Point::from(tau),
            Self::W => Point {
                x: tau.norm().ln(),
                y: tau.arg(),
            },
        }
    }
}

impl fmt::Display for PlaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlaneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|p| p.name() == s)
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = Self::exhaustive().iter().map(|p| p.name()).collect();
                format!("unknown plane '{s}', expected one of {}", names.join(", "))
            })
    }
}

#[derive(Clone, Debug)]
pub struct ZoneMasks {
    /// |τ| within the caller's interest radius.
    pub interest: Array2<bool>,
    /// |τ| within the fixed zone radius.
    pub zone: Array2<bool>,
}

#[derive(Clone, Debug)]
pub struct Projection {
    pub plane: PlaneKind,
    pub eval_points: Array2<Complex>,
    pub zone_radius: Number,
    /// Only in z-plane mode.
    pub masks: Option<ZoneMasks>,
    /// Real and imaginary w coordinates, only in w-plane mode.
    pub w: Option<(Array2<Number>, Array2<Number>)>,
}

/// Halfway between the origin and the outer bound.
pub fn zone_radius(max_bound: Number) -> Number {
    (max_bound - 0.0) / 2.0
}

/// Replaces samples at the point at infinity with NaN.
pub fn mask_infinity(samples: &Array2<Complex>) -> Array2<Complex> {
    samples.mapv(|v| if v.norm() < INFINITY_RADIUS { NAN } else { v })
}

pub fn project(
    grid: &ComplexGrid,
    plane: PlaneKind,
    interest_radius: Number,
    max_bound: Number,
) -> Projection {
    let samples = grid.samples();
    let zone_radius = zone_radius(max_bound);

    let masks = (plane == PlaneKind::Z).then(|| ZoneMasks {
        interest: samples.mapv(|tau| tau.norm() <= interest_radius),
        zone: samples.mapv(|tau| tau.norm() <= zone_radius),
    });

    let eval_points = match plane {
        PlaneKind::Tau | PlaneKind::Z => mask_infinity(&samples).mapv(|v| plane.to_eval(v)),
        PlaneKind::W => samples.mapv(|v| plane.to_eval(v)),
    };

    let w = (plane == PlaneKind::W).then(|| (grid.x().clone(), grid.y().clone()));

    Projection {
        plane,
        eval_points,
        zone_radius,
        masks,
        w,
    }
}

/// Overlay coordinates for points given in τ-space.
pub fn overlay(plane: PlaneKind, taus: &[Complex]) -> Polyline {
    taus.iter().map(|tau| plane.display(*tau)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::FRAC_PI_2;

    fn grid() -> ComplexGrid {
        ComplexGrid::from_axes(vec![-2.0, 0.0, 2.0], vec![-1.0, 0.0, 1.0])
    }

    #[test]
    fn tau_plane_inverts_and_masks_origin() {
        let p = project(&grid(), PlaneKind::Tau, 1.0, 2.0);
        assert!(p.masks.is_none() && p.w.is_none());
        let z = p.eval_points[[1, 2]];
        assert_abs_diff_eq!(z.re, 0.5);
        assert!(p.eval_points[[1, 1]].is_nan());
        assert_eq!(p.eval_points.iter().filter(|v| v.is_nan()).count(), 1);
    }

    #[test]
    fn z_plane_is_identity_with_masks() {
        let p = project(&grid(), PlaneKind::Z, 1.0, 2.0);
        assert_eq!(p.eval_points[[0, 0]], Complex::new(-2.0, -1.0));
        assert!(p.eval_points[[1, 1]].is_nan());
        assert_abs_diff_eq!(p.zone_radius, 1.0);

        let masks = p.masks.unwrap();
        // masks see the grid before the origin is blanked
        assert!(masks.interest[[1, 1]]);
        assert!(masks.zone[[1, 1]]);
        assert!(masks.interest[[0, 1]]);
        assert!(!masks.interest[[1, 2]]);
        assert!(!masks.zone[[0, 0]]);
    }

    #[test]
    fn w_plane_exponentiates() {
        let p = project(&grid(), PlaneKind::W, 1.0, 2.0);
        let z = p.eval_points[[1, 1]];
        assert_eq!(z, Complex::new(1.0, 0.0));
        let z = p.eval_points[[1, 2]];
        assert_abs_diff_eq!(z.re, (-2.0f64).exp(), epsilon = 1e-15);
        let (wx, wy) = p.w.unwrap();
        assert_eq!(wx[[0, 2]], 2.0);
        assert_eq!(wy[[0, 2]], -1.0);
    }

    #[test]
    fn overlays_are_log_polar_in_w() {
        let taus = [Complex::new(0.0, 2.0)];
        let tau_line = overlay(PlaneKind::Tau, &taus);
        assert_eq!(tau_line.x, [0.0]);
        assert_eq!(tau_line.y, [2.0]);
        assert_eq!(overlay(PlaneKind::Z, &taus), tau_line);

        let w_line = overlay(PlaneKind::W, &taus);
        assert_abs_diff_eq!(w_line.x[0], 2.0f64.ln());
        assert_abs_diff_eq!(w_line.y[0], FRAC_PI_2);
    }

    #[test]
    fn plane_names_round_trip() {
        for plane in PlaneKind::exhaustive() {
            assert_eq!(plane.name().parse::<PlaneKind>(), Ok(*plane));
        }
        assert!("s_plane".parse::<PlaneKind>().is_err());
    }
}

// SPDX: CC0-1.0

//! Riemann zeta over grids, plus the critical line and the first known
//! non-trivial zeros, all expressed in τ-space.

use crate::{linspace, Complex, Number, NAN};
use core::{
    f64::consts::{FRAC_PI_2, LN_2, PI, TAU},
    fmt,
};
use ndarray::{Array, Dimension};

/// Ordinates t of the first non-trivial zeros 1/2 + it. Fixed catalog.
pub const KNOWN_ZERO_ORDINATES: [Number; 15] = [
    14.134725, 21.022040, 25.010858, 30.424876, 32.935062, 37.586178, 40.918719, 43.327073,
    48.005151, 49.773832, 52.970321, 56.446248, 59.347044, 60.831779, 65.112544,
];

/// Re(s) on the critical line.
pub const CRITICAL_RE: Number = 0.5;

pub const CRITICAL_LINE_POINTS: usize = 1000;

/// Lower end of t for the critical line overlay.
pub const CRITICAL_T_MIN: Number = 0.1;

/// Inputs closer than this to 0 are not evaluated.
pub const NEAR_ORIGIN: Number = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZetaErrTyp {
    Pole,
    NearOrigin,
    NonFinite,
    Catalog { requested: usize, available: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZetaErr {
    pub typ: ZetaErrTyp,
    pub s: Option<Complex>,
}

impl ZetaErr {
    pub const fn at(typ: ZetaErrTyp, s: Complex) -> Self {
        Self { typ, s: Some(s) }
    }
}

impl fmt::Display for ZetaErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            ZetaErrTyp::Pole => write!(f, "zeta has a pole at s = 1"),
            ZetaErrTyp::NearOrigin => write!(f, "input is too close to the origin"),
            ZetaErrTyp::NonFinite => write!(f, "zeta is not finite here"),
            ZetaErrTyp::Catalog {
                requested,
                available,
            } => write!(
                f,
                "only {available} known zeros are catalogued, {requested} were requested"
            ),
        }?;
        if let Some(s) = self.s {
            write!(f, " (s = {s})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ZetaErr {}

/// A scalar zeta implementation. Failures are reported per call and never
/// poison later calls.
pub trait ZetaPrimitive {
    fn zeta(&self, s: Complex) -> Result<Complex, ZetaErr>;
}

impl<F> ZetaPrimitive for F
where
    F: Fn(Complex) -> Result<Complex, ZetaErr>,
{
    fn zeta(&self, s: Complex) -> Result<Complex, ZetaErr> {
        self(s)
    }
}

// B_2, B_4, ..., B_24
const BERNOULLI: [Number; 12] = [
    1.0 / 6.0,
    -1.0 / 30.0,
    1.0 / 42.0,
    -1.0 / 30.0,
    5.0 / 66.0,
    -691.0 / 2730.0,
    7.0 / 6.0,
    -3617.0 / 510.0,
    43867.0 / 798.0,
    -174611.0 / 330.0,
    854513.0 / 138.0,
    -236364091.0 / 2730.0,
];

/// Above this |Im w|, sin(w) is taken through its logarithm.
const SIN_DIRECT: Number = 20.0;

const LANCZOS_G: Number = 7.0;
const LANCZOS: [Number; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Euler–Maclaurin summation for Re(s) >= 0 and the functional equation
/// below that.
#[derive(Clone, Copy, Debug)]
pub struct EulerMaclaurin {
    pub min_terms: usize,
    pub max_terms: usize,
}

impl Default for EulerMaclaurin {
    fn default() -> Self {
        Self {
            min_terms: 10,
            max_terms: 50_000,
        }
    }
}

impl EulerMaclaurin {
    fn sum(&self, s: Complex) -> Complex {
        // the tail corrections need 2πN well above |s|
        let n = ((s.norm() / 2.0).ceil() as usize).clamp(self.min_terms, self.max_terms);
        let n_real = n as Number;

        let mut acc = Complex::new(0.0, 0.0);
        for k in 1..n {
            acc += (-s * (k as Number).ln()).exp();
        }

        let n_pow = (-s * n_real.ln()).exp(); // N^-s
        acc += n_pow * n_real / (s - 1.0) + n_pow * 0.5;

        let mut rising = s; // s(s+1)...(s+2k-2)
        let mut power = n_pow / n_real; // N^(-s-2k+1)
        let mut factorial = 2.0; // (2k)!
        for (j, b) in BERNOULLI.iter().enumerate() {
            let k = (j + 1) as Number;
            acc += rising * power * (b / factorial);
            rising *= (s + (2.0 * k - 1.0)) * (s + 2.0 * k);
            power /= n_real * n_real;
            factorial *= (2.0 * k + 1.0) * (2.0 * k + 2.0);
        }
        acc
    }

    /// ζ(s) = 2^s π^(s-1) sin(πs/2) Γ(1-s) ζ(1-s)
    fn reflect(&self, s: Complex) -> Complex {
        let one_minus = 1.0 - s;
        // Γ(1-s) underflows exactly where sin(πs/2) overflows
        let log_factor =
            s * LN_2 + (s - 1.0) * PI.ln() + ln_gamma(one_minus) + ln_sin(s * FRAC_PI_2);
        log_factor.exp() * self.sum(one_minus)
    }
}

impl ZetaPrimitive for EulerMaclaurin {
    fn zeta(&self, s: Complex) -> Result<Complex, ZetaErr> {
        if !s.is_finite() {
            return Err(ZetaErr::at(ZetaErrTyp::NonFinite, s));
        }
        if s == Complex::new(1.0, 0.0) {
            return Err(ZetaErr::at(ZetaErrTyp::Pole, s));
        }
        let val = if s.re < 0.0 {
            self.reflect(s)
        } else {
            self.sum(s)
        };
        if val.is_finite() {
            Ok(val)
        } else {
            Err(ZetaErr::at(ZetaErrTyp::NonFinite, s))
        }
    }
}

/// ln sin(w), up to a multiple of 2πi.
fn ln_sin(w: Complex) -> Complex {
    if w.im.abs() < SIN_DIRECT {
        return w.sin().ln();
    }
    // sin w = (i/2) e^(-iw) (1 - e^(2iw)) and its mirror for Im w < 0
    let i = Complex::i();
    if w.im > 0.0 {
        -i * w + Complex::new(-LN_2, FRAC_PI_2) + (1.0 - (2.0 * i * w).exp()).ln()
    } else {
        i * w + Complex::new(-LN_2, -FRAC_PI_2) + (1.0 - (-2.0 * i * w).exp()).ln()
    }
}

/// Lanczos approximation of ln Γ(z), for Re(z) >= 1/2.
fn ln_gamma(z: Complex) -> Complex {
    let z = z - 1.0;
    let mut x = Complex::new(LANCZOS[0], 0.0);
    for (i, c) in LANCZOS.iter().enumerate().skip(1) {
        x += *c / (z + i as Number);
    }
    let t = z + LANCZOS_G + 0.5;
    (z + 0.5) * t.ln() - t + x.ln() + 0.5 * TAU.ln()
}

#[derive(Clone, Debug, Default)]
pub struct ZetaEvaluator<P = EulerMaclaurin> {
    primitive: P,
}

impl<P: ZetaPrimitive> ZetaEvaluator<P> {
    pub const fn new(primitive: P) -> Self {
        Self { primitive }
    }

    pub fn evaluate(&self, s: Complex) -> Result<Complex, ZetaErr> {
        if !s.is_finite() {
            return Err(ZetaErr::at(ZetaErrTyp::NonFinite, s));
        }
        if s.norm() < NEAR_ORIGIN {
            return Err(ZetaErr::at(ZetaErrTyp::NearOrigin, s));
        }
        let val = self.primitive.zeta(s)?;
        if val.is_finite() {
            Ok(val)
        } else {
            Err(ZetaErr::at(ZetaErrTyp::NonFinite, s))
        }
    }

    /// Cell by cell. A failing cell becomes NaN on its own.
    pub fn evaluate_grid<D: Dimension>(&self, points: &Array<Complex, D>) -> Array<Complex, D> {
        let cells = points.map(|s| self.evaluate(*s));
        let failed = cells.iter().filter(|cell| cell.is_err()).count();
        if failed > 0 {
            log::debug!("zeta undefined at {failed} of {} cells", cells.len());
        }
        cells.mapv(|cell| cell.unwrap_or(NAN))
    }
}

/// s = 1/2 + it for t evenly spaced over [t_min, t_max], mapped to τ = 1/s.
pub fn critical_line(t_min: Number, t_max: Number, num_points: usize) -> Vec<Complex> {
    linspace(t_min, t_max, num_points)
        .into_iter()
        .map(|t| Complex::new(CRITICAL_RE, t).inv())
        .collect()
}

pub fn known_zero_ordinates(n: usize) -> Result<&'static [Number], ZetaErr> {
    KNOWN_ZERO_ORDINATES.get(..n).ok_or(ZetaErr {
        typ: ZetaErrTyp::Catalog {
            requested: n,
            available: KNOWN_ZERO_ORDINATES.len(),
        },
        s: None,
    })
}

/// The first `n` known zeros in τ-space.
pub fn known_zeros(n: usize) -> Result<Vec<Complex>, ZetaErr> {
    Ok(known_zero_ordinates(n)?
        .iter()
        .map(|t| Complex::new(CRITICAL_RE, *t).inv())
        .collect())
}

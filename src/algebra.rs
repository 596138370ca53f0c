// SPDX: CC0-1.0

//! Symbolic calculus over expression trees, just enough for function
//! analysis. Every operation is fallible.

use crate::{
    eval::{Builtin, Expr, Function, FunctionErr, Idents, OperatorTyp},
    stdlib, Complex, Number,
};
use core::fmt;
use std::sync::Arc;

/// Highest power expanded when reading an expression as a polynomial.
pub const MAX_DEGREE: usize = 64;

const MAX_ITERATIONS: usize = 500;
const CONVERGED: Number = 1e-14;
/// Roots closer than this are one root.
const ROOT_MERGE: Number = 1e-6;
/// Relative size below which a coefficient counts as zero in Euclid's
/// algorithm.
const GCD_TOL: Number = 1e-9;
/// Root components smaller than this are zero.
const ROOT_CLEAN: Number = 1e-8;
/// Agreement required between the last two samples of a limit.
const LIMIT_TOL: Number = 1e-6;
const LIMIT_DIVERGED: Number = 1e6;

#[derive(Debug)]
pub enum AlgebraErrTyp {
    Invalid(FunctionErr),
    NotDifferentiable(Builtin),
    NotPolynomial,
    NoConvergence,
    Undefined,
    NoLimit,
}

#[derive(Debug)]
pub struct AlgebraErr {
    pub typ: AlgebraErrTyp,
    pub expr: String,
}

impl AlgebraErr {
    fn new(typ: AlgebraErrTyp, expr: &Expr) -> Self {
        Self {
            typ,
            expr: expr.to_string(),
        }
    }
}

impl fmt::Display for AlgebraErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expr = &self.expr;
        match &self.typ {
            AlgebraErrTyp::Invalid(err) => write!(f, "{err}"),
            AlgebraErrTyp::NotDifferentiable(fun) => write!(
                f,
                "'{}' has no complex derivative (in '{expr}')",
                fun.name()
            ),
            AlgebraErrTyp::NotPolynomial => write!(f, "'{expr}' is not a polynomial"),
            AlgebraErrTyp::NoConvergence => write!(f, "root finding did not converge for '{expr}'"),
            AlgebraErrTyp::Undefined => write!(f, "'{expr}' is undefined here"),
            AlgebraErrTyp::NoLimit => write!(f, "no limit found for '{expr}'"),
        }
    }
}

impl std::error::Error for AlgebraErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.typ {
            AlgebraErrTyp::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LimitPoint {
    At(Complex),
    Infinity,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LimitValue {
    Finite(Complex),
    Infinite,
}

impl fmt::Display for LimitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(val) => f.write_str(&format_value(*val)),
            Self::Infinite => f.write_str("∞"),
        }
    }
}

/// The calculus the analysis report is built on.
pub trait Algebra {
    fn parse(&self, text: &str) -> Result<Expr, AlgebraErr>;

    fn differentiate(&self, expr: &Expr) -> Result<Expr, AlgebraErr>;

    /// Distinct roots of `expr`, which must be a polynomial.
    fn solve_roots(&self, expr: &Expr) -> Result<Vec<Complex>, AlgebraErr>;

    /// Taylor polynomial about 0 with terms z^0 to z^(order - 1).
    fn series_expand(&self, expr: &Expr, order: usize) -> Result<Expr, AlgebraErr>;

    fn substitute(&self, expr: &Expr, at: Complex) -> Result<Complex, AlgebraErr>;

    fn limit(&self, expr: &Expr, point: LimitPoint) -> Result<LimitValue, AlgebraErr>;
}

/// `Algebra` over the crate's own expression trees.
#[derive(Clone, Debug)]
pub struct TreeAlgebra {
    idents: Idents,
}

impl Default for TreeAlgebra {
    fn default() -> Self {
        Self::new(stdlib::standard_idents())
    }
}

impl TreeAlgebra {
    pub fn new(idents: Idents) -> Self {
        Self { idents }
    }

    fn derive(expr: &Expr) -> Result<Expr, AlgebraErr> {
        Ok(match expr {
            Expr::Literal(_) => Expr::real(0.0),
            Expr::Variable => Expr::real(1.0),
            Expr::Unary(_, a) => Expr::neg(Self::derive(a)?),
            Expr::Binary(op, l, r) => {
                let (l, r) = (l.as_ref().clone(), r.as_ref().clone());
                match op {
                    OperatorTyp::Add => Expr::add(Self::derive(&l)?, Self::derive(&r)?),
                    OperatorTyp::Sub => Expr::sub(Self::derive(&l)?, Self::derive(&r)?),
                    OperatorTyp::Mul => {
                        let (dl, dr) = (Self::derive(&l)?, Self::derive(&r)?);
                        Expr::add(Expr::mul(dl, r), Expr::mul(l, dr))
                    }
                    OperatorTyp::Div => {
                        let (dl, dr) = (Self::derive(&l)?, Self::derive(&r)?);
                        Expr::div(
                            Expr::sub(Expr::mul(dl, r.clone()), Expr::mul(l, dr)),
                            Expr::pow(r, Expr::real(2.0)),
                        )
                    }
                    OperatorTyp::Pow => Self::derive_pow(l, r)?,
                    OperatorTyp::Neg => return Err(AlgebraErr::new(AlgebraErrTyp::Undefined, expr)),
                }
            }
            Expr::Call(fun, a) => {
                let inner = Self::derive(a)?;
                let a = a.as_ref().clone();
                let outer = match fun {
                    Builtin::Sin => Expr::call(Builtin::Cos, a),
                    Builtin::Cos => Expr::neg(Expr::call(Builtin::Sin, a)),
                    Builtin::Tan => Expr::div(
                        Expr::real(1.0),
                        Expr::pow(Expr::call(Builtin::Cos, a), Expr::real(2.0)),
                    ),
                    Builtin::Log => Expr::div(Expr::real(1.0), a),
                    Builtin::Exp => Expr::call(Builtin::Exp, a),
                    Builtin::Sqrt => Expr::div(
                        Expr::real(1.0),
                        Expr::mul(Expr::real(2.0), Expr::call(Builtin::Sqrt, a)),
                    ),
                    Builtin::Abs => {
                        return Err(AlgebraErr::new(AlgebraErrTyp::NotDifferentiable(*fun), expr))
                    }
                };
                Expr::mul(outer, inner)
            }
        })
    }

    fn derive_pow(base: Expr, exp: Expr) -> Result<Expr, AlgebraErr> {
        let d_base = Self::derive(&base)?;
        if !exp.contains_var() {
            // n * f^(n-1) * f'
            let lowered = Expr::sub(exp.clone(), Expr::real(1.0));
            return Ok(Expr::mul(
                Expr::mul(exp, Expr::pow(base, lowered)),
                d_base,
            ));
        }
        let d_exp = Self::derive(&exp)?;
        let log_base = Expr::call(Builtin::Log, base.clone());
        if !base.contains_var() {
            // a^g * log(a) * g'
            return Ok(Expr::mul(
                Expr::mul(Expr::pow(base, exp), log_base),
                d_exp,
            ));
        }
        // f^g * (g' log f + g f' / f)
        let rate = Expr::add(
            Expr::mul(d_exp, log_base),
            Expr::div(Expr::mul(exp.clone(), d_base), base.clone()),
        );
        Ok(Expr::mul(Expr::pow(base, exp), rate))
    }
}

impl Algebra for TreeAlgebra {
    fn parse(&self, text: &str) -> Result<Expr, AlgebraErr> {
        let fun = Function::compile_with(Arc::new(text.to_string()), &self.idents).map_err(
            |err| AlgebraErr {
                typ: AlgebraErrTyp::Invalid(err),
                expr: text.to_string(),
            },
        )?;
        Ok(fun.expr().clone())
    }

    fn differentiate(&self, expr: &Expr) -> Result<Expr, AlgebraErr> {
        Self::derive(expr)
    }

    fn solve_roots(&self, expr: &Expr) -> Result<Vec<Complex>, AlgebraErr> {
        let coeffs = coefficients(expr)
            .ok_or_else(|| AlgebraErr::new(AlgebraErrTyp::NotPolynomial, expr))?;
        let roots = match coeffs.len() {
            // constant, nothing to solve
            0 | 1 => Vec::new(),
            2 => vec![-coeffs[0] / coeffs[1]],
            _ => match square_free(&coeffs) {
                // a single distinct root
                simple if simple.len() == 2 => vec![-simple[0] / simple[1]],
                simple => durand_kerner(&simple)
                    .ok_or_else(|| AlgebraErr::new(AlgebraErrTyp::NoConvergence, expr))?,
            },
        };
        Ok(merge_roots(roots))
    }

    fn series_expand(&self, expr: &Expr, order: usize) -> Result<Expr, AlgebraErr> {
        let origin = Complex::new(0.0, 0.0);
        let mut derivative = expr.clone();
        let mut factorial = 1.0;
        let mut series: Option<Expr> = None;
        for k in 0..order {
            if k > 0 {
                derivative = self.differentiate(&derivative)?;
                factorial *= k as Number;
            }
            let coeff = tidy(self.substitute(&derivative, origin)? / factorial);
            if coeff == origin {
                continue;
            }
            let monomial = Expr::pow(Expr::Variable, Expr::real(k as Number));
            series = Some(match series {
                None => Expr::mul(Expr::lit(coeff), monomial),
                Some(acc) if coeff.im == 0.0 && coeff.re < 0.0 => {
                    Expr::sub(acc, Expr::mul(Expr::lit(-coeff), monomial))
                }
                Some(acc) => Expr::add(acc, Expr::mul(Expr::lit(coeff), monomial)),
            });
        }
        Ok(series.unwrap_or(Expr::real(0.0)))
    }

    fn substitute(&self, expr: &Expr, at: Complex) -> Result<Complex, AlgebraErr> {
        let val = expr.eval_at(at);
        if val.is_finite() {
            Ok(val)
        } else {
            Err(AlgebraErr::new(AlgebraErrTyp::Undefined, expr))
        }
    }

    /// Numerical limit along the positive real direction.
    fn limit(&self, expr: &Expr, point: LimitPoint) -> Result<LimitValue, AlgebraErr> {
        let samples: Vec<Complex> = [3, 5, 7, 9]
            .iter()
            .map(|k| {
                let step = (10.0 as Number).powi(*k);
                let at = match point {
                    LimitPoint::At(a) => a + step.recip(),
                    LimitPoint::Infinity => Complex::new(step, 0.0),
                };
                expr.eval_at(at)
            })
            .collect();

        let (prev, last) = (samples[samples.len() - 2], samples[samples.len() - 1]);
        if prev.is_finite() && last.is_finite() {
            if (last - prev).norm() <= LIMIT_TOL * last.norm().max(1.0) {
                let round = |x: Number| (x / LIMIT_TOL).round() * LIMIT_TOL;
                return Ok(LimitValue::Finite(tidy(Complex::new(
                    round(last.re),
                    round(last.im),
                ))));
            }
            let growing = samples.windows(2).all(|w| w[1].norm() > w[0].norm());
            if growing && last.norm() > LIMIT_DIVERGED {
                return Ok(LimitValue::Infinite);
            }
        }
        Err(AlgebraErr::new(AlgebraErrTyp::NoLimit, expr))
    }
}

/// Ascending coefficients of a polynomial expression, trailing zeros
/// removed. `None` when the expression is not a polynomial in z.
pub fn coefficients(expr: &Expr) -> Option<Vec<Complex>> {
    let mut coeffs = poly(expr)?;
    while coeffs.last() == Some(&Complex::new(0.0, 0.0)) {
        coeffs.pop();
    }
    Some(coeffs)
}

fn poly(expr: &Expr) -> Option<Vec<Complex>> {
    match expr {
        Expr::Literal(val) => Some(vec![*val]),
        Expr::Variable => Some(vec![Complex::new(0.0, 0.0), Complex::new(1.0, 0.0)]),
        Expr::Unary(_, a) => Some(poly(a)?.into_iter().map(|c| -c).collect()),
        Expr::Binary(op, l, r) => match op {
            OperatorTyp::Add => Some(poly_add(&poly(l)?, &poly(r)?, 1.0)),
            OperatorTyp::Sub => Some(poly_add(&poly(l)?, &poly(r)?, -1.0)),
            OperatorTyp::Mul => Some(poly_mul(&poly(l)?, &poly(r)?)),
            OperatorTyp::Div => {
                let divisor = r.as_literal().filter(|d| *d != Complex::new(0.0, 0.0))?;
                Some(poly(l)?.into_iter().map(|c| c / divisor).collect())
            }
            OperatorTyp::Pow => {
                let exp = r.as_literal()?;
                if exp.im != 0.0
                    || exp.re.fract() != 0.0
                    || !(0.0..=MAX_DEGREE as Number).contains(&exp.re)
                {
                    return None;
                }
                let base = poly(l)?;
                let mut acc = vec![Complex::new(1.0, 0.0)];
                for _ in 0..exp.re as usize {
                    acc = poly_mul(&acc, &base);
                }
                Some(acc)
            }
            OperatorTyp::Neg => None,
        },
        Expr::Call(..) if !expr.contains_var() => Some(vec![expr.eval_at(Complex::new(0.0, 0.0))]),
        Expr::Call(..) => None,
    }
}

fn poly_add(a: &[Complex], b: &[Complex], sign: Number) -> Vec<Complex> {
    let zero = Complex::new(0.0, 0.0);
    (0..a.len().max(b.len()))
        .map(|i| a.get(i).copied().unwrap_or(zero) + b.get(i).copied().unwrap_or(zero) * sign)
        .collect()
}

fn poly_mul(a: &[Complex], b: &[Complex]) -> Vec<Complex> {
    let mut out = vec![Complex::new(0.0, 0.0); a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

fn horner(coeffs: &[Complex], z: Complex) -> Complex {
    coeffs
        .iter()
        .rev()
        .fold(Complex::new(0.0, 0.0), |acc, c| acc * z + c)
}

fn max_norm(p: &[Complex]) -> Number {
    p.iter().map(|c| c.norm()).fold(0.0, Number::max)
}

/// Drops leading coefficients that are zero relative to `scale`.
fn trim(mut p: Vec<Complex>, scale: Number) -> Vec<Complex> {
    while p.len() > 1 && p.last().map_or(false, |c| c.norm() <= GCD_TOL * scale) {
        p.pop();
    }
    p
}

/// Long division, returning (quotient, remainder). `b` must have a nonzero
/// leading coefficient.
fn poly_divmod(a: &[Complex], b: &[Complex]) -> (Vec<Complex>, Vec<Complex>) {
    let zero = Complex::new(0.0, 0.0);
    let db = b.len() - 1;
    let mut rem = a.to_vec();
    let mut quot = vec![zero; a.len().saturating_sub(db).max(1)];
    while rem.len() > db {
        let shift = rem.len() - 1 - db;
        let q = rem[rem.len() - 1] / b[db];
        quot[shift] = q;
        for (i, c) in b.iter().enumerate() {
            rem[shift + i] -= q * c;
        }
        rem.pop();
    }
    if rem.is_empty() {
        rem.push(zero);
    }
    (quot, rem)
}

fn poly_gcd(mut a: Vec<Complex>, mut b: Vec<Complex>) -> Vec<Complex> {
    loop {
        let scale = max_norm(&a);
        if b.iter().all(|c| c.norm() <= GCD_TOL * scale) {
            return a;
        }
        let (_, rem) = poly_divmod(&a, &b);
        let rem = trim(rem, scale);
        if rem.iter().all(|c| c.norm() <= GCD_TOL * scale) {
            return b;
        }
        a = b;
        b = rem;
    }
}

/// p / gcd(p, p'): the same roots, each with multiplicity one.
fn square_free(coeffs: &[Complex]) -> Vec<Complex> {
    let derivative: Vec<Complex> = coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, c)| c * k as Number)
        .collect();
    let common = poly_gcd(coeffs.to_vec(), derivative);
    if common.len() <= 1 {
        return coeffs.to_vec();
    }
    poly_divmod(coeffs, &common).0
}

/// All roots at once by Weierstrass iteration. Needs degree >= 1.
fn durand_kerner(coeffs: &[Complex]) -> Option<Vec<Complex>> {
    let degree = coeffs.len() - 1;
    let lead = coeffs[degree];
    let monic: Vec<Complex> = coeffs.iter().map(|c| c / lead).collect();

    let seed = Complex::new(0.4, 0.9);
    let mut roots: Vec<Complex> = (0..degree).map(|k| seed.powi(k as i32)).collect();

    for _ in 0..MAX_ITERATIONS {
        let mut largest: Number = 0.0;
        for i in 0..degree {
            let ri = roots[i];
            let denom = roots
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .fold(Complex::new(1.0, 0.0), |acc, (_, rj)| acc * (ri - rj));
            let step = horner(&monic, ri) / denom;
            roots[i] = ri - step;
            largest = largest.max(step.norm());
        }
        if !largest.is_finite() {
            return None;
        }
        let scale = roots.iter().map(|r| r.norm()).fold(1.0, Number::max);
        if largest < CONVERGED * scale {
            break;
        }
    }
    roots.iter().all(|r| r.is_finite()).then_some(roots)
}

/// Averages clusters of nearly equal roots, which is how repeated roots
/// come out of the iteration.
fn merge_roots(roots: Vec<Complex>) -> Vec<Complex> {
    let mut clusters: Vec<(Complex, usize)> = Vec::new();
    for root in roots {
        match clusters
            .iter_mut()
            .find(|(sum, count)| (*sum / *count as Number - root).norm() < ROOT_MERGE)
        {
            Some((sum, count)) => {
                *sum += root;
                *count += 1;
            }
            None => clusters.push((root, 1)),
        }
    }
    let clean = |x: Number| if x.abs() < ROOT_CLEAN { 0.0 } else { x };
    clusters
        .into_iter()
        .map(|(sum, count)| {
            let root = sum / count as Number;
            tidy(Complex::new(clean(root.re), clean(root.im)))
        })
        .collect()
}

/// Rounds to 12 significant digits.
fn tidy_real(x: Number) -> Number {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    if x.abs() < 1e-12 {
        return 0.0;
    }
    let digits = 12 - x.abs().log10().ceil() as i32;
    let scale = (10.0 as Number).powi(digits);
    (x * scale).round() / scale
}

pub fn tidy(z: Complex) -> Complex {
    Complex::new(tidy_real(z.re), tidy_real(z.im))
}

/// Human readable value: `2`, `-0.5i`, `1+2i`. Non-finite values read as
/// a singularity.
pub fn format_value(z: Complex) -> String {
    if !z.is_finite() {
        return "Undefined (singularity)".to_string();
    }
    let Complex { re, im } = tidy(z);
    // normalize -0
    let (re, im) = (re + 0.0, im + 0.0);
    match (re == 0.0, im == 0.0) {
        (_, true) => format!("{re}"),
        (true, false) => format!("{im}i"),
        (false, false) if im < 0.0 => format!("{re}-{}i", -im),
        (false, false) => format!("{re}+{im}i"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn algebra() -> TreeAlgebra {
        TreeAlgebra::default()
    }

    fn derivative(text: &str) -> Expr {
        let a = algebra();
        a.differentiate(&a.parse(text).unwrap()).unwrap()
    }

    fn sorted(mut roots: Vec<Complex>) -> Vec<Complex> {
        roots.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
        roots
    }

    #[test]
    fn differentiates_polynomials() {
        assert_eq!(derivative("z^3 - 3*z").to_string(), "3*z^2 - 3");
        assert_eq!(derivative("5").to_string(), "0");
        assert_eq!(derivative("2*z").to_string(), "2");
    }

    #[test]
    fn differentiates_calls() {
        let at = Complex::new(0.3, -0.2);
        let cases: [(&str, fn(Complex) -> Complex); 6] = [
            ("sin(z)", |z| z.cos()),
            ("cos(2*z)", |z| -2.0 * (2.0 * z).sin()),
            ("tan(z)", |z| 1.0 / (z.cos() * z.cos())),
            ("log(z)", |z| 1.0 / z),
            ("exp(z^2)", |z| 2.0 * z * (z * z).exp()),
            ("sqrt(z)", |z| 0.5 / z.sqrt()),
        ];
        for (text, want) in cases {
            let got = derivative(text).eval_at(at);
            let want = want(at);
            assert_abs_diff_eq!(got.re, want.re, epsilon = 1e-12);
            assert_abs_diff_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn differentiates_quotients_and_powers() {
        let at = Complex::new(1.5, 0.5);
        let got = derivative("1/z").eval_at(at);
        let want = -1.0 / (at * at);
        assert_abs_diff_eq!(got.re, want.re, epsilon = 1e-12);
        assert_abs_diff_eq!(got.im, want.im, epsilon = 1e-12);

        // z^z
        let got = derivative("z^z").eval_at(at);
        let want = at.powc(at) * (at.ln() + 1.0);
        assert_abs_diff_eq!(got.re, want.re, epsilon = 1e-10);
        assert_abs_diff_eq!(got.im, want.im, epsilon = 1e-10);

        // 2^z
        let got = derivative("2^z").eval_at(at);
        let want = Complex::new(2.0, 0.0).powc(at) * (2.0 as Number).ln();
        assert_abs_diff_eq!(got.re, want.re, epsilon = 1e-10);
        assert_abs_diff_eq!(got.im, want.im, epsilon = 1e-10);
    }

    #[test]
    fn abs_is_not_differentiable() {
        let a = algebra();
        let err = a.differentiate(&a.parse("abs(z)").unwrap()).unwrap_err();
        assert!(matches!(
            err.typ,
            AlgebraErrTyp::NotDifferentiable(Builtin::Abs)
        ));
    }

    #[test]
    fn reads_coefficients() {
        let a = algebra();
        let coeffs = coefficients(&a.parse("(z + 1)^2 - z/2").unwrap()).unwrap();
        assert_eq!(
            coeffs,
            [
                Complex::new(1.0, 0.0),
                Complex::new(1.5, 0.0),
                Complex::new(1.0, 0.0)
            ]
        );
        assert!(coefficients(&a.parse("1/z").unwrap()).is_none());
        assert!(coefficients(&a.parse("sin(z)").unwrap()).is_none());
        assert!(coefficients(&a.parse("z^0.5").unwrap()).is_none());
    }

    #[test]
    fn solves_roots() {
        let a = algebra();
        let roots = sorted(a.solve_roots(&a.parse("3*z^2 - 3").unwrap()).unwrap());
        assert_eq!(roots, [Complex::new(-1.0, 0.0), Complex::new(1.0, 0.0)]);

        let roots = sorted(a.solve_roots(&a.parse("z^2 + 1").unwrap()).unwrap());
        assert_eq!(roots, [Complex::new(0.0, -1.0), Complex::new(0.0, 1.0)]);

        let roots = sorted(a.solve_roots(&a.parse("z^3 - 1").unwrap()).unwrap());
        assert_eq!(roots.len(), 3);
        assert_abs_diff_eq!(roots[0].re, -0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(roots[0].im, -(0.75 as Number).sqrt(), epsilon = 1e-9);
        assert_eq!(roots[2], Complex::new(1.0, 0.0));
    }

    #[test]
    fn merges_repeated_roots() {
        let a = algebra();
        assert_eq!(
            a.solve_roots(&a.parse("4*z^3").unwrap()).unwrap(),
            [Complex::new(0.0, 0.0)]
        );
        assert_eq!(
            a.solve_roots(&a.parse("z^2 + 2*z + 1").unwrap()).unwrap(),
            [Complex::new(-1.0, 0.0)]
        );
        assert!(a.solve_roots(&a.parse("7").unwrap()).unwrap().is_empty());

        // high multiplicity resolves to a single root
        assert_eq!(
            a.solve_roots(&a.parse("(z - 1)^6").unwrap()).unwrap(),
            [Complex::new(1.0, 0.0)]
        );
        let mut roots = a
            .solve_roots(&a.parse("(z - 2)^3*(5*z + 2)").unwrap())
            .unwrap();
        roots.sort_by(|x, y| x.re.total_cmp(&y.re));
        assert_eq!(roots, [Complex::new(-0.4, 0.0), Complex::new(2.0, 0.0)]);
        assert!(a.solve_roots(&a.parse("exp(z)").unwrap()).is_err());
    }

    #[test]
    fn expands_series() {
        let a = algebra();
        let series = |text| a.series_expand(&a.parse(text).unwrap(), 5);
        assert_eq!(
            series("exp(z)").unwrap().to_string(),
            "1 + z + 0.5*z^2 + 0.166666666667*z^3 + 0.0416666666667*z^4"
        );
        assert_eq!(series("sin(z)").unwrap().to_string(), "z - 0.166666666667*z^3");
        assert_eq!(series("z^7").unwrap().to_string(), "0");
        assert!(series("1/z").is_err());
        assert!(series("log(z)").is_err());
    }

    #[test]
    fn substitutes() {
        let a = algebra();
        let expr = a.parse("z^2 + 1").unwrap();
        assert_eq!(
            a.substitute(&expr, Complex::new(0.0, 1.0)).unwrap(),
            Complex::new(0.0, 0.0)
        );
        let err = a
            .substitute(&a.parse("1/z").unwrap(), Complex::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err.typ, AlgebraErrTyp::Undefined));
    }

    #[test]
    fn takes_limits() {
        let a = algebra();
        let limit = |text, point| a.limit(&a.parse(text).unwrap(), point);
        assert_eq!(
            limit("1/z", LimitPoint::Infinity).unwrap(),
            LimitValue::Finite(Complex::new(0.0, 0.0))
        );
        assert_eq!(
            limit("(z + 1)/z", LimitPoint::Infinity).unwrap(),
            LimitValue::Finite(Complex::new(1.0, 0.0))
        );
        assert_eq!(
            limit("z^2/(z + 1)", LimitPoint::Infinity).unwrap(),
            LimitValue::Infinite
        );
        assert_eq!(
            limit("sin(z)/z", LimitPoint::At(Complex::new(0.0, 0.0))).unwrap(),
            LimitValue::Finite(Complex::new(1.0, 0.0))
        );
        assert!(limit("sin(z)", LimitPoint::Infinity).is_err());
    }

    #[test]
    fn formats_values() {
        assert_eq!(format_value(Complex::new(-2.0, 0.0)), "-2");
        assert_eq!(format_value(Complex::new(0.0, -0.5)), "-0.5i");
        assert_eq!(format_value(Complex::new(1.0, 2.0)), "1+2i");
        assert_eq!(format_value(Complex::new(1.0, -2.0)), "1-2i");
        assert_eq!(format_value(Complex::new(0.1 + 0.2, 0.0)), "0.3");
        assert_eq!(format_value(Complex::new(Number::INFINITY, 0.0)), "Undefined (singularity)");
        assert_eq!(LimitValue::Infinite.to_string(), "∞");
    }

    #[test]
    fn rejects_foreign_text() {
        let err = algebra().parse("z**2").unwrap_err();
        assert!(matches!(err.typ, AlgebraErrTyp::Invalid(_)));
        assert_eq!(err.expr, "z**2");
    }
}

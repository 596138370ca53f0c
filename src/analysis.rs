// SPDX: CC0-1.0

//! Best-effort descriptive analysis of an expression. Sub-steps fail on
//! their own and leave their part of the report empty.

use crate::{
    algebra::{format_value, Algebra, AlgebraErr, LimitPoint},
    eval::{Expr, OperatorTyp},
    lex::{Lexer, TokTyp},
    zeta::{self, CRITICAL_RE},
    Complex, Number,
};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};

/// Terms z^0 to z^4.
pub const SERIES_ORDER: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PointKind {
    Minimum,
    Maximum,
    #[serde(rename = "Saddle point or inflection")]
    Saddle,
    Extremum,
    Unknown,
}

impl PointKind {
    /// Classified by the sign of Re f''(z).
    pub fn classify(curvature: Option<Complex>) -> Self {
        match curvature {
            Some(c) if c.re > 0.0 => Self::Minimum,
            Some(c) if c.re < 0.0 => Self::Maximum,
            Some(c) if c.re == 0.0 => Self::Saddle,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CriticalPoint {
    pub z_real: Number,
    pub z_imag: Number,
    pub tau_real: Number,
    pub tau_imag: Number,
    #[serde(rename = "type")]
    pub kind: PointKind,
    pub function_value: String,
}

impl CriticalPoint {
    /// `None` at z = 0, which has no τ.
    pub fn new(z: Complex, kind: PointKind, function_value: String) -> Option<Self> {
        if z == Complex::new(0.0, 0.0) {
            return None;
        }
        let tau = z.inv();
        Some(Self {
            z_real: z.re,
            z_imag: z.im,
            tau_real: tau.re,
            tau_imag: tau.im,
            kind,
            function_value,
        })
    }
}

/// Textual heuristics, not proofs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DomainProperties {
    pub description: String,
    pub singularities: String,
    pub branch_points: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_expansion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub laurent_expansion: Option<String>,
    pub heuristic: bool,
}

impl DomainProperties {
    fn failed() -> Self {
        Self {
            description: "Analysis failed".to_string(),
            singularities: "Unknown".to_string(),
            branch_points: "Unknown".to_string(),
            domain: None,
            growth_rate: None,
            series_expansion: None,
            laurent_expansion: None,
            heuristic: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DifferentialEquations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ZetaFacts {
    pub riemann_hypothesis: &'static str,
    pub prime_number_connection: &'static str,
    pub analytic_continuation: &'static str,
    pub reflection_formula: &'static str,
    pub number_theory: &'static str,
    pub trivial_zeros: &'static str,
    pub first_few_zeros: Vec<String>,
}

pub type SpecialValues = BTreeMap<&'static str, String>;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub critical_points: Vec<CriticalPoint>,
    pub domain_properties: DomainProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_values: Option<SpecialValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential_equations: Option<DifferentialEquations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub important_facts: Option<ZetaFacts>,
}

impl AnalysisReport {
    pub fn failed(err: &AlgebraErr) -> Self {
        Self {
            error: Some(format!("Analysis failed: {err}")),
            critical_points: Vec::new(),
            domain_properties: DomainProperties::failed(),
            special_values: None,
            differential_equations: None,
            important_facts: None,
        }
    }
}

pub fn analyze<A: Algebra + ?Sized>(algebra: &A, text: &str) -> AnalysisReport {
    let expr = match algebra.parse(text) {
        Ok(expr) => expr,
        Err(err) => {
            log::debug!("analysis of '{text}' failed: {err}");
            return AnalysisReport::failed(&err);
        }
    };

    let critical_points = critical_points(algebra, &expr).unwrap_or_else(|err| {
        log::debug!("no critical points for '{text}': {err}");
        Vec::new()
    });

    AnalysisReport {
        error: None,
        critical_points,
        domain_properties: domain_properties(algebra, &expr, text),
        special_values: Some(special_values(algebra, &expr, text)),
        differential_equations: Some(differential_equations(text)),
        important_facts: None,
    }
}

/// Roots of f', classified by f''.
pub fn critical_points<A: Algebra + ?Sized>(
    algebra: &A,
    expr: &Expr,
) -> Result<Vec<CriticalPoint>, AlgebraErr> {
    let first = algebra.differentiate(expr)?;
    let second = algebra.differentiate(&first);
    let roots = algebra.solve_roots(&first)?;

    Ok(roots
        .into_iter()
        .filter_map(|z| {
            let curvature = second
                .as_ref()
                .ok()
                .and_then(|second| algebra.substitute(second, z).ok());
            let value = algebra
                .substitute(expr, z)
                .map(format_value)
                .unwrap_or_else(|_| format_value(crate::NAN));
            CriticalPoint::new(z, PointKind::classify(curvature), value)
        })
        .collect())
}

/// Largest integer power applied directly to the variable.
fn literal_degree(text: &str) -> u32 {
    let src = Arc::new(text.to_string());
    let toks: Vec<_> = Lexer::new(&src).map_while(Result::ok).collect();
    toks.windows(3)
        .filter(|w| {
            w[0].typ == TokTyp::Ident
                && w[0].loc.get() == crate::stdlib::VAR
                && w[1].typ == TokTyp::Op(OperatorTyp::Pow)
                && w[2].typ == TokTyp::Number
        })
        .filter_map(|w| w[2].loc.get().parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

fn growth_rate(text: &str) -> String {
    let transcendental = ["sin", "cos", "tan", "exp", "log"];
    if transcendental.iter().all(|f| !text.contains(f)) {
        match literal_degree(text) {
            0 => "Bounded or sublinear growth".to_string(),
            d => format!("O(|z|^{d}) as |z| → ∞"),
        }
    } else if text.contains("exp") {
        "Exponential growth".to_string()
    } else {
        "Undetermined".to_string()
    }
}

pub fn domain_properties<A: Algebra + ?Sized>(
    algebra: &A,
    expr: &Expr,
    text: &str,
) -> DomainProperties {
    let mut props = DomainProperties {
        description: "Complex analytic function".to_string(),
        singularities: "None detected".to_string(),
        branch_points: "None detected".to_string(),
        domain: Some("Entire complex plane".to_string()),
        growth_rate: Some(growth_rate(text)),
        series_expansion: None,
        laurent_expansion: None,
        heuristic: true,
    };

    if text.contains('/') {
        props.description = "Meromorphic function with possible poles".to_string();
        props.singularities = "Potential poles where denominator = 0".to_string();
        props.domain = Some("Complex plane excluding singularities".to_string());
    }
    if text.contains("log") {
        props.description = "Function with logarithmic branch cut".to_string();
        props.branch_points = "At z = 0 extending to -∞".to_string();
        props.domain = Some("Complex plane excluding branch cut".to_string());
    } else if text.contains("sqrt") {
        props.description = "Function with square root branch cut".to_string();
        props.branch_points = "Present (specific points not calculated)".to_string();
        props.domain = Some("Complex plane excluding branch cut".to_string());
    }

    props.series_expansion = Some(match algebra.series_expand(expr, SERIES_ORDER) {
        Ok(series) => series.to_string(),
        Err(err) => {
            log::debug!("no series for '{text}': {err}");
            "Could not compute Taylor series".to_string()
        }
    });
    props
}

/// Whatever follows the first '/' mentions the variable.
fn divides_by_var(text: &str) -> bool {
    text.split_once('/')
        .map(|(_, denom)| denom.contains(crate::stdlib::VAR))
        .unwrap_or(false)
}

pub fn special_values<A: Algebra + ?Sized>(
    algebra: &A,
    expr: &Expr,
    text: &str,
) -> SpecialValues {
    let at = |z: Complex| {
        algebra
            .substitute(expr, z)
            .map(format_value)
            .unwrap_or_else(|_| format_value(crate::NAN))
    };

    let mut values = SpecialValues::new();
    values.insert(
        "at_zero",
        if divides_by_var(text) {
            format_value(crate::NAN)
        } else {
            at(Complex::new(0.0, 0.0))
        },
    );
    values.insert("at_one", at(Complex::new(1.0, 0.0)));
    values.insert("at_i", at(Complex::new(0.0, 1.0)));

    if text.contains('/') {
        let limit = match algebra.limit(expr, LimitPoint::Infinity) {
            Ok(limit) => limit.to_string(),
            Err(err) => {
                log::debug!("no limit at infinity for '{text}': {err}");
                "Could not compute".to_string()
            }
        };
        values.insert("limit_at_infinity", limit);
    }
    values
}

pub fn differential_equations(text: &str) -> DifferentialEquations {
    let note = if text.contains("sin") {
        Some("Function may satisfy y'' + y = 0 (harmonic oscillator equation)")
    } else if text.contains("exp") {
        Some("Function may satisfy y' = y (exponential growth equation)")
    } else if text.contains("tan") {
        Some("Function may satisfy a nonlinear first-order differential equation")
    } else {
        None
    };
    DifferentialEquations {
        note: note.map(str::to_string),
    }
}

/// Fixed description of ζ; nothing here is computed from a grid.
pub fn zeta_report() -> AnalysisReport {
    let extremum = CriticalPoint {
        z_real: -1.0,
        z_imag: 0.0,
        tau_real: -1.0,
        tau_imag: 0.0,
        kind: PointKind::Extremum,
        function_value: "-1/12".to_string(),
    };

    let domain_properties = DomainProperties {
        description: "Meromorphic function with analytic continuation".to_string(),
        singularities: "Simple pole at s = 1".to_string(),
        branch_points: "None".to_string(),
        domain: Some("Entire complex plane except s = 1".to_string()),
        growth_rate: Some("Various rates in different regions".to_string()),
        series_expansion: Some(
            "ζ(s) = 1/(s-1) + Σ (-1)^n γ_n/n! · (s-1)^n for s near 1".to_string(),
        ),
        laurent_expansion: Some("1/(s-1) + γ + O(s-1)".to_string()),
        heuristic: false,
    };

    let special_values = SpecialValues::from([
        ("at_zero", "-1/2".to_string()),
        ("at_two", "π²/6 ≈ 1.645".to_string()),
        ("at_four", "π⁴/90 ≈ 1.082".to_string()),
        ("at_negative_even", "0 (trivial zeros)".to_string()),
        (
            "functional_equation",
            "ζ(s) = 2^s · π^(s-1) · sin(πs/2) · Γ(1-s) · ζ(1-s)".to_string(),
        ),
        (
            "critical_line",
            "Re(s) = 1/2 is where all non-trivial zeros are conjectured to lie (Riemann Hypothesis)"
                .to_string(),
        ),
    ]);

    let first_few_zeros = zeta::KNOWN_ZERO_ORDINATES
        .iter()
        .take(5)
        .map(|t| format!("{CRITICAL_RE} + {t:.4}i"))
        .collect();

    AnalysisReport {
        error: None,
        critical_points: vec![extremum],
        domain_properties,
        special_values: Some(special_values),
        differential_equations: None,
        important_facts: Some(ZetaFacts {
            riemann_hypothesis: "All non-trivial zeros lie on the critical line Re(s) = 1/2",
            prime_number_connection: "Euler product formula: ζ(s) = ∏_p (1 - p^(-s))^(-1)",
            analytic_continuation:
                "Originally defined for Re(s) > 1, but can be extended to the entire complex plane",
            reflection_formula: "ζ(1-s) = 2^(1-s) · π^(-s) · cos(πs/2) · Γ(s) · ζ(s)",
            number_theory:
                "Central to the distribution of prime numbers through the Prime Number Theorem",
            trivial_zeros: "At negative even integers: -2, -4, -6, ...",
            first_few_zeros,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{AlgebraErrTyp, LimitValue, TreeAlgebra};

    fn report(text: &str) -> AnalysisReport {
        analyze(&TreeAlgebra::default(), text)
    }

    #[test]
    fn classifies_cubic() {
        let r = report("z^3 - 3*z");
        assert!(r.error.is_none());
        let mut points = r.critical_points;
        points.sort_by(|a, b| a.z_real.total_cmp(&b.z_real));
        assert_eq!(points.len(), 2);

        assert_eq!(points[0].z_real, -1.0);
        assert_eq!(points[0].kind, PointKind::Maximum);
        assert_eq!(points[0].function_value, "2");
        assert_eq!(points[0].tau_real, -1.0);

        assert_eq!(points[1].z_real, 1.0);
        assert_eq!(points[1].kind, PointKind::Minimum);
        assert_eq!(points[1].function_value, "-2");
    }

    #[test]
    fn repeated_critical_point_is_reported_once() {
        let points = report("(z-1)^5").critical_points;
        assert_eq!(points.len(), 1);
        assert_eq!((points[0].z_real, points[0].z_imag), (1.0, 0.0));
        assert_eq!(points[0].kind, PointKind::Saddle);
        assert_eq!(points[0].function_value, "0");

        assert_eq!(report("(z-1)^7").critical_points.len(), 1);

        let mut points = report("(z-2)^4*(z+1)").critical_points;
        points.sort_by(|a, b| a.z_real.total_cmp(&b.z_real));
        let at: Vec<_> = points.iter().map(|p| (p.z_real, p.z_imag)).collect();
        assert_eq!(at, [(-0.4, 0.0), (2.0, 0.0)]);
    }

    #[test]
    fn skips_critical_point_at_origin() {
        // z^2 has its only critical point at 0, which has no τ
        assert!(report("z^2").critical_points.is_empty());
        assert!(report("sin(z)").critical_points.is_empty());
    }

    #[test]
    fn classifies_by_curvature() {
        assert_eq!(
            PointKind::classify(Some(Complex::new(0.0, 3.0))),
            PointKind::Saddle
        );
        assert_eq!(PointKind::classify(None), PointKind::Unknown);
    }

    #[test]
    fn flags_follow_text() {
        let props = report("1/z").domain_properties;
        assert_eq!(props.description, "Meromorphic function with possible poles");
        assert_eq!(props.series_expansion.as_deref(), Some("Could not compute Taylor series"));
        assert!(props.heuristic);

        let props = report("log(z)").domain_properties;
        assert_eq!(props.branch_points, "At z = 0 extending to -∞");
        assert_eq!(props.growth_rate.as_deref(), Some("Undetermined"));

        let props = report("sqrt(z)").domain_properties;
        assert_eq!(props.description, "Function with square root branch cut");
    }

    #[test]
    fn growth_rates() {
        assert_eq!(growth_rate("z^3 - 3*z"), "O(|z|^3) as |z| → ∞");
        assert_eq!(growth_rate("z*z"), "Bounded or sublinear growth");
        assert_eq!(growth_rate("exp(z) + z^2"), "Exponential growth");
        assert_eq!(growth_rate("sin(z)"), "Undetermined");
    }

    #[test]
    fn series_and_special_values() {
        let r = report("exp(z)");
        assert_eq!(
            r.domain_properties.series_expansion.as_deref(),
            Some("1 + z + 0.5*z^2 + 0.166666666667*z^3 + 0.0416666666667*z^4")
        );
        let values = r.special_values.unwrap();
        assert_eq!(values["at_zero"], "1");
        assert!(!values.contains_key("limit_at_infinity"));
        assert_eq!(
            r.differential_equations.unwrap().note.as_deref(),
            Some("Function may satisfy y' = y (exponential growth equation)")
        );

        let values = report("(z + 1)/z").special_values.unwrap();
        assert_eq!(values["at_zero"], "Undefined (singularity)");
        assert_eq!(values["at_one"], "2");
        assert_eq!(values["at_i"], "1-1i");
        assert_eq!(values["limit_at_infinity"], "1");
    }

    #[test]
    fn failed_parse_is_a_report() {
        let r = report("z**2");
        assert!(r.error.unwrap().starts_with("Analysis failed: "));
        assert_eq!(r.domain_properties.description, "Analysis failed");
        assert!(r.critical_points.is_empty());
        assert!(r.special_values.is_none());
    }

    struct NoRoots;

    impl Algebra for NoRoots {
        fn parse(&self, text: &str) -> Result<Expr, AlgebraErr> {
            TreeAlgebra::default().parse(text)
        }
        fn differentiate(&self, expr: &Expr) -> Result<Expr, AlgebraErr> {
            TreeAlgebra::default().differentiate(expr)
        }
        fn solve_roots(&self, expr: &Expr) -> Result<Vec<Complex>, AlgebraErr> {
            Err(AlgebraErr {
                typ: AlgebraErrTyp::NoConvergence,
                expr: expr.to_string(),
            })
        }
        fn series_expand(&self, expr: &Expr, _order: usize) -> Result<Expr, AlgebraErr> {
            Err(AlgebraErr {
                typ: AlgebraErrTyp::Undefined,
                expr: expr.to_string(),
            })
        }
        fn substitute(&self, expr: &Expr, at: Complex) -> Result<Complex, AlgebraErr> {
            TreeAlgebra::default().substitute(expr, at)
        }
        fn limit(&self, _expr: &Expr, _point: LimitPoint) -> Result<LimitValue, AlgebraErr> {
            Ok(LimitValue::Infinite)
        }
    }

    #[test]
    fn partial_failures_stay_partial() {
        let r = analyze(&NoRoots, "z^3/2");
        assert!(r.error.is_none());
        assert!(r.critical_points.is_empty());
        assert_eq!(
            r.domain_properties.series_expansion.as_deref(),
            Some("Could not compute Taylor series")
        );
        let values = r.special_values.unwrap();
        assert_eq!(values["at_one"], "0.5");
        assert_eq!(values["limit_at_infinity"], "∞");
    }

    #[test]
    fn zeta_report_is_fixed() {
        let r = zeta_report();
        assert_eq!(r.critical_points[0].kind, PointKind::Extremum);
        let facts = r.important_facts.unwrap();
        assert_eq!(facts.first_few_zeros[0], "0.5 + 14.1347i");
        assert_eq!(facts.first_few_zeros.len(), 5);

        let json = serde_json::to_value(zeta_report()).unwrap();
        assert_eq!(json["critical_points"][0]["type"], "Extremum");
        assert_eq!(json["domain_properties"]["heuristic"], false);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn serializes_kind_names() {
        let json = serde_json::to_value(PointKind::Saddle).unwrap();
        assert_eq!(json, "Saddle point or inflection");
    }
}

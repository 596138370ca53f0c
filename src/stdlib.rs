// SPDX: CC0-1.0

use crate::{eval::*, Complex, Number};
use core::f64::consts;
use std::collections::HashMap;

/// The single free variable of every expression.
pub const VAR: &str = "z";

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    ret.insert(VAR.into(), Ident::Var);

    for fun in Builtin::exhaustive() {
        ret.insert(fun.name().into(), Ident::Fun(*fun));
    }

    ret.insert("pi".into(), Ident::Const(Complex::new(consts::PI, 0.0)));
    ret.insert("e".into(), Ident::Const(Complex::new(consts::E, 0.0)));
    ret
}

pub fn neg(z: Complex) -> Complex {
    -z
}

pub fn add(a: Complex, b: Complex) -> Complex {
    a + b
}

pub fn sub(a: Complex, b: Complex) -> Complex {
    a - b
}

pub fn mul(a: Complex, b: Complex) -> Complex {
    a * b
}

pub fn div(a: Complex, b: Complex) -> Complex {
    a / b
}

pub fn pow(base: Complex, exp: Complex) -> Complex {
    // integral powers by repeated multiplication, so 0^2 is 0 and (-1)^2 is exact
    if exp.im == 0.0 && exp.re.fract() == 0.0 && exp.re.abs() <= Number::from(i32::MAX) {
        base.powi(exp.re as i32)
    } else if base == Complex::new(0.0, 0.0) {
        if exp.re > 0.0 {
            base
        } else {
            Complex::new(Number::NAN, Number::NAN)
        }
    } else {
        base.powc(exp)
    }
}

pub fn abs(z: Complex) -> Complex {
    Complex::new(z.norm(), 0.0)
}

/// Principal branch, cut along the negative real axis.
pub fn log(z: Complex) -> Complex {
    z.ln()
}

pub fn exp(z: Complex) -> Complex {
    z.exp()
}

pub fn sqrt(z: Complex) -> Complex {
    z.sqrt()
}

pub fn sin(z: Complex) -> Complex {
    z.sin()
}

pub fn cos(z: Complex) -> Complex {
    z.cos()
}

pub fn tan(z: Complex) -> Complex {
    z.tan()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_is_closed() {
        let idents = standard_idents();
        let mut names: Vec<&str> = idents.keys().map(|k| k.get()).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            ["abs", "cos", "e", "exp", "log", "pi", "sin", "sqrt", "tan", "z"]
        );
    }

    #[test]
    fn powers() {
        let zero = Complex::new(0.0, 0.0);
        assert_eq!(pow(zero, Complex::new(2.0, 0.0)), zero);
        assert!(pow(zero, Complex::new(-1.0, 0.0)).is_nan());
        assert_eq!(
            pow(Complex::new(0.0, 1.0), Complex::new(2.0, 0.0)),
            Complex::new(-1.0, 0.0)
        );
        let root = pow(Complex::new(4.0, 0.0), Complex::new(0.5, 0.0));
        assert!((root - Complex::new(2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn log_of_zero_is_infinite() {
        let got = log(Complex::new(0.0, 0.0));
        assert!(got.re.is_infinite() && got.re < 0.0);
    }
}

// SPDX: CC0-1.0

use crate::{
    lex::{Lexer, SubStr},
    parse::{self, ParseErr},
    stdlib, Complex, Number,
};
use core::fmt;
use ndarray::{Array, Dimension, Zip};
use std::{collections::HashMap, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Neg => 4,
            Self::Pow => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Pow => Right,
        }
    }

    pub const fn arity(&self) -> usize {
        match self {
            Self::Neg => 1,
            _ => 2,
        }
    }

    pub const fn is_prefix(&self) -> bool {
        self.arity() == 1
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Pow => "pow",
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Add => " + ",
            Self::Sub => " - ",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }

    pub fn apply_unary(&self, z: Complex) -> Complex {
        match self {
            Self::Neg => stdlib::neg(z),
            _ => unreachable!("'{}' is not a prefix operator", self.name()),
        }
    }

    pub fn apply_binary(&self, a: Complex, b: Complex) -> Complex {
        match self {
            Self::Add => stdlib::add(a, b),
            Self::Sub => stdlib::sub(a, b),
            Self::Mul => stdlib::mul(a, b),
            Self::Div => stdlib::div(a, b),
            Self::Pow => stdlib::pow(a, b),
            Self::Neg => unreachable!("'neg' is not a binary operator"),
        }
    }
}

/// Named functions of the expression language. All take one argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Log,
    Exp,
    Sqrt,
    Abs,
}

impl Builtin {
    pub const fn exhaustive() -> &'static [Builtin] {
        &[
            Self::Sin,
            Self::Cos,
            Self::Tan,
            Self::Log,
            Self::Exp,
            Self::Sqrt,
            Self::Abs,
        ]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Log => "log",
            Self::Exp => "exp",
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
        }
    }

    pub fn apply(&self, z: Complex) -> Complex {
        match self {
            Self::Sin => stdlib::sin(z),
            Self::Cos => stdlib::cos(z),
            Self::Tan => stdlib::tan(z),
            Self::Log => stdlib::log(z),
            Self::Exp => stdlib::exp(z),
            Self::Sqrt => stdlib::sqrt(z),
            Self::Abs => stdlib::abs(z),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Val(Number),
    Ident,
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.name()),
            OperationTyp::Ident => write!(f, "load '{}'", self.loc.get()),
        }
    }
}

#[derive(Debug)]
pub enum EvalErrTyp {
    Empty,
    MissingArgs {
        name: IdentKey,
        arity: usize,
        found: usize,
    },
    StackMismatch {
        expected: usize,
        found: usize,
    },
    UndefinedIdent {
        text: SubStr,
    },
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::Empty => write!(f, "cannot evaluate empty program"),

            EvalErrTyp::MissingArgs { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                name = name.get(),
                s = if *arity == 1 { "" } else { "s" }
            ),

            EvalErrTyp::StackMismatch { expected, found } => write!(
                f,
                "expected {expected} operand{s} after evaluation but found {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),

            EvalErrTyp::UndefinedIdent { text } => {
                write!(f, "undefined identifier '{}'", text.get())
            }
        }
    }
}

#[derive(Debug)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub op: Option<Operation>, // if none, associated with end-of-program checking
}

impl std::error::Error for EvalErr {}

#[derive(Clone, Copy, Debug)]
pub enum Ident {
    Var,
    Const(Complex),
    Fun(Builtin),
}

#[derive(Clone, Debug, Eq)]
pub enum IdentKey {
    Arc(SubStr),
    Static(&'static str),
}

impl PartialEq for IdentKey {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl core::hash::Hash for IdentKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state)
    }
}

impl IdentKey {
    pub fn get(&self) -> &str {
        match self {
            Self::Arc(s) => s.get(),
            Self::Static(s) => s,
        }
    }
}

impl fmt::Display for IdentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

impl From<SubStr> for IdentKey {
    fn from(s: SubStr) -> Self {
        Self::Arc(s)
    }
}

impl From<&'static str> for IdentKey {
    fn from(s: &'static str) -> Self {
        Self::Static(s)
    }
}

pub type Idents = HashMap<IdentKey, Ident>;

/// Postfix program produced by the parser.
#[derive(Debug)]
pub struct Program {
    pub(crate) ops: Vec<Operation>,
}

impl Program {
    #[inline]
    pub const fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }
}

/// Expression tree over the single complex variable.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Complex),
    Variable,
    Unary(OperatorTyp, Box<Expr>),
    Binary(OperatorTyp, Box<Expr>, Box<Expr>),
    Call(Builtin, Box<Expr>),
}

impl Expr {
    pub const fn lit(val: Complex) -> Self {
        Self::Literal(val)
    }

    pub const fn real(val: Number) -> Self {
        Self::Literal(Complex::new(val, 0.0))
    }

    pub fn as_literal(&self) -> Option<Complex> {
        match self {
            Self::Literal(val) => Some(*val),
            _ => None,
        }
    }

    fn is_literal(&self, val: Number) -> bool {
        self.as_literal() == Some(Complex::new(val, 0.0))
    }

    pub fn contains_var(&self) -> bool {
        match self {
            Self::Literal(_) => false,
            Self::Variable => true,
            Self::Unary(_, a) | Self::Call(_, a) => a.contains_var(),
            Self::Binary(_, l, r) => l.contains_var() || r.contains_var(),
        }
    }

    pub fn contains_call(&self, fun: Builtin) -> bool {
        match self {
            Self::Literal(_) | Self::Variable => false,
            Self::Call(b, a) => *b == fun || a.contains_call(fun),
            Self::Unary(_, a) => a.contains_call(fun),
            Self::Binary(_, l, r) => l.contains_call(fun) || r.contains_call(fun),
        }
    }

    // the constructors below fold literals and drop identities so that
    // derivatives stay readable

    pub fn neg(a: Expr) -> Self {
        match a {
            Self::Literal(val) => Self::Literal(-val),
            Self::Unary(OperatorTyp::Neg, inner) => *inner,
            a => Self::Unary(OperatorTyp::Neg, Box::new(a)),
        }
    }

    pub fn add(l: Expr, r: Expr) -> Self {
        match (l, r) {
            (Self::Literal(a), Self::Literal(b)) => Self::Literal(a + b),
            (l, r) if l.is_literal(0.0) => r,
            (l, r) if r.is_literal(0.0) => l,
            (l, Self::Unary(OperatorTyp::Neg, r)) => Self::sub(l, *r),
            (l, r) => Self::Binary(OperatorTyp::Add, Box::new(l), Box::new(r)),
        }
    }

    pub fn sub(l: Expr, r: Expr) -> Self {
        match (l, r) {
            (Self::Literal(a), Self::Literal(b)) => Self::Literal(a - b),
            (l, r) if r.is_literal(0.0) => l,
            (l, r) if l.is_literal(0.0) => Self::neg(r),
            (l, r) => Self::Binary(OperatorTyp::Sub, Box::new(l), Box::new(r)),
        }
    }

    pub fn mul(l: Expr, r: Expr) -> Self {
        match (l, r) {
            (Self::Literal(a), Self::Literal(b)) => Self::Literal(a * b),
            (l, r) if l.is_literal(0.0) || r.is_literal(0.0) => Self::real(0.0),
            (l, r) if l.is_literal(1.0) => r,
            (l, r) if r.is_literal(1.0) => l,
            (l, r) if l.is_literal(-1.0) => Self::neg(r),
            // keep literal factors in front
            (l, r @ Self::Literal(_)) => Self::Binary(OperatorTyp::Mul, Box::new(r), Box::new(l)),
            (l, r) => Self::Binary(OperatorTyp::Mul, Box::new(l), Box::new(r)),
        }
    }

    pub fn div(l: Expr, r: Expr) -> Self {
        match (l, r) {
            (Self::Literal(a), Self::Literal(b)) if b != Complex::new(0.0, 0.0) => {
                Self::Literal(a / b)
            }
            (l, r) if r.is_literal(1.0) => l,
            (l, r) if l.is_literal(0.0) && r.as_literal().is_none() => Self::real(0.0),
            (l, r) => Self::Binary(OperatorTyp::Div, Box::new(l), Box::new(r)),
        }
    }

    pub fn pow(base: Expr, exp: Expr) -> Self {
        match (base, exp) {
            (Self::Literal(a), Self::Literal(b)) => Self::Literal(stdlib::pow(a, b)),
            (_, exp) if exp.is_literal(0.0) => Self::real(1.0),
            (base, exp) if exp.is_literal(1.0) => base,
            (base, exp) => Self::Binary(OperatorTyp::Pow, Box::new(base), Box::new(exp)),
        }
    }

    pub fn call(fun: Builtin, a: Expr) -> Self {
        match a {
            Self::Literal(val) => Self::Literal(fun.apply(val)),
            a => Self::Call(fun, Box::new(a)),
        }
    }

    pub fn binary(op: OperatorTyp, l: Expr, r: Expr) -> Self {
        match op {
            OperatorTyp::Add => Self::add(l, r),
            OperatorTyp::Sub => Self::sub(l, r),
            OperatorTyp::Mul => Self::mul(l, r),
            OperatorTyp::Div => Self::div(l, r),
            OperatorTyp::Pow => Self::pow(l, r),
            OperatorTyp::Neg => unreachable!("'neg' is not a binary operator"),
        }
    }

    /// Evaluates the tree once over the whole array. Each node produces a
    /// full array, so singular cells become NaN or infinity on their own.
    pub fn eval<D: Dimension>(&self, values: &Array<Complex, D>) -> Array<Complex, D> {
        match self {
            Self::Literal(val) => Array::from_elem(values.raw_dim(), *val),
            Self::Variable => values.clone(),
            Self::Unary(op, a) => {
                let mut a = a.eval(values);
                a.mapv_inplace(|z| op.apply_unary(z));
                a
            }
            Self::Binary(op, l, r) => {
                let l = l.eval(values);
                let r = r.eval(values);
                Zip::from(&l)
                    .and(&r)
                    .map_collect(|&a, &b| op.apply_binary(a, b))
            }
            Self::Call(fun, a) => {
                let mut a = a.eval(values);
                a.mapv_inplace(|z| fun.apply(z));
                a
            }
        }
    }

    /// Scalar evaluation at a single point.
    pub fn eval_at(&self, z: Complex) -> Complex {
        match self {
            Self::Literal(val) => *val,
            Self::Variable => z,
            Self::Unary(op, a) => op.apply_unary(a.eval_at(z)),
            Self::Binary(op, l, r) => op.apply_binary(l.eval_at(z), r.eval_at(z)),
            Self::Call(fun, a) => fun.apply(a.eval_at(z)),
        }
    }

    fn precedence(&self) -> i8 {
        match self {
            Self::Literal(val) if val.im == 0.0 && val.re >= 0.0 => i8::MAX,
            Self::Literal(_) => OperatorTyp::Neg.precedence(),
            Self::Variable | Self::Call(..) => i8::MAX,
            Self::Unary(op, _) | Self::Binary(op, ..) => op.precedence(),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(val) if val.im == 0.0 => write!(f, "{}", val.re),
            Self::Literal(val) => write!(f, "({}{:+}i)", val.re, val.im),
            Self::Variable => f.write_str(stdlib::VAR),
            Self::Unary(op, a) => {
                f.write_str(op.symbol().trim())?;
                write_operand(f, a, a.precedence() < op.precedence())
            }
            Self::Binary(op, l, r) => {
                let prec = op.precedence();
                let assoc = op.associativity();
                write_operand(
                    f,
                    l,
                    l.precedence() < prec
                        || (l.precedence() == prec && assoc == Associativity::Right),
                )?;
                f.write_str(op.symbol())?;
                write_operand(
                    f,
                    r,
                    r.precedence() < prec
                        || (r.precedence() == prec && assoc == Associativity::Left),
                )
            }
            Self::Call(fun, a) => write!(f, "{}({a})", fun.name()),
        }
    }
}

/// Assembles a postfix program into an expression tree.
pub fn build(prog: &Program, idents: &Idents) -> Result<Expr, EvalErr> {
    fn pop_args(
        stack: &mut Vec<Expr>,
        op: &Operation,
        name: impl Into<IdentKey>,
        arity: usize,
    ) -> Result<Vec<Expr>, EvalErr> {
        let len = stack.len();
        if len < arity {
            return Err(EvalErr {
                typ: EvalErrTyp::MissingArgs {
                    arity,
                    found: len,
                    name: name.into(),
                },
                op: Some(op.clone()),
            });
        }
        // stack: ...a, b, c, d
        //                 ^^^^ args if arity is 2
        Ok(stack.split_off(len - arity))
    }

    let mut ops = prog.ops.iter().peekable();

    if ops.peek().is_none() {
        return Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        });
    }

    let mut stack: Vec<Expr> = Vec::new();

    for op in ops {
        let node = match op.typ {
            OperationTyp::Operator(typ) => {
                let mut args = pop_args(&mut stack, op, typ.name(), typ.arity())?.into_iter();
                match (args.next(), args.next()) {
                    (Some(a), None) => Expr::Unary(typ, Box::new(a)),
                    (Some(l), Some(r)) => Expr::Binary(typ, Box::new(l), Box::new(r)),
                    _ => unreachable!("operators take one or two operands"),
                }
            }

            OperationTyp::Val(num) => Expr::real(num),

            OperationTyp::Ident => {
                let sym = op.loc.clone();
                match idents.get(&sym.clone().into()) {
                    Some(Ident::Var) => Expr::Variable,
                    Some(Ident::Const(val)) => Expr::Literal(*val),
                    Some(Ident::Fun(fun)) => {
                        let mut args = pop_args(&mut stack, op, sym, 1)?;
                        match args.pop() {
                            Some(a) => Expr::Call(*fun, Box::new(a)),
                            None => unreachable!("pop_args checked the arity"),
                        }
                    }
                    None => {
                        return Err(EvalErr {
                            typ: EvalErrTyp::UndefinedIdent { text: sym },
                            op: Some(op.clone()),
                        });
                    }
                }
            }
        };
        stack.push(node);
    }

    match (stack.pop(), stack.len()) {
        (Some(expr), 0) => Ok(expr),
        (top, rest) => Err(EvalErr {
            typ: EvalErrTyp::StackMismatch {
                expected: 1,
                found: rest + usize::from(top.is_some()),
            },
            op: None,
        }),
    }
}

#[derive(Debug)]
pub enum FunctionErr {
    /// Text outside the approved vocabulary; nothing was evaluated.
    Invalid(ParseErr),
    /// Text that lexes and parses but does not form an expression.
    Eval { expression: String, cause: EvalErr },
}

impl fmt::Display for FunctionErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(err) => write!(
                f,
                "invalid expression '{src}': {typ} at '{at}' (column {col})",
                src = err.loc.src(),
                typ = err.typ,
                at = err.loc.get(),
                col = err.loc.start() + 1,
            ),
            Self::Eval { expression, cause } => {
                write!(f, "cannot evaluate '{expression}': {cause}")
            }
        }
    }
}

impl std::error::Error for FunctionErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Eval { cause, .. } => Some(cause),
        }
    }
}

/// A user expression compiled against the standard vocabulary.
#[derive(Debug)]
pub struct Function {
    src: Arc<String>,
    prog: Program,
    expr: Expr,
}

impl Function {
    pub fn compile(src: &str) -> Result<Self, FunctionErr> {
        Self::compile_with(Arc::new(src.to_string()), &stdlib::standard_idents())
    }

    pub fn compile_with(src: Arc<String>, idents: &Idents) -> Result<Self, FunctionErr> {
        let prog = parse::parse(Lexer::new(&src), idents).map_err(FunctionErr::Invalid)?;
        let expr = build(&prog, idents).map_err(|cause| FunctionErr::Eval {
            expression: src.to_string(),
            cause,
        })?;
        Ok(Self { src, prog, expr })
    }

    pub fn src(&self) -> &Arc<String> {
        &self.src
    }

    pub fn program(&self) -> &Program {
        &self.prog
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn eval<D: Dimension>(&self, values: &Array<Complex, D>) -> Array<Complex, D> {
        self.expr.eval(values)
    }
}

/// Compiles `expression` and evaluates it over every element of `values`.
pub fn evaluate<D: Dimension>(
    values: &Array<Complex, D>,
    expression: &str,
) -> Result<Array<Complex, D>, FunctionErr> {
    Ok(Function::compile(expression)?.eval(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array1};

    fn c(re: Number, im: Number) -> Complex {
        Complex::new(re, im)
    }

    fn close(a: Complex, b: Complex) -> bool {
        (a - b).norm() < 1e-12
    }

    #[test]
    fn squares_elementwise() {
        let values = arr1(&[c(1.0, 0.0), c(0.0, 1.0), c(2.0, 0.0)]);
        let got = evaluate(&values, "z*z").unwrap();
        let want = [c(1.0, 0.0), c(-1.0, 0.0), c(4.0, 0.0)];
        for (g, w) in got.iter().zip(want) {
            assert!(close(*g, w), "{g} != {w}");
        }
    }

    #[test]
    fn caret_is_power() {
        let values = arr1(&[c(2.0, 0.0), c(0.0, 1.0)]);
        let got = evaluate(&values, "z^3 - 1").unwrap();
        assert!(close(got[0], c(7.0, 0.0)));
        assert!(close(got[1], c(-1.0, -1.0)));
    }

    #[test]
    fn precedence_and_negation() {
        let values = arr1(&[c(3.0, 0.0)]);
        assert!(close(evaluate(&values, "-z^2").unwrap()[0], c(-9.0, 0.0)));
        assert!(close(evaluate(&values, "2^-z").unwrap()[0], c(0.125, 0.0)));
        assert!(close(evaluate(&values, "1 - z - 1").unwrap()[0], c(-3.0, 0.0)));
        assert!(close(evaluate(&values, "2^z^2").unwrap()[0], c(512.0, 0.0)));
        assert!(close(
            evaluate(&values, "sqrt(abs(-z*3))").unwrap()[0],
            c(3.0, 0.0)
        ));
    }

    #[test]
    fn constants_are_known() {
        let values = arr1(&[c(0.0, 0.0)]);
        let got = evaluate(&values, "exp(pi) + e").unwrap()[0];
        let want = core::f64::consts::PI.exp() + core::f64::consts::E;
        assert!((got.re - want).abs() < 1e-9);
    }

    #[test]
    fn scientific_literals() {
        let values = arr1(&[c(2.0, 0.0)]);
        assert!(close(evaluate(&values, "1e-3*z").unwrap()[0], c(0.002, 0.0)));
        assert!(close(evaluate(&values, "z^2 + 1.5E+1").unwrap()[0], c(19.0, 0.0)));
    }

    #[test]
    fn singular_cells_stay_local() {
        let values = arr1(&[c(0.0, 0.0), c(1.0, 0.0)]);
        let got = evaluate(&values, "log(z) + 1/z").unwrap();
        assert!(!got[0].is_finite());
        assert!(close(got[1], c(1.0, 0.0)));
    }

    #[test]
    fn rejects_foreign_code() {
        let values: Array1<Complex> = arr1(&[c(1.0, 0.0)]);
        for bad in ["__import__('os')", "x + 1", "z**2", "sinh(z)", "z; 1", "i*z"] {
            match evaluate(&values, bad) {
                Err(FunctionErr::Invalid(_)) => {}
                other => panic!("{bad:?} was not rejected: {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_structure_is_an_evaluation_error() {
        let values = arr1(&[c(1.0, 0.0)]);
        for bad in ["", "z z", "sin()", "z +", "2 pi"] {
            match evaluate(&values, bad) {
                Err(FunctionErr::Eval { expression, .. }) => assert_eq!(expression, bad),
                other => panic!("{bad:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn displays_with_minimal_parentheses() {
        let f = Function::compile("-(z + 1)^2 * sin(z - (1 - z))").unwrap();
        assert_eq!(f.expr().to_string(), "-(z + 1)^2*sin(z - (1 - z))");
    }
}

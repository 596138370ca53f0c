// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Associativity, Ident, Idents, Operation, OperationTyp, OperatorTyp, Program},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, TokTyp},
    Number,
};
use core::{fmt, num::ParseFloatError};

/// Below this similarity no name is suggested for an unknown identifier.
const SUGGEST_THRESHOLD: f64 = 0.3;

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
    UnknownIdent { suggestion: Option<String> },
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::UnknownIdent { suggestion: None } => write!(f, "unknown identifier"),
            Self::UnknownIdent {
                suggestion: Some(name),
            } => write!(f, "unknown identifier (did you mean '{name}'?)"),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at '{}'", self.typ, self.loc)
    }
}

impl std::error::Error for ParseErr {}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Fun,
    OpenParen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

impl ShuntOp {
    pub fn precedence(&self) -> i8 {
        match self.typ {
            ShuntOpTyp::Operator(op) => op.precedence(),
            // a function waiting on the stack binds tighter than any operator
            ShuntOpTyp::Fun => i8::MAX,
            ShuntOpTyp::OpenParen => i8::MIN,
        }
    }

    pub fn into_output(self) -> Operation {
        let typ = match self.typ {
            ShuntOpTyp::Operator(typ) => OperationTyp::Operator(typ),
            ShuntOpTyp::Fun => OperationTyp::Ident,
            ShuntOpTyp::OpenParen => unreachable!("no parentheses in the output stack"),
        };
        Operation { typ, loc: self.loc }
    }
}

/// Closest known name to `text`, if any is close enough to be worth showing.
pub fn suggest(text: &str, idents: &Idents) -> Option<String> {
    idents
        .keys()
        .map(|key| {
            (
                strsim::normalized_damerau_levenshtein(
                    &text.to_ascii_lowercase(),
                    &key.get().to_ascii_lowercase(),
                ),
                key,
            )
        })
        .filter(|(sim, _)| *sim > SUGGEST_THRESHOLD)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, key)| key.get().to_string())
}

pub fn parse(lex: Lexer<'_>, idents: &Idents) -> Result<Program, ParseErr> {
    let mut out: Vec<Operation> = Vec::new(); // output
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack

    for tok in lex {
        let tok = tok?;
        match tok.typ {
            TokTyp::Number => {
                let num: Number = match tok.loc.get().parse() {
                    Ok(val) => val,
                    Err(err) => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParseNum(err),
                            loc: tok.loc,
                        })
                    }
                };
                out.push(Operation {
                    typ: OperationTyp::Val(num),
                    loc: tok.loc,
                });
            }

            TokTyp::Ident => match idents.get(&tok.loc.clone().into()) {
                Some(Ident::Var | Ident::Const(_)) => out.push(Operation {
                    typ: OperationTyp::Ident,
                    loc: tok.loc,
                }),
                Some(Ident::Fun(_)) => ops.push(ShuntOp {
                    typ: ShuntOpTyp::Fun,
                    loc: tok.loc,
                }),
                None => {
                    return Err(ParseErr {
                        typ: ParseErrTyp::UnknownIdent {
                            suggestion: suggest(tok.loc.get(), idents),
                        },
                        loc: tok.loc,
                    })
                }
            },

            TokTyp::Op(o1) if o1.is_prefix() => {
                // nothing to the left can belong to a prefix operator
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Operator(o1),
                    loc: tok.loc,
                });
            }

            TokTyp::Op(o1) => {
                while let Some(o2) = ops.last() {
                    if (o2.typ != ShuntOpTyp::OpenParen)
                        && ((o2.precedence() > o1.precedence())
                            || ((o1.precedence() == o2.precedence())
                                && (o1.associativity() == Associativity::Left)))
                    {
                        if let Some(o2) = ops.pop() {
                            out.push(o2.into_output());
                        }
                    } else {
                        break;
                    }
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Operator(o1),
                    loc: tok.loc,
                });
            }

            TokTyp::OpenParen => {
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen,
                    loc: tok.loc,
                });
            }

            TokTyp::CloseParen => {
                loop {
                    match ops.pop() {
                        Some(op) if op.typ == ShuntOpTyp::OpenParen => break,
                        Some(op) => out.push(op.into_output()),
                        None => {
                            return Err(ParseErr {
                                typ: ParseErrTyp::ParenMismatch,
                                loc: tok.loc,
                            })
                        }
                    }
                }

                // handle functions
                if let Some(ShuntOp {
                    typ: ShuntOpTyp::Fun,
                    ..
                }) = ops.last()
                {
                    if let Some(op) = ops.pop() {
                        out.push(op.into_output());
                    }
                }
            }

            TokTyp::XComma
            | TokTyp::XDoubleStar
            | TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XEqual
            | TokTyp::XPipe
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => unreachable!("unsupported token survived until parsing"),
        }
    }

    while let Some(op) = ops.pop() {
        if let ShuntOpTyp::OpenParen = op.typ {
            return Err(ParseErr {
                typ: ParseErrTyp::ParenMismatch,
                loc: op.loc,
            });
        }
        out.push(op.into_output());
    }

    Ok(Program::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib;
    use std::sync::Arc;

    fn postfix(src: &str) -> Result<Vec<String>, ParseErr> {
        let src = Arc::new(src.to_string());
        let prog = parse(Lexer::new(&src), &stdlib::standard_idents())?;
        Ok(prog
            .ops()
            .map(|op| match op.typ {
                OperationTyp::Val(val) => val.to_string(),
                OperationTyp::Operator(typ) => typ.name().to_string(),
                OperationTyp::Ident => op.loc.get().to_string(),
            })
            .collect())
    }

    #[test]
    fn orders_by_precedence() {
        assert_eq!(
            postfix("1 + 2*z^2").unwrap(),
            ["1", "2", "z", "2", "pow", "mul", "add"]
        );
        assert_eq!(postfix("-z^2").unwrap(), ["z", "2", "pow", "neg"]);
        assert_eq!(postfix("sin(z)*2").unwrap(), ["z", "sin", "2", "mul"]);
    }

    #[test]
    fn reports_paren_mismatch() {
        for bad in ["(z", "z)", "sin(z))"] {
            let err = postfix(bad).unwrap_err();
            assert!(matches!(err.typ, ParseErrTyp::ParenMismatch), "{bad}");
        }
    }

    #[test]
    fn unknown_identifier_names_offender() {
        let err = postfix("sinh(z)").unwrap_err();
        assert_eq!(err.loc.get(), "sinh");
        match err.typ {
            ParseErrTyp::UnknownIdent { suggestion } => {
                assert_eq!(suggestion.as_deref(), Some("sin"))
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn bad_number() {
        let err = postfix("1.2.3*z").unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::ParseNum(_)));
    }
}

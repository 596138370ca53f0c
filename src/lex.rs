// SPDX: CC0-1.0

use crate::eval::OperatorTyp;
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    /// Zero-width span just past the end of the source.
    pub fn end(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, len, 0)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    OpenParen,
    CloseParen,

    // unsupported tokens
    XComma,
    XDoubleStar,
    XGreater,
    XLess,
    XEqual,
    XPipe,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident | Self::Number | Self::Op(_) | Self::OpenParen | Self::CloseParen => false,

            // unsupported tokens
            Self::XComma
            | Self::XDoubleStar
            | Self::XGreater
            | Self::XLess
            | Self::XEqual
            | Self::XPipe
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }

    /// Whether a token of this type can end an operand, which makes a
    /// following `-` a subtraction rather than a negation.
    const fn ends_operand(&self) -> bool {
        matches!(self, Self::Ident | Self::Number | Self::CloseParen)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::Unsupported(_) => write!(f, "unsupported symbol"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    prev: Option<TokTyp>,
    has_errored: bool, // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            prev: None,
            has_errored: false,
        }
    }

    pub fn trim_whitespace(&mut self) {
        while let Some((_, chr)) = self.cur.peek() {
            if chr.is_ascii_whitespace() {
                self.cur.next();
            } else {
                break;
            }
        }
    }

    fn span(&self, start: usize, len: usize) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, len)
    }

    pub fn consume_unambiguous(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let typ = match chr {
            '+' => TokTyp::Op(OperatorTyp::Add),
            '*' => TokTyp::Op(OperatorTyp::Mul),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '^' => TokTyp::Op(OperatorTyp::Pow),
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,

            ',' => TokTyp::XComma,
            '>' => TokTyp::XGreater,
            '<' => TokTyp::XLess,
            '=' => TokTyp::XEqual,
            '|' => TokTyp::XPipe,
            '[' => TokTyp::XOpenSquareBracket,
            ']' => TokTyp::XCloseSquareBracket,
            '{' => TokTyp::XOpenCurly,
            '}' => TokTyp::XCloseCurly,
            _ => return None,
        };
        self.cur.next(); // consume because we only peeked

        // `**` is somebody else's power operator
        if typ == TokTyp::Op(OperatorTyp::Mul) {
            if let Some((_, '*')) = self.cur.peek() {
                self.cur.next();
                return Some(Tok {
                    typ: TokTyp::XDoubleStar,
                    loc: self.span(idx, 2),
                });
            }
        }

        Some(Tok {
            typ,
            loc: self.span(idx, 1),
        })
    }

    pub fn consume_by<P>(&mut self, next_idx: usize, typ: TokTyp, predicate: P) -> Option<Tok>
    where
        P: Fn(char) -> bool,
    {
        let mut tok = Tok {
            typ,
            loc: self.span(next_idx, 0),
        };
        while let Some((_, chr)) = self.cur.peek().copied() {
            if predicate(chr) {
                // source is ascii by the time a token is gathered
                tok.loc.shift_right(1);
                self.cur.next();
            } else {
                break;
            }
        }
        if tok.loc.is_empty() {
            // there is no next token of type `typ`
            None
        } else {
            Some(tok)
        }
    }

    /// Extends a number with `e3`, `E-3` or `e+3`. Without a digit after
    /// the marker, `e` is left for the constant.
    fn consume_exponent(&mut self, tok: &mut Tok) {
        let mut ahead = self.cur.clone();
        if !matches!(ahead.next(), Some((_, 'e' | 'E'))) {
            return;
        }
        let mut marker = 1;
        if let Some((_, '+' | '-')) = ahead.peek() {
            ahead.next();
            marker += 1;
        }
        if !ahead.peek().map_or(false, |(_, chr)| chr.is_ascii_digit()) {
            return;
        }
        for _ in 0..marker {
            self.cur.next();
        }
        tok.loc.shift_right(marker);
        while let Some((_, chr)) = self.cur.peek().copied() {
            if chr.is_ascii_digit() {
                tok.loc.shift_right(1);
                self.cur.next();
            } else {
                break;
            }
        }
    }

    fn lex_one(&mut self, next_idx: usize, next_chr: char) -> Result<Tok, LexErr> {
        if let Some(tok) = self.consume_unambiguous() {
            Ok(tok)
        } else if next_chr == '-' {
            // distinguish subtraction from negation
            self.cur.next();
            let typ = if self.prev.map(|p| p.ends_operand()).unwrap_or(false) {
                TokTyp::Op(OperatorTyp::Sub)
            } else {
                TokTyp::Op(OperatorTyp::Neg)
            };
            Ok(Tok {
                typ,
                loc: self.span(next_idx, 1),
            })
        } else if let Some(tok) =
            self.consume_by(next_idx, TokTyp::Ident, |chr| chr.is_ascii_alphabetic())
        {
            Ok(tok)
        } else if let Some(mut tok) = self.consume_by(next_idx, TokTyp::Number, |chr| {
            chr.is_ascii_digit() || chr == '.'
        }) {
            self.consume_exponent(&mut tok);
            Ok(tok)
        } else {
            Err(LexErr {
                typ: LexErrTyp::InvalidChar,
                loc: self.span(next_idx, next_chr.len_utf8()),
            })
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;
        let ret = match self.lex_one(next_idx, next_chr) {
            Ok(tok) if tok.typ.is_unsupported() => Err(LexErr {
                typ: LexErrTyp::Unsupported(tok.typ),
                loc: tok.loc,
            }),
            other => other,
        };
        match ret {
            Ok(ref tok) => self.prev = Some(tok.typ),
            Err(_) => self.has_errored = true,
        }
        Some(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typs(src: &str) -> Vec<Result<TokTyp, LexErrTyp>> {
        let src = Arc::new(src.to_string());
        Lexer::new(&src)
            .map(|tok| tok.map(|t| t.typ).map_err(|e| e.typ))
            .collect()
    }

    #[test]
    fn minus_depends_on_previous_token() {
        use OperatorTyp::{Neg, Sub};
        assert_eq!(
            typs("-z - 1"),
            vec![
                Ok(TokTyp::Op(Neg)),
                Ok(TokTyp::Ident),
                Ok(TokTyp::Op(Sub)),
                Ok(TokTyp::Number),
            ]
        );
        assert_eq!(
            typs("z^-2"),
            vec![
                Ok(TokTyp::Ident),
                Ok(TokTyp::Op(OperatorTyp::Pow)),
                Ok(TokTyp::Op(Neg)),
                Ok(TokTyp::Number),
            ]
        );
        assert_eq!(typs("(z)-1")[3], Ok(TokTyp::Op(Sub)));
    }

    #[test]
    fn scientific_notation() {
        let src = Arc::new(String::from("1e-3 + 2.5E+2*z - 4e2"));
        let nums: Vec<String> = Lexer::new(&src)
            .map(Result::unwrap)
            .filter(|tok| tok.typ == TokTyp::Number)
            .map(|tok| tok.loc.get().to_string())
            .collect();
        assert_eq!(nums, ["1e-3", "2.5E+2", "4e2"]);

        // no digit after the marker, so `e` is the constant
        assert_eq!(
            typs("2e-z"),
            vec![
                Ok(TokTyp::Number),
                Ok(TokTyp::Ident),
                Ok(TokTyp::Op(OperatorTyp::Sub)),
                Ok(TokTyp::Ident),
            ]
        );
    }

    #[test]
    fn stops_after_invalid_char() {
        let got = typs("__import__('os')");
        assert_eq!(got, vec![Err(LexErrTyp::InvalidChar)]);
    }

    #[test]
    fn double_star_is_unsupported() {
        let got = typs("z**2");
        assert_eq!(
            got,
            vec![
                Ok(TokTyp::Ident),
                Err(LexErrTyp::Unsupported(TokTyp::XDoubleStar)),
            ]
        );
    }

    #[test]
    fn spans_point_into_source() {
        let src = Arc::new(String::from("  sin(z)"));
        let toks: Vec<Tok> = Lexer::new(&src).map(Result::unwrap).collect();
        assert_eq!(toks[0].loc.get(), "sin");
        assert_eq!(toks[0].loc.start(), 2);
        assert_eq!(toks[2].loc.get(), "z");
    }
}

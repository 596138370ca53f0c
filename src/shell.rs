// SPDX: CC0-1.0

use crate::{eval::Program, lex::SubStr};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

/// Below this similarity no command is suggested.
const SUGGEST_THRESHOLD: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    SetExpr,
    PrintProg,
    SetType,
    SetPlane,
    SetWin,
    Plot,
    Analyze,
    Zeros,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::SetExpr,
            Self::SetType,
            Self::SetPlane,
            Self::SetWin,
            Self::Plot,
            Self::Analyze,
            Self::Zeros,
            Self::PrintProg,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::SetExpr => "set expression f(z) to visualize",
            Self::PrintProg => "print program compiled from the expression (for debugging)",
            Self::SetType => "choose what to plot (zeta, general_func, simple_func)",
            Self::SetPlane => "choose the plane to sample in (tau_plane, z_plane, w_plane)",
            Self::SetWin => "set window parameters",
            Self::Plot => "evaluate over the window and write the result to a json file",
            Self::Analyze => "describe critical points, series and special values of f(z)",
            Self::Zeros => "list the first known zeros of zeta in the current plane",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::SetExpr => "set",
            Self::PrintProg => "prog",
            Self::SetType => "type",
            Self::SetPlane => "plane",
            Self::SetWin => "window",
            Self::Plot => "plot",
            Self::Analyze => "analyze",
            Self::Zeros => "zeros",
        }
    }

    /// Closest command name, if any is close enough to be worth showing.
    pub fn suggest(s: &str) -> Option<Command> {
        Self::exhaustive()
            .iter()
            .map(|c| (strsim::normalized_damerau_levenshtein(s, c.name()), *c))
            .filter(|(sim, _)| *sim > SUGGEST_THRESHOLD)
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, c)| c)
    }
}

impl core::str::FromStr for Command {
    type Err = Option<Command>;

    /// On failure, carries the most similar command.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or_else(|| Self::suggest(s))
    }
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        // zero-width spans point just past the text
        "^".repeat(span.len().max(1))
    )?;
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Program,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    if prog.ops().len() == 0 {
        writeln!(out, "  (empty)")?;
    }
    for op in prog.ops() {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

pub fn expr_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no expression is defined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        for c in Command::exhaustive() {
            assert_eq!(c.name().parse::<Command>(), Ok(*c));
        }
    }

    #[test]
    fn suggests_similar_commands() {
        assert_eq!("plto".parse::<Command>(), Err(Some(Command::Plot)));
        assert_eq!("zero".parse::<Command>(), Err(Some(Command::Zeros)));
        assert_eq!("xyzzyx".parse::<Command>(), Err(None));
    }

    #[test]
    fn underlines_span() {
        let src = Arc::new("sinn(z)".to_string());
        let mut out = Vec::new();
        underline(&mut out, &SubStr::new(src, 0, 4)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "sinn(z)\n^^^^\n");
    }
}

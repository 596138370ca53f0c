// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use std::{
    fs::{self, OpenOptions},
    io::{stdout, BufWriter, Write},
    process::ExitCode,
    sync::Arc,
};
use tau_plane::{
    analysis,
    config::Config,
    eval::{self, EvalErrTyp, Idents, Program},
    lex::{LexErrTyp, Lexer, SubStr, TokTyp},
    parse::{self, ParseErrTyp},
    project::{self, PlaneKind},
    request::{Engine, PlotRequest, PlotType, RequestErr},
    shell::{self, Command},
    stdlib, zeta, Number,
};

fn output_json_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "json"
    )
}

fn main() -> ExitCode {
    env_logger::init();

    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct State {
    req: PlotRequest,
    prog: Option<Program>,
    idents: Idents,
}

fn try_main() -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("invalid configuration")?;
    let engine = Engine::new(config).context("failed to set up the coordinate plane")?;

    // a request file on the command line answers once and exits
    if let Some(path) = std::env::args().nth(1) {
        return batch(&engine, &path);
    }

    let mut state = State {
        req: PlotRequest {
            plot_type: PlotType::GeneralFunc,
            ..PlotRequest::default()
        },
        prog: None,
        idents: stdlib::standard_idents(),
    };

    let mut stdout = BufWriter::new(stdout());
    loop {
        writeln!(
            stdout,
            "{} on {}, f(z) = {}",
            state.req.plot_type, state.req.plane, state.req.function
        )?;

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        match try_cmd.parse::<Command>() {
            Ok(cmd) => match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::SetExpr => set_expr(&mut stdout, &mut state)?,

                Command::PrintProg => {
                    compile_expr(&mut stdout, &mut state)?;
                    if let Some(ref prog) = state.prog {
                        shell::dump_program(&mut stdout, prog, format_args!("program"))?;
                    }
                }

                Command::SetType => {
                    if let Ok(Some(new)) = shell::read_fromstr::<_, PlotType>(
                        &mut stdout,
                        format_args!("?type (is {}) = ", state.req.plot_type),
                        true,
                    )? {
                        state.req.plot_type = new;
                    }
                }

                Command::SetPlane => {
                    if let Ok(Some(new)) = shell::read_fromstr::<_, PlaneKind>(
                        &mut stdout,
                        format_args!("?plane (is {}) = ", state.req.plane),
                        true,
                    )? {
                        state.req.plane = new;
                    }
                }

                Command::SetWin => set_win(&mut stdout, &mut state)?,

                Command::Plot => plot(&mut stdout, &mut state, &engine)?,

                Command::Analyze => analyze(&mut stdout, &mut state, &engine)?,

                Command::Zeros => list_zeros(&mut stdout, &state)?,
            },

            Err(Some(similar)) => writeln!(
                stdout,
                r#"Unknown command, did you mean "{}"? try "help" for help"#,
                similar.name()
            )?,

            Err(None) => writeln!(stdout, r#"Unknown command, try "help" for help"#)?,
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn batch(engine: &Engine, path: &str) -> anyhow::Result<ExitCode> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("failed to read request file '{path}'"))?;
    let resp = engine.respond_json(&body);

    let mut out = BufWriter::new(stdout());
    serde_json::to_writer(&mut out, &resp).context("failed to write response")?;
    writeln!(out)?;
    out.flush()?;

    Ok(if resp.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let req = &mut state.req;
    writeln!(
        out,
        "window = [{}, {}]², {} points",
        req.tau_min, req.tau_max, req.points
    )?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    for (name, dst) in [
        ("min", &mut req.tau_min),
        ("max", &mut req.tau_max),
        ("interest radius", &mut req.interest_radius),
        ("critical line t max", &mut req.t_max_crit),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    writeln!(out, "note: counts must be whole numbers")?;
    for (name, dst) in [("points", &mut req.points), ("zeros", &mut req.num_zeros)] {
        match shell::read_fromstr::<_, usize>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    Ok(())
}

fn plot<W: Write>(mut out: W, state: &mut State, engine: &Engine) -> anyhow::Result<()> {
    if state.req.plot_type != PlotType::Zeta {
        compile_expr(&mut out, state)?;
        if state.prog.is_none() {
            return Ok(());
        }
    }

    let resp = match engine.handle(&state.req) {
        Ok(resp) => resp,
        Err(RequestErr::Function(_)) => {
            // already reported while compiling
            return Ok(());
        }
        Err(err) => {
            writeln!(out, "error: {err}")?;
            if let RequestErr::TooManyPoints { max, .. } = err {
                writeln!(
                    out,
                    "note: raise the limit with {}={max}",
                    tau_plane::config::MAX_POINTS_VAR
                )?;
            }
            return Ok(());
        }
    };

    let undefined = resp
        .magnitude
        .iter()
        .flatten()
        .filter(|m| m.is_nan())
        .count();
    let rows = resp.magnitude.len();
    let cols = resp.magnitude.first().map_or(0, Vec::len);
    writeln!(out, "evaluation ok: {rows}x{cols} grid, {undefined} cells undefined")?;

    let path = output_json_filename(Local::now());
    let mut file = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .context("failed to open output json file")?,
    );
    serde_json::to_writer(&mut file, &resp).context("failed to write output json file")?;
    file.flush()?;
    file.get_mut().sync_data()?;
    writeln!(out, "wrote {path}")?;

    Ok(())
}

fn analyze<W: Write>(mut out: W, state: &mut State, engine: &Engine) -> anyhow::Result<()> {
    let report = if state.req.plot_type == PlotType::Zeta {
        analysis::zeta_report()
    } else {
        compile_expr(&mut out, state)?;
        if state.prog.is_none() {
            return Ok(());
        }
        analysis::analyze(engine.algebra(), &state.req.function)
    };
    serde_json::to_writer_pretty(&mut out, &report).context("failed to write analysis")?;
    writeln!(out)?;
    Ok(())
}

fn list_zeros<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let n = state.req.num_zeros;
    let ordinates = match zeta::known_zero_ordinates(n) {
        Ok(ts) => ts,
        Err(err) => {
            writeln!(out, "error: {err}")?;
            return Ok(());
        }
    };
    let taus: Vec<_> = ordinates
        .iter()
        .map(|t| tau_plane::Complex::new(zeta::CRITICAL_RE, *t).inv())
        .collect();
    let shown = project::overlay(state.req.plane, &taus);

    for ((t, tau), p) in ordinates.iter().zip(&taus).zip(shown.points()) {
        writeln!(
            out,
            "s = 1/2 + {t}i  τ = {tau:.6}  ({x:.6}, {y:.6}) on {plane}",
            x = p.x,
            y = p.y,
            plane = state.req.plane
        )?;
    }
    Ok(())
}

fn set_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    // read input expression
    let input = shell::input(&mut out, "f(z) = ")?;
    if input.is_empty() {
        return Ok(());
    }

    state.prog = None;
    state.req.function = input;

    // lex, parse & assemble input
    compile_expr(&mut out, state)?;

    Ok(())
}

fn compile_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let input = Arc::new(state.req.function.clone());
    state.prog = None;
    if input.trim().is_empty() {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    }

    let prog = match parse::parse(Lexer::new(&input), &state.idents) {
        Ok(p) => p,

        Err(err) => {
            writeln!(out)?;
            shell::underline(&mut out, &err.loc)?;
            writeln!(out, "parse error: {}", err.typ)?;
            match err.typ {
                ParseErrTyp::LexErr(lex_err) => match lex_err {
                    LexErrTyp::InvalidChar => {
                        writeln!(
                            out,
                            "note: available tokens are numbers, alphabetic identifiers, and symbols +-*/^()"
                        )?;
                    }
                    LexErrTyp::Unsupported(typ) => match typ {
                        TokTyp::Ident
                        | TokTyp::Number
                        | TokTyp::Op(_)
                        | TokTyp::OpenParen
                        | TokTyp::CloseParen => unreachable!(),

                        TokTyp::XDoubleStar => {
                            writeln!(out, "note: use '^' for powers, as in 'z^2'")?
                        }
                        TokTyp::XComma => {
                            writeln!(out, "note: every function takes exactly one argument")?
                        }
                        TokTyp::XGreater | TokTyp::XLess => {
                            writeln!(out, "note: expected an expression but found an inequality")?;
                        }
                        TokTyp::XEqual => {
                            writeln!(out, "note: expected an expression but found an equation")?;
                        }
                        TokTyp::XPipe => writeln!(
                            out,
                            "note: use the 'abs' function to compute absolute value"
                        )?,
                        TokTyp::XOpenSquareBracket
                        | TokTyp::XCloseSquareBracket
                        | TokTyp::XOpenCurly
                        | TokTyp::XCloseCurly => {
                            writeln!(out, "note: only round parentheses group terms")?
                        }
                    },
                },

                ParseErrTyp::ParseNum(_) => {
                    writeln!(out, "note: parsing as floating point number")?
                }

                ParseErrTyp::ParenMismatch => {}

                ParseErrTyp::UnknownIdent { suggestion: None } => {
                    writeln!(out, "note: the variable is '{}'", stdlib::VAR)?
                }

                ParseErrTyp::UnknownIdent { suggestion: Some(_) } => {}
            }
            return Ok(());
        }
    };

    if let Err(err) = eval::build(&prog, &state.idents) {
        let loc = err.op.clone().map(|op| op.loc);
        shell::underline(
            &mut out,
            &loc.clone().unwrap_or_else(|| SubStr::end(Arc::clone(&input))),
        )?;
        writeln!(out, "evaluation error: {err}")?;

        if loc.is_none() {
            writeln!(
                out,
                "note: exactly 1 final value is expected on the stack after evaluation"
            )?;
        }

        if let EvalErrTyp::StackMismatch { .. } = err.typ {
            writeln!(
                out,
                "note: implicit multiplication is not supported, so for example '5z' would be '5*z'",
            )?;
        }
        return Ok(());
    }

    state.prog = Some(prog);
    Ok(())
}

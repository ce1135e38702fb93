//! Script parser
//!
//! Grammar, one command per line:
//!
//! ```text
//! line     := keyword [ "(" arg { "," arg } ")" ]
//! keyword  := GO | SPEED | PAUSE | CYCLE | FIRE | ARC | START | END   (any case)
//! comment  := ("//" | "#") anything
//! ```
//!
//! Parentheses and commas are both separators, so `GO(10, 20)`, `GO(10,20)`
//! and `go(10)(20)` tokenize identically. Numbers are culture invariant.

use std::fmt;

use glam::DVec2;
use torchkit_core::ScriptError;

/// Parameters of a `CYCLE` command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSpec {
    /// First point, visited first (work coordinates)
    pub a: DVec2,
    /// Second point
    pub b: DVec2,
    /// Out-and-back passes; zero makes the command a no-op
    pub count: u32,
    /// Dwell at each point, `None` for the interpreter default
    pub pause: Option<f64>,
}

/// A parsed script command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// `SPEED(v)`: maximum travel speed in mm/s
    Speed(f64),
    /// `GO(x[, y])`: move in work coordinates; a missing Y keeps the current one
    Go {
        /// Target X (mm)
        x: f64,
        /// Target Y (mm)
        y: Option<f64>,
    },
    /// `PAUSE(t)`: wait `t` seconds
    Pause(f64),
    /// `CYCLE(x1, y1, x2, y2, n[, t])` or `CYCLE(x1, x2, n[, t])`
    Cycle(CycleSpec),
    /// `FIRE(v)` / `ARC(v)`: torch on when `v > 0`
    Fire(bool),
    /// `START`: marker, ignored
    Start,
    /// `END`: stop the script
    End,
}

impl Command {
    /// Upper-case keyword of the command
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Speed(_) => "SPEED",
            Command::Go { .. } => "GO",
            Command::Pause(_) => "PAUSE",
            Command::Cycle(_) => "CYCLE",
            Command::Fire(_) => "FIRE",
            Command::Start => "START",
            Command::End => "END",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Speed(v) => write!(f, "SPEED({})", v),
            Command::Go { x, y: Some(y) } => write!(f, "GO({}, {})", x, y),
            Command::Go { x, y: None } => write!(f, "GO({})", x),
            Command::Pause(t) => write!(f, "PAUSE({})", t),
            Command::Cycle(c) => {
                write!(f, "CYCLE({}, {}, {}, {}, {}", c.a.x, c.a.y, c.b.x, c.b.y, c.count)?;
                if let Some(pause) = c.pause {
                    write!(f, ", {}", pause)?;
                }
                write!(f, ")")
            }
            Command::Fire(on) => write!(f, "FIRE({})", u8::from(*on)),
            Command::Start => write!(f, "START"),
            Command::End => write!(f, "END"),
        }
    }
}

/// Split a line into its keyword and argument tokens
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split(['(', ')', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Whether a trimmed line carries no command
pub fn is_comment_or_blank(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with("//") || line.starts_with('#')
}

/// Command lines of a script with their 1-based line numbers
pub fn script_lines(script: &str) -> impl Iterator<Item = (usize, &str)> {
    script
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !is_comment_or_blank(line))
}

/// Parse a culture-invariant number; a decimal comma is accepted
pub fn parse_number(token: &str) -> Result<f64, ScriptError> {
    let normalized = token.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ScriptError::InvalidNumber {
            value: token.trim().to_string(),
        }),
    }
}

fn expect_args(
    keyword: &str,
    args: &[&str],
    range: std::ops::RangeInclusive<usize>,
    expected: &'static str,
) -> Result<(), ScriptError> {
    if range.contains(&args.len()) {
        Ok(())
    } else {
        Err(ScriptError::ArgumentCount {
            command: keyword.to_string(),
            expected,
            actual: args.len(),
        })
    }
}

fn invalid(keyword: &str, reason: impl Into<String>) -> ScriptError {
    ScriptError::InvalidArgument {
        command: keyword.to_string(),
        reason: reason.into(),
    }
}

/// Truncate a repeat count toward zero, treating non-positive values as zero
fn cycle_count(value: f64) -> u32 {
    if value < 1.0 {
        0
    } else {
        value.trunc().min(f64::from(u32::MAX)) as u32
    }
}

fn parse_cycle(args: &[&str]) -> Result<CycleSpec, ScriptError> {
    expect_args("CYCLE", args, 3..=6, "3 to 6")?;
    let numbers = args
        .iter()
        .map(|arg| parse_number(arg))
        .collect::<Result<Vec<f64>, _>>()?;

    let (a, b, rest) = if numbers.len() >= 5 {
        (
            DVec2::new(numbers[0], numbers[1]),
            DVec2::new(numbers[2], numbers[3]),
            &numbers[4..],
        )
    } else {
        (
            DVec2::new(numbers[0], 0.0),
            DVec2::new(numbers[1], 0.0),
            &numbers[2..],
        )
    };

    let pause = rest.get(1).copied();
    if pause.is_some_and(|p| p < 0.0) {
        return Err(invalid("CYCLE", "pause must not be negative"));
    }

    Ok(CycleSpec {
        a,
        b,
        count: cycle_count(rest[0]),
        pause,
    })
}

/// Parse one command line
pub fn parse_command(line: &str) -> Result<Command, ScriptError> {
    let tokens = tokenize(line);
    let Some((keyword, args)) = tokens.split_first() else {
        return Err(ScriptError::EmptyCommand);
    };
    let keyword = keyword.to_ascii_uppercase();

    match keyword.as_str() {
        "SPEED" => {
            expect_args(&keyword, args, 1..=1, "1")?;
            let speed = parse_number(args[0])?;
            if speed <= 0.0 {
                return Err(invalid(&keyword, "speed must be positive"));
            }
            Ok(Command::Speed(speed))
        }
        "GO" => {
            expect_args(&keyword, args, 1..=2, "1 or 2")?;
            let x = parse_number(args[0])?;
            let y = args.get(1).map(|arg| parse_number(arg)).transpose()?;
            Ok(Command::Go { x, y })
        }
        "PAUSE" => {
            expect_args(&keyword, args, 1..=1, "1")?;
            let seconds = parse_number(args[0])?;
            if seconds < 0.0 {
                return Err(invalid(&keyword, "pause must not be negative"));
            }
            Ok(Command::Pause(seconds))
        }
        "CYCLE" => parse_cycle(args).map(Command::Cycle),
        "FIRE" | "ARC" => {
            expect_args(&keyword, args, 1..=1, "1")?;
            Ok(Command::Fire(parse_number(args[0])? > 0.0))
        }
        "START" => {
            expect_args(&keyword, args, 0..=0, "0")?;
            Ok(Command::Start)
        }
        "END" => {
            expect_args(&keyword, args, 0..=0, "0")?;
            Ok(Command::End)
        }
        _ => Err(ScriptError::UnknownCommand { command: keyword }),
    }
}

/// A malformed line found by [`validate_script`]
#[derive(Debug, Clone, PartialEq)]
pub struct LineDiagnostic {
    /// 1-based line number
    pub line: usize,
    /// The trimmed line text
    pub text: String,
    /// Why the line does not parse
    pub error: ScriptError,
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line, self.error, self.text)
    }
}

/// Check every command line without running anything
pub fn validate_script(script: &str) -> Vec<LineDiagnostic> {
    script_lines(script)
        .filter_map(|(line, text)| {
            parse_command(text).err().map(|error| LineDiagnostic {
                line,
                text: text.to_string(),
                error,
            })
        })
        .collect()
}

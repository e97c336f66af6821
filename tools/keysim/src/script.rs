//! Key script parsing
//!
//! A key script is a list of writes a scanner would make to the notes, plus
//! `poll` lines marking the end of a scan cycle:
//!
//! ```text
//! # strike middle C, then let go
//! make 60 1000
//! break 60 1500
//! poll
//! break 60 90000
//! make 60 91000
//! poll
//! ```

use keybed::{NoteMode, Timestamp};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Close the switch of a digital key
    Press(u8),
    /// Open the switch of a digital key
    Release(u8),
    /// Record the make contact edge of a velocity key
    Make(u8, Timestamp),
    /// Record the break contact edge of a velocity key
    Break(u8, Timestamp),
    /// Poll every key once
    Poll,
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Press(_) => "press",
            Directive::Release(_) => "release",
            Directive::Make(..) => "make",
            Directive::Break(..) => "break",
            Directive::Poll => "poll",
        }
    }

    /// The note mode this directive writes to, if any.
    pub fn mode(&self) -> Option<NoteMode> {
        match self {
            Directive::Press(_) | Directive::Release(_) => Some(NoteMode::Digital),
            Directive::Make(..) | Directive::Break(..) => Some(NoteMode::Velocity),
            Directive::Poll => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub directive: Directive,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: unknown directive `{word}`")]
    UnknownDirective { line: usize, word: String },

    #[error("line {line}: `{directive}` takes {expected} argument(s), got {got}")]
    Arity {
        line: usize,
        directive: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: invalid {what} `{value}`")]
    InvalidNumber {
        line: usize,
        what: &'static str,
        value: String,
    },

    #[error("line {line}: pitch {pitch} is outside 0-127")]
    PitchOutOfRange { line: usize, pitch: u32 },

    #[error("line {line}: `{directive}` needs {needed:?} keys but the keybed is in {mode:?} mode")]
    WrongMode {
        line: usize,
        directive: &'static str,
        needed: NoteMode,
        mode: NoteMode,
    },
}

pub fn parse(source: &str) -> Result<Vec<Line>, ScriptError> {
    let mut lines = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let number = i + 1;
        let text = raw.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }

        let mut words = text.split_whitespace();
        let Some(word) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        let directive = match word {
            "press" => Directive::Press(pitch_arg(number, "press", &args)?),
            "release" => Directive::Release(pitch_arg(number, "release", &args)?),
            "make" => {
                let (pitch, time) = timed_args(number, "make", &args)?;
                Directive::Make(pitch, time)
            }
            "break" => {
                let (pitch, time) = timed_args(number, "break", &args)?;
                Directive::Break(pitch, time)
            }
            "poll" => {
                expect_args(number, "poll", &args, 0)?;
                Directive::Poll
            }
            other => {
                return Err(ScriptError::UnknownDirective {
                    line: number,
                    word: other.to_string(),
                });
            }
        };

        lines.push(Line { number, directive });
    }

    Ok(lines)
}

fn expect_args(line: usize, directive: &'static str, args: &[&str], expected: usize) -> Result<(), ScriptError> {
    if args.len() != expected {
        return Err(ScriptError::Arity {
            line,
            directive,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn pitch_arg(line: usize, directive: &'static str, args: &[&str]) -> Result<u8, ScriptError> {
    expect_args(line, directive, args, 1)?;
    parse_pitch(line, args[0])
}

fn timed_args(line: usize, directive: &'static str, args: &[&str]) -> Result<(u8, Timestamp), ScriptError> {
    expect_args(line, directive, args, 2)?;
    let pitch = parse_pitch(line, args[0])?;
    let time = args[1].parse::<Timestamp>().map_err(|_| ScriptError::InvalidNumber {
        line,
        what: "timestamp",
        value: args[1].to_string(),
    })?;
    Ok((pitch, time))
}

fn parse_pitch(line: usize, value: &str) -> Result<u8, ScriptError> {
    let pitch = value.parse::<u32>().map_err(|_| ScriptError::InvalidNumber {
        line,
        what: "pitch",
        value: value.to_string(),
    })?;
    if pitch > 127 {
        return Err(ScriptError::PitchOutOfRange { line, pitch });
    }
    Ok(pitch as u8)
}

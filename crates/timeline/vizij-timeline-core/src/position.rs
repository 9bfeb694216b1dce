//! Placement of a child inside a timeline.
//!
//! | input        | meaning                                         |
//! |--------------|-------------------------------------------------|
//! | `2.5`        | absolute time                                   |
//! | `"+=1"`      | one second after the timeline's current end     |
//! | `"-=0.5"`    | overlap the end by half a second                |
//! | `"<"`, `"<1"`| start of the previously added child (+ offset)  |
//! | `">"`, `">-1"`| end of the previously added child (+ offset)   |
//! | `"intro"`    | label time (created at the end if unknown)      |
//! | `"intro+=2"` | label time + 2                                  |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Position {
    Absolute(f64),
    /// Relative to the timeline's end.
    End(f64),
    PrevStart(f64),
    PrevEnd(f64),
    Label { name: String, offset: f64 },
}

impl Default for Position {
    fn default() -> Self {
        Position::End(0.0)
    }
}

impl Position {
    pub fn label(name: impl Into<String>) -> Self {
        Position::Label {
            name: name.into(),
            offset: 0.0,
        }
    }
}

impl From<f64> for Position {
    fn from(t: f64) -> Self {
        Position::Absolute(t)
    }
}

/// Lenient conversion used by the engine's `impl Into<Position>` arguments:
/// an unparseable string logs a warning and places at the timeline end.
impl From<&str> for Position {
    fn from(input: &str) -> Self {
        input.parse().unwrap_or_else(|err| {
            log::warn!("{err}; placing at the end");
            Position::default()
        })
    }
}

impl From<String> for Position {
    fn from(input: String) -> Self {
        Position::from(input.as_str())
    }
}

fn invalid(input: &str, reason: &str) -> TimelineError {
    TimelineError::InvalidPosition {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse an offset suffix: `""`, `"+=N"`, `"-=N"`, or a bare signed number.
fn parse_offset(input: &str, rest: &str) -> Result<f64, TimelineError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(0.0);
    }
    let (sign, num) = if let Some(n) = rest.strip_prefix("+=") {
        (1.0, n)
    } else if let Some(n) = rest.strip_prefix("-=") {
        (-1.0, n)
    } else {
        (1.0, rest)
    };
    num.trim()
        .parse::<f64>()
        .map(|v| sign * v)
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(input, "offset is not a number"))
}

impl FromStr for Position {
    type Err = TimelineError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Ok(Position::default());
        }
        if let Some(rest) = s.strip_prefix('<') {
            return parse_offset(input, rest).map(Position::PrevStart);
        }
        if let Some(rest) = s.strip_prefix('>') {
            return parse_offset(input, rest).map(Position::PrevEnd);
        }
        if s.starts_with("+=") || s.starts_with("-=") {
            return parse_offset(input, s).map(Position::End);
        }
        if let Ok(t) = s.parse::<f64>() {
            if !t.is_finite() {
                return Err(invalid(input, "time is not finite"));
            }
            return Ok(Position::Absolute(t));
        }
        let split = s.find("+=").or_else(|| s.find("-="));
        let (name, offset) = match split {
            Some(i) => (&s[..i], parse_offset(input, &s[i..])?),
            None => (s, 0.0),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid(input, "empty label"));
        }
        Ok(Position::Label {
            name: name.to_string(),
            offset,
        })
    }
}

fn write_offset(f: &mut fmt::Formatter<'_>, offset: f64) -> fmt::Result {
    if offset > 0.0 {
        write!(f, "+={offset}")
    } else if offset < 0.0 {
        write!(f, "-={}", -offset)
    } else {
        Ok(())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Absolute(t) => write!(f, "{t}"),
            Position::End(offset) => {
                if *offset == 0.0 {
                    write!(f, "+=0")
                } else {
                    write_offset(f, *offset)
                }
            }
            Position::PrevStart(offset) => {
                write!(f, "<")?;
                write_offset(f, *offset)
            }
            Position::PrevEnd(offset) => {
                write!(f, ">")?;
                write_offset(f, *offset)
            }
            Position::Label { name, offset } => {
                write!(f, "{name}")?;
                write_offset(f, *offset)
            }
        }
    }
}

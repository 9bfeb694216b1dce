//! Start/end edges of a scroll region and their resolution to pixels.
//!
//! | input              | meaning                                                   |
//! |--------------------|-----------------------------------------------------------|
//! | `120`, `"120px"`   | absolute scroll offset                                    |
//! | `"50%"`            | half the viewport height, as an absolute scroll offset    |
//! | `"top bottom"`     | element top meets viewport bottom                         |
//! | `"center 40%"`     | element center meets the line 40% down the viewport       |
//! | `"top bottom-=100"`| element top meets the line 100px above the viewport bottom|
//! | `"+=300"`          | (end only) 300px after the resolved start                 |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ScrollError, ScrollResult};

/// Geometry the edges are resolved against. All values are in scroll pixels;
/// `element_top` is the element's offset from the top of the scroll content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub viewport_height: f64,
    pub element_top: f64,
    pub element_height: f64,
}

impl Layout {
    pub fn new(viewport_height: f64, element_top: f64, element_height: f64) -> Self {
        Self {
            viewport_height,
            element_top,
            element_height,
        }
    }
}

/// A point along an element or the viewport: `fraction * size + pixels`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub fraction: f64,
    pub pixels: f64,
}

impl Anchor {
    pub const TOP: Anchor = Anchor {
        fraction: 0.0,
        pixels: 0.0,
    };
    pub const CENTER: Anchor = Anchor {
        fraction: 0.5,
        pixels: 0.0,
    };
    pub const BOTTOM: Anchor = Anchor {
        fraction: 1.0,
        pixels: 0.0,
    };

    #[inline]
    pub fn resolve(self, size: f64) -> f64 {
        self.fraction * size + self.pixels
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Edge {
    Pixels(f64),
    /// Percentage of the viewport height.
    Percent(f64),
    /// Scroll offset at which `element` lines up with `viewport`.
    Meet { element: Anchor, viewport: Anchor },
    /// Offset from the resolved start. Only meaningful for an end edge; as a
    /// start it resolves against zero.
    Relative(f64),
}

impl Edge {
    pub fn meet(element: Anchor, viewport: Anchor) -> Self {
        Edge::Meet { element, viewport }
    }

    /// Resolve to a scroll offset. `start` is the already resolved start edge
    /// when resolving an end.
    pub fn resolve(&self, layout: &Layout, start: Option<f64>) -> f64 {
        match *self {
            Edge::Pixels(px) => px,
            Edge::Percent(pct) => pct / 100.0 * layout.viewport_height,
            Edge::Meet { element, viewport } => {
                layout.element_top + element.resolve(layout.element_height)
                    - viewport.resolve(layout.viewport_height)
            }
            Edge::Relative(offset) => start.unwrap_or(0.0) + offset,
        }
    }
}

impl From<f64> for Edge {
    fn from(px: f64) -> Self {
        Edge::Pixels(px)
    }
}

fn invalid(input: &str, reason: &str) -> ScrollError {
    ScrollError::InvalidEdge {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number(input: &str, text: &str) -> ScrollResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(input, "not a number"))
}

/// `top`, `center`, `bottom`, `N%`, `Npx` or `N`, optionally followed by
/// `+=N` / `-=N` pixels.
fn parse_anchor(input: &str, token: &str) -> ScrollResult<Anchor> {
    let split = token.find("+=").or_else(|| token.find("-="));
    let (base, offset) = match split {
        Some(0) => return Err(invalid(input, "offset without an anchor")),
        Some(i) => {
            let sign = if token[i..].starts_with('-') { -1.0 } else { 1.0 };
            (&token[..i], sign * parse_number(input, &token[i + 2..])?)
        }
        None => (token, 0.0),
    };
    let mut anchor = match base {
        "top" => Anchor::TOP,
        "center" => Anchor::CENTER,
        "bottom" => Anchor::BOTTOM,
        _ => {
            if let Some(pct) = base.strip_suffix('%') {
                Anchor {
                    fraction: parse_number(input, pct)? / 100.0,
                    pixels: 0.0,
                }
            } else {
                let px = base.strip_suffix("px").unwrap_or(base);
                Anchor {
                    fraction: 0.0,
                    pixels: parse_number(input, px)?,
                }
            }
        }
    };
    anchor.pixels += offset;
    Ok(anchor)
}

impl FromStr for Edge {
    type Err = ScrollError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(invalid(input, "empty edge"));
        }
        let tokens: Vec<&str> = s.split_whitespace().collect();
        match tokens.as_slice() {
            [single] => {
                if let Some(n) = single.strip_prefix("+=") {
                    return parse_number(input, n).map(Edge::Relative);
                }
                if let Some(n) = single.strip_prefix("-=") {
                    return parse_number(input, n).map(|v| Edge::Relative(-v));
                }
                if let Some(pct) = single.strip_suffix('%') {
                    return parse_number(input, pct).map(Edge::Percent);
                }
                let px = single.strip_suffix("px").unwrap_or(single);
                parse_number(input, px).map(Edge::Pixels)
            }
            [element, viewport] => Ok(Edge::Meet {
                element: parse_anchor(input, element)?,
                viewport: parse_anchor(input, viewport)?,
            }),
            _ => Err(invalid(input, "expected one value or an element/viewport pair")),
        }
    }
}

fn write_anchor(f: &mut fmt::Formatter<'_>, anchor: Anchor) -> fmt::Result {
    if anchor.fraction == 0.0 && anchor.pixels != 0.0 {
        return write!(f, "{}px", anchor.pixels);
    }
    if anchor.fraction == 0.0 {
        write!(f, "top")?;
    } else if anchor.fraction == 0.5 {
        write!(f, "center")?;
    } else if anchor.fraction == 1.0 {
        write!(f, "bottom")?;
    } else {
        write!(f, "{}%", anchor.fraction * 100.0)?;
    }
    if anchor.pixels > 0.0 {
        write!(f, "+={}", anchor.pixels)
    } else if anchor.pixels < 0.0 {
        write!(f, "-={}", -anchor.pixels)
    } else {
        Ok(())
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Edge::Pixels(px) => write!(f, "{px}px"),
            Edge::Percent(pct) => write!(f, "{pct}%"),
            Edge::Meet { element, viewport } => {
                write_anchor(f, element)?;
                write!(f, " ")?;
                write_anchor(f, viewport)
            }
            Edge::Relative(offset) if offset < 0.0 => write!(f, "-={}", -offset),
            Edge::Relative(offset) => write!(f, "+={offset}"),
        }
    }
}

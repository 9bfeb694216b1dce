//! Easing functions: pure maps from linear progress in [0, 1] to eased progress.
//!
//! Names follow the familiar "family.direction" convention:
//! `none`/`linear`, `power0`..`power4` (aliases `quad`, `cubic`, `quart`,
//! `quint`, `strong`), `sine`, `expo`, `circ`, `back(overshoot)`,
//! `elastic(amplitude, period)`, `bounce`, each with `.in`, `.out` (default)
//! or `.inOut`; plus `steps(n)`, `cubic-bezier(x1, y1, x2, y2)` and the CSS
//! keywords `ease`, `ease-in`, `ease-out`, `ease-in-out`.
//!
//! ```
//! use vizij_timeline_core::Easing;
//!
//! let ease: Easing = "power2.inOut".parse().unwrap();
//! assert_eq!(ease.evaluate(0.5), 0.5);
//! ```

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const DEFAULT_OVERSHOOT: f64 = 1.70158;
const DEFAULT_AMPLITUDE: f64 = 1.0;
const DEFAULT_PERIOD: f64 = 0.3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EaseDir {
    In,
    Out,
    InOut,
}

impl EaseDir {
    fn name(self) -> &'static str {
        match self {
            EaseDir::In => "in",
            EaseDir::Out => "out",
            EaseDir::InOut => "inOut",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    Linear,
    /// Polynomial of degree `power + 1`; `power` is 0..=4.
    Power { power: u8, dir: EaseDir },
    Sine(EaseDir),
    Expo(EaseDir),
    Circ(EaseDir),
    Back { overshoot: f64, dir: EaseDir },
    Elastic { amplitude: f64, period: f64, dir: EaseDir },
    Bounce(EaseDir),
    /// Discrete jumps; reaches 1 only at the end.
    Steps(u32),
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Power {
            power: 1,
            dir: EaseDir::Out,
        }
    }
}

/// Error returned for an unrecognised ease name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised easing: {0:?}")]
pub struct UnknownEasing(pub String);

impl Easing {
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Easing::CubicBezier {
            x1: x1.clamp(0.0, 1.0),
            y1,
            x2: x2.clamp(0.0, 1.0),
            y2,
        }
    }

    /// Evaluate at linear progress `p`. Input is clamped to [0, 1] and the
    /// endpoints map exactly to 0 and 1.
    pub fn evaluate(&self, p: f64) -> f64 {
        if p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return 1.0;
        }
        match *self {
            Easing::Linear => p,
            Easing::Power { power, dir } => {
                let exp = i32::from(power.min(4)) + 1;
                apply_dir(dir, p, |x| x.powi(exp))
            }
            Easing::Sine(dir) => apply_dir(dir, p, |x| 1.0 - (x * FRAC_PI_2).cos()),
            Easing::Expo(dir) => apply_dir(dir, p, |x| {
                if x == 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * (x - 1.0))
                }
            }),
            Easing::Circ(dir) => apply_dir(dir, p, |x| 1.0 - (1.0 - x * x).max(0.0).sqrt()),
            Easing::Back { overshoot, dir } => {
                apply_dir(dir, p, |x| x * x * ((overshoot + 1.0) * x - overshoot))
            }
            Easing::Elastic {
                amplitude,
                period,
                dir,
            } => apply_dir(dir, p, |x| 1.0 - elastic_out(1.0 - x, amplitude, period)),
            Easing::Bounce(dir) => apply_dir(dir, p, |x| 1.0 - bounce_out(1.0 - x)),
            Easing::Steps(n) => {
                let n = f64::from(n.max(1));
                (p * n).floor() / n
            }
            Easing::CubicBezier { x1, y1, x2, y2 } => bezier_ease(p, x1, y1, x2, y2),
        }
    }

    /// Parse a name, logging a warning and returning `None` when unknown.
    pub fn parse_lenient(name: &str) -> Option<Easing> {
        match name.parse() {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("{err}; falling back to the default ease");
                None
            }
        }
    }
}

/// Build the requested direction from an ease-in curve.
#[inline]
fn apply_dir(dir: EaseDir, p: f64, ease_in: impl Fn(f64) -> f64) -> f64 {
    match dir {
        EaseDir::In => ease_in(p),
        EaseDir::Out => 1.0 - ease_in(1.0 - p),
        EaseDir::InOut => {
            if p < 0.5 {
                ease_in(p * 2.0) / 2.0
            } else {
                1.0 - ease_in((1.0 - p) * 2.0) / 2.0
            }
        }
    }
}

fn elastic_out(p: f64, amplitude: f64, period: f64) -> f64 {
    if p <= 0.0 {
        return 0.0;
    }
    let amplitude = amplitude.max(1.0);
    let period = if period > 0.0 { period } else { DEFAULT_PERIOD };
    let shift = period / TAU * (1.0 / amplitude).asin();
    amplitude * 2f64.powf(-10.0 * p) * ((p - shift) * (TAU / period)).sin() + 1.0
}

fn bounce_out(p: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if p < 1.0 / D1 {
        N1 * p * p
    } else if p < 2.0 / D1 {
        let p = p - 1.5 / D1;
        N1 * p * p + 0.75
    } else if p < 2.5 / D1 {
        let p = p - 2.25 / D1;
        N1 * p * p + 0.9375
    } else {
        let p = p - 2.625 / D1;
        N1 * p * p + 0.984375
    }
}

#[inline]
fn bezier_component(c1: f64, c2: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    3.0 * u * u * t * c1 + 3.0 * u * t * t * c2 + t * t * t
}

/// Invert x(t) = p by bisection, then evaluate y at that t.
fn bezier_ease(p: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    let mut mid = p;
    for _ in 0..40 {
        mid = 0.5 * (lo + hi);
        let x = bezier_component(x1, x2, mid);
        if (x - p).abs() < 1e-9 {
            break;
        }
        if x < p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    bezier_component(y1, y2, mid)
}

fn parse_dir(s: Option<&str>) -> Option<EaseDir> {
    match s.map(str::to_ascii_lowercase).as_deref() {
        None | Some("out") | Some("easeout") => Some(EaseDir::Out),
        Some("in") | Some("easein") => Some(EaseDir::In),
        Some("inout") | Some("easeinout") => Some(EaseDir::InOut),
        _ => None,
    }
}

fn parse_args(args: Option<&str>) -> Result<Vec<f64>, ()> {
    let Some(args) = args else {
        return Ok(Vec::new());
    };
    args.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| a.parse::<f64>().map_err(|_| ()))
        .collect()
}

impl FromStr for Easing {
    type Err = UnknownEasing;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownEasing(input.to_string());
        let s = input.trim();
        let (head, args) = match s.find('(') {
            Some(open) => {
                let close = s.rfind(')').filter(|c| *c > open).ok_or_else(unknown)?;
                (&s[..open], Some(&s[open + 1..close]))
            }
            None => (s, None),
        };
        let args = parse_args(args).map_err(|_| unknown())?;
        let head_lower = head.to_ascii_lowercase();
        let mut parts = head_lower.splitn(2, '.');
        let family = parts.next().unwrap_or_default();
        let dir = parse_dir(parts.next()).ok_or_else(unknown)?;
        let arg = |i: usize, default: f64| args.get(i).copied().unwrap_or(default);

        let ease = match family {
            "none" | "linear" | "power0" => Easing::Linear,
            "power1" | "quad" => Easing::Power { power: 1, dir },
            "power2" | "cubic" => Easing::Power { power: 2, dir },
            "power3" | "quart" => Easing::Power { power: 3, dir },
            "power4" | "quint" | "strong" => Easing::Power { power: 4, dir },
            "sine" => Easing::Sine(dir),
            "expo" => Easing::Expo(dir),
            "circ" => Easing::Circ(dir),
            "back" => Easing::Back {
                overshoot: arg(0, DEFAULT_OVERSHOOT),
                dir,
            },
            "elastic" => Easing::Elastic {
                amplitude: arg(0, DEFAULT_AMPLITUDE),
                period: arg(1, DEFAULT_PERIOD),
                dir,
            },
            "bounce" => Easing::Bounce(dir),
            "steps" => {
                let n = arg(0, 1.0);
                if n < 1.0 || n.fract() != 0.0 {
                    return Err(unknown());
                }
                Easing::Steps(n as u32)
            }
            "cubic-bezier" if args.len() == 4 => {
                Easing::cubic_bezier(args[0], args[1], args[2], args[3])
            }
            "ease" => Easing::cubic_bezier(0.25, 0.1, 0.25, 1.0),
            "ease-in" => Easing::cubic_bezier(0.42, 0.0, 1.0, 1.0),
            "ease-out" => Easing::cubic_bezier(0.0, 0.0, 0.58, 1.0),
            "ease-in-out" => Easing::cubic_bezier(0.42, 0.0, 0.58, 1.0),
            _ => return Err(unknown()),
        };
        Ok(ease)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Easing::Linear => write!(f, "none"),
            Easing::Power { power, dir } => write!(f, "power{power}.{}", dir.name()),
            Easing::Sine(dir) => write!(f, "sine.{}", dir.name()),
            Easing::Expo(dir) => write!(f, "expo.{}", dir.name()),
            Easing::Circ(dir) => write!(f, "circ.{}", dir.name()),
            Easing::Back { overshoot, dir } => write!(f, "back.{}({overshoot})", dir.name()),
            Easing::Elastic {
                amplitude,
                period,
                dir,
            } => write!(f, "elastic.{}({amplitude},{period})", dir.name()),
            Easing::Bounce(dir) => write!(f, "bounce.{}", dir.name()),
            Easing::Steps(n) => write!(f, "steps({n})"),
            Easing::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({x1},{y1},{x2},{y2})")
            }
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = UnknownEasing;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(value: Easing) -> Self {
        value.to_string()
    }
}

//! Construction parameters for tweens and timelines.
//!
//! ```
//! use vizij_timeline_core::TweenVars;
//!
//! let vars = TweenVars::new()
//!     .prop("x", 100.0)
//!     .prop("y", "+=20")
//!     .duration(1.5)
//!     .ease("power2.inOut")
//!     .repeat(1)
//!     .yoyo(true);
//! # let _ = vars;
//! ```

use serde::{Deserialize, Serialize};
use vizij_api_core::{format_number, ComplexString, Value};

use crate::callbacks::{callback_setters, Callbacks};
use crate::easing::Easing;

/// How a new tween treats other tweens animating the same targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overwrite {
    /// Never touch other tweens.
    None,
    /// On first render, take over conflicting properties from tweens that are
    /// active at that moment.
    #[default]
    Auto,
    /// At creation, kill every other tween of the same targets.
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelOp {
    Add,
    Sub,
    Mul,
}

/// An end (or start) value for one property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    Absolute(Value),
    /// `"+=N"`, `"-=N"` or `"*=N"`, applied to the value read from the target.
    Relative(RelOp, f32),
}

impl PropValue {
    /// Resolve against the value the target currently holds.
    pub fn resolve(&self, current: &Value) -> Value {
        match self {
            PropValue::Absolute(v) => v.clone(),
            PropValue::Relative(op, amount) => apply_relative(current, *op, *amount),
        }
    }

    fn parse_relative(s: &str) -> Option<Self> {
        let s = s.trim();
        let op = match s.get(..2)? {
            "+=" => RelOp::Add,
            "-=" => RelOp::Sub,
            "*=" => RelOp::Mul,
            _ => return None,
        };
        let amount = s[2..].trim().parse::<f32>().ok()?;
        Some(PropValue::Relative(op, amount))
    }
}

#[inline]
fn apply_op(v: f32, op: RelOp, amount: f32) -> f32 {
    match op {
        RelOp::Add => v + amount,
        RelOp::Sub => v - amount,
        RelOp::Mul => v * amount,
    }
}

fn apply_relative(current: &Value, op: RelOp, amount: f32) -> Value {
    match current {
        Value::Text(s) => match ComplexString::parse(s) {
            Ok(parsed) => {
                let nums: Vec<f32> = parsed
                    .numbers()
                    .iter()
                    .map(|n| apply_op(*n, op, amount))
                    .collect();
                Value::Text(parsed.render(&nums))
            }
            // No number to offset: treat the text as zero.
            Err(_) => Value::Text(format_number(apply_op(0.0, op, amount))),
        },
        Value::Bool(b) => Value::Bool(*b),
        other => {
            let comps: Vec<f32> = other
                .components()
                .unwrap_or_default()
                .iter()
                .map(|c| apply_op(*c, op, amount))
                .collect();
            Value::from_components(other.kind(), &comps).unwrap_or_else(|| other.clone())
        }
    }
}

impl From<Value> for PropValue {
    fn from(v: Value) -> Self {
        match &v {
            Value::Text(s) => PropValue::parse_relative(s).unwrap_or(PropValue::Absolute(v)),
            _ => PropValue::Absolute(v),
        }
    }
}

impl From<f32> for PropValue {
    fn from(v: f32) -> Self {
        PropValue::Absolute(Value::Float(v))
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Absolute(Value::Float(v as f32))
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Absolute(Value::Bool(v))
    }
}

impl From<[f32; 3]> for PropValue {
    fn from(v: [f32; 3]) -> Self {
        PropValue::Absolute(Value::Vec3(v))
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::from(Value::Text(s.to_string()))
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::from(Value::Text(s))
    }
}

/// Full per-property entry: end value, optional start override, optional
/// ease override. An absent `end` means "the value the target holds at
/// first render" (used by `from` tweens).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropSpec {
    pub end: Option<PropValue>,
    pub start: Option<PropValue>,
    pub ease: Option<Easing>,
}

impl PropSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn end(mut self, v: impl Into<PropValue>) -> Self {
        self.end = Some(v.into());
        self
    }

    pub fn start(mut self, v: impl Into<PropValue>) -> Self {
        self.start = Some(v.into());
        self
    }

    pub fn ease(mut self, name: &str) -> Self {
        self.ease = Easing::parse_lenient(name);
        self
    }

    pub fn easing(mut self, ease: Easing) -> Self {
        self.ease = Some(ease);
        self
    }
}

/// Where stagger offsets are measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaggerFrom {
    #[default]
    Start,
    End,
    Center,
    Index(usize),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stagger {
    /// Seconds between consecutive targets.
    pub each: f64,
    /// Total spread; overrides `each` when set.
    pub amount: Option<f64>,
    pub from: StaggerFrom,
}

impl Stagger {
    pub fn each(each: f64) -> Self {
        Self {
            each,
            ..Self::default()
        }
    }

    pub fn amount(amount: f64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn origin(mut self, from: StaggerFrom) -> Self {
        self.from = from;
        self
    }

    /// Offset in seconds of item `index` out of `count`.
    pub fn offset(&self, index: usize, count: usize) -> f64 {
        let distance = |i: usize| -> f64 {
            let i = i as f64;
            let last = count.saturating_sub(1) as f64;
            match self.from {
                StaggerFrom::Start => i,
                StaggerFrom::End => last - i,
                StaggerFrom::Center => (i - last / 2.0).abs(),
                StaggerFrom::Index(k) => (i - k as f64).abs(),
            }
        };
        let each = match self.amount {
            Some(amount) => {
                let max = (0..count).map(distance).fold(0.0f64, f64::max);
                if max > 0.0 {
                    amount / max
                } else {
                    0.0
                }
            }
            None => self.each,
        };
        distance(index) * each
    }
}

/// Timing parameters shared by tweens and timelines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub delay: f64,
    /// Extra cycles; -1 repeats forever.
    pub repeat: i32,
    pub repeat_delay: f64,
    pub yoyo: bool,
    pub time_scale: f64,
    pub paused: bool,
    pub reversed: bool,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            delay: 0.0,
            repeat: 0,
            repeat_delay: 0.0,
            yoyo: false,
            time_scale: 1.0,
            paused: false,
            reversed: false,
        }
    }
}

macro_rules! timing_setters {
    ($ty:ty) => {
        impl $ty {
            pub fn delay(mut self, seconds: f64) -> Self {
                self.timing.delay = seconds;
                self
            }

            pub fn repeat(mut self, count: i32) -> Self {
                self.timing.repeat = count.max(-1);
                self
            }

            pub fn repeat_delay(mut self, seconds: f64) -> Self {
                self.timing.repeat_delay = seconds.max(0.0);
                self
            }

            pub fn yoyo(mut self, yoyo: bool) -> Self {
                self.timing.yoyo = yoyo;
                self
            }

            pub fn time_scale(mut self, scale: f64) -> Self {
                self.timing.time_scale = scale;
                self
            }

            pub fn paused(mut self, paused: bool) -> Self {
                self.timing.paused = paused;
                self
            }

            pub fn reversed(mut self, reversed: bool) -> Self {
                self.timing.reversed = reversed;
                self
            }

            pub fn repeat_refresh(mut self, refresh: bool) -> Self {
                self.repeat_refresh = refresh;
                self
            }
        }
    };
}

/// Parameters for a tween.
#[derive(Debug, Default)]
pub struct TweenVars {
    pub(crate) props: Vec<(String, PropSpec)>,
    pub(crate) duration: Option<f64>,
    pub(crate) ease: Option<Easing>,
    pub(crate) yoyo_ease: Option<Easing>,
    pub(crate) timing: Timing,
    pub(crate) repeat_refresh: bool,
    pub(crate) immediate_render: Option<bool>,
    pub(crate) overwrite: Option<Overwrite>,
    pub(crate) stagger: Option<Stagger>,
    pub(crate) callbacks: Callbacks,
}

impl TweenVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animate `name` to `end`. Setting the same property twice replaces it.
    pub fn prop(self, name: impl Into<String>, end: impl Into<PropValue>) -> Self {
        self.prop_spec(name, PropSpec::new().end(end))
    }

    pub fn prop_spec(mut self, name: impl Into<String>, spec: PropSpec) -> Self {
        let name = name.into();
        match self.props.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.props.push((name, spec)),
        }
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Ease by name; an unknown name logs a warning and keeps the default.
    pub fn ease(mut self, name: &str) -> Self {
        self.ease = Easing::parse_lenient(name);
        self
    }

    pub fn easing(mut self, ease: Easing) -> Self {
        self.ease = Some(ease);
        self
    }

    /// Ease used on odd (backward) yoyo cycles.
    pub fn yoyo_ease(mut self, name: &str) -> Self {
        self.yoyo_ease = Easing::parse_lenient(name);
        self
    }

    pub fn immediate_render(mut self, immediate: bool) -> Self {
        self.immediate_render = Some(immediate);
        self
    }

    pub fn overwrite(mut self, mode: Overwrite) -> Self {
        self.overwrite = Some(mode);
        self
    }

    pub fn stagger(mut self, stagger: Stagger) -> Self {
        self.stagger = Some(stagger);
        self
    }

    /// Property names, in declaration order.
    pub fn prop_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.props.iter().map(|(n, _)| n.as_str())
    }
}

timing_setters!(TweenVars);
callback_setters!(TweenVars);

/// Defaults a timeline hands to tweens created through it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TweenDefaults {
    pub ease: Option<Easing>,
    pub duration: Option<f64>,
}

/// Parameters for a timeline.
#[derive(Debug, Default)]
pub struct TimelineVars {
    pub(crate) timing: Timing,
    pub(crate) repeat_refresh: bool,
    pub(crate) smooth_child_timing: bool,
    pub(crate) auto_remove_children: bool,
    pub(crate) defaults: TweenDefaults,
    pub(crate) callbacks: Callbacks,
}

impl TimelineVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn smooth_child_timing(mut self, smooth: bool) -> Self {
        self.smooth_child_timing = smooth;
        self
    }

    pub fn auto_remove_children(mut self, auto_remove: bool) -> Self {
        self.auto_remove_children = auto_remove;
        self
    }

    pub fn defaults(mut self, defaults: TweenDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

timing_setters!(TimelineVars);
callback_setters!(TimelineVars);

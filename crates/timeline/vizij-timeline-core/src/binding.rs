//! Property bindings: one animated property on one target.
//!
//! A binding is built once when its tween initialises: the start value is read
//! from the target, the end is resolved against it, and the pair is reduced to
//! an interpolation kind. Rendering then only evaluates `start + delta * ratio`.

use vizij_api_core::coercion::coerce_like;
use vizij_api_core::{ComplexString, Value, ValueKind};

use crate::easing::Easing;
use crate::target::{Target, TargetKey};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[derive(Clone, Debug)]
enum Interp {
    /// Fixed-width numeric kinds (float, vectors, colour).
    Numeric {
        kind: ValueKind,
        start: [f32; 4],
        end: [f32; 4],
        len: usize,
    },
    /// Text with embedded numbers sharing one skeleton.
    Complex {
        skeleton: ComplexString,
        start: Vec<f32>,
        end: Vec<f32>,
    },
    /// Non-interpolating: start until the ratio reaches 1.
    Step { start: Value, end: Value },
}

impl Interp {
    fn between(start: &Value, end: &Value) -> Interp {
        let end = coerce_end(start, end);
        match (start, &end) {
            (Value::Text(a), Value::Text(b)) => match ComplexString::parse_pair(a, b) {
                Ok((sa, sb)) => Interp::Complex {
                    start: sa.numbers().to_vec(),
                    end: sb.numbers().to_vec(),
                    skeleton: sa,
                },
                Err(err) => {
                    log::debug!("{err}; binding snaps at the end");
                    Interp::Step {
                        start: start.clone(),
                        end,
                    }
                }
            },
            _ => match (start.components(), end.components()) {
                (Some(a), Some(b)) if a.len() == b.len() && start.kind() == end.kind() => {
                    let mut s = [0.0; 4];
                    let mut e = [0.0; 4];
                    s[..a.len()].copy_from_slice(a);
                    e[..b.len()].copy_from_slice(b);
                    Interp::Numeric {
                        kind: start.kind(),
                        start: s,
                        end: e,
                        len: a.len(),
                    }
                }
                _ => Interp::Step {
                    start: start.clone(),
                    end,
                },
            },
        }
    }
}

/// Reshape the end value to the start's kind where that is meaningful.
/// A plain number against single-number text keeps the text's units.
fn coerce_end(start: &Value, end: &Value) -> Value {
    if let (Value::Text(s), Value::Float(f)) = (start, end) {
        if let Ok(parsed) = ComplexString::parse(s) {
            if parsed.numbers().len() == 1 {
                return Value::Text(parsed.render(&[*f]));
            }
        }
    }
    coerce_like(end, start).unwrap_or_else(|| end.clone())
}

#[derive(Clone, Debug)]
pub(crate) struct PropertyBinding {
    pub target: Target,
    pub key: TargetKey,
    pub property: String,
    /// Per-property ease; `None` uses the tween's ratio.
    pub ease: Option<Easing>,
    interp: Interp,
}

impl PropertyBinding {
    pub fn new(
        target: Target,
        property: String,
        start: &Value,
        end: &Value,
        ease: Option<Easing>,
    ) -> Self {
        Self {
            key: target.key(),
            target,
            property,
            ease,
            interp: Interp::between(start, end),
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self.interp, Interp::Step { .. })
    }

    pub fn value_at(&self, ratio: f32) -> Value {
        match &self.interp {
            Interp::Numeric {
                kind,
                start,
                end,
                len,
            } => {
                let mut out = [0.0f32; 4];
                for i in 0..*len {
                    out[i] = lerp_f32(start[i], end[i], ratio);
                }
                // Exact endpoints; lerp can drift by an ulp at ratio 1.
                if ratio == 1.0 {
                    out = *end;
                }
                Value::from_components(*kind, &out[..*len]).unwrap_or(Value::Float(out[0]))
            }
            Interp::Complex {
                skeleton,
                start,
                end,
            } => {
                let nums: Vec<f32> = start
                    .iter()
                    .zip(end)
                    .map(|(a, b)| if ratio == 1.0 { *b } else { lerp_f32(*a, *b, ratio) })
                    .collect();
                Value::Text(skeleton.render(&nums))
            }
            Interp::Step { start, end } => {
                if ratio >= 1.0 {
                    end.clone()
                } else {
                    start.clone()
                }
            }
        }
    }

    /// Write the value at `ratio` to the target.
    pub fn apply(&self, ratio: f32) -> bool {
        self.target.set(&self.property, self.value_at(ratio))
    }

    #[inline]
    pub fn matches(&self, key: TargetKey, property: &str) -> bool {
        self.key == key && self.property == property
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::target::PropertyMap;

    fn bind(start: Value, end: Value) -> (Rc<RefCell<PropertyMap>>, PropertyBinding) {
        let map = Rc::new(RefCell::new(PropertyMap::new()));
        let b = PropertyBinding::new(Target::map(&map), "p".into(), &start, &end, None);
        (map, b)
    }

    #[test]
    fn numeric_kinds_interpolate() {
        let (_m, b) = bind(Value::vec3(0.0, 10.0, 20.0), Value::vec3(10.0, 10.0, 0.0));
        assert_eq!(b.value_at(0.5), Value::vec3(5.0, 10.0, 10.0));
        let (_m, b) = bind(Value::vec3(0.0, 0.0, 0.0), Value::Float(4.0));
        assert_eq!(b.value_at(0.25), Value::vec3(1.0, 1.0, 1.0));
    }

    #[test]
    fn complex_strings_interpolate_per_number() {
        let (_m, b) = bind(Value::text("rgba(0,0,0,0)"), Value::text("rgba(100,50,0,1)"));
        assert_eq!(b.value_at(0.5), Value::text("rgba(50,25,0,0.5)"));
    }

    #[test]
    fn unit_is_kept_for_plain_number_ends() {
        let (_m, b) = bind(Value::text("10px"), Value::Float(20.0));
        assert_eq!(b.value_at(0.5), Value::text("15px"));
    }

    #[test]
    fn mismatched_skeletons_snap_at_end() {
        let (_m, b) = bind(Value::text("10px"), Value::text("auto"));
        assert!(b.is_step());
        assert_eq!(b.value_at(0.99), Value::text("10px"));
        assert_eq!(b.value_at(1.0), Value::text("auto"));
    }

    #[test]
    fn bools_snap() {
        let (map, b) = bind(Value::Bool(false), Value::Bool(true));
        assert!(b.apply(0.5));
        assert_eq!(map.borrow().get("p"), Some(&Value::Bool(false)));
        assert!(b.apply(1.0));
        assert_eq!(map.borrow().get("p"), Some(&Value::Bool(true)));
    }
}

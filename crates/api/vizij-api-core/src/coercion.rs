//! Coercion helpers between Value shapes.
//! Used when a tween's end value does not share the kind of the value read
//! from the target (e.g. a float end against a vec3 property).

use crate::complex::ComplexString;
use crate::{Value, ValueKind};

/// Attempt to coerce a Value into a scalar f32.
/// Rules:
/// - Float -> its value
/// - Bool -> 1.0 / 0.0
/// - Vec2/3/4, ColorRgba -> first component
/// - Text -> first embedded number, if any
pub fn to_float(v: &Value) -> Option<f32> {
    match v {
        Value::Float(f) => Some(*f),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Vec2(a) => Some(a[0]),
        Value::Vec3(a) => Some(a[0]),
        Value::Vec4(a) | Value::ColorRgba(a) => Some(a[0]),
        Value::Text(s) => ComplexString::parse(s)
            .ok()
            .and_then(|c| c.numbers().first().copied()),
    }
}

/// Convert a Value into a Vec<f32> of its numeric components.
/// Text contributes its embedded numbers; bool contributes 0/1.
pub fn to_vector(v: &Value) -> Vec<f32> {
    match v {
        Value::Bool(b) => vec![if *b { 1.0 } else { 0.0 }],
        Value::Text(s) => ComplexString::parse(s)
            .map(|c| c.numbers().to_vec())
            .unwrap_or_default(),
        other => other.components().map(<[f32]>::to_vec).unwrap_or_default(),
    }
}

/// Reshape `v` into the kind of `like` so both can be interpolated together.
///
/// - same kind -> clone
/// - scalar into a vector kind -> broadcast
/// - numeric text into a float -> first embedded number
/// - vector kinds of equal width (Vec4 <-> ColorRgba) -> relabel
///
/// Returns `None` when no sensible mapping exists; callers then treat the
/// pair as step-only.
pub fn coerce_like(v: &Value, like: &Value) -> Option<Value> {
    let target = like.kind();
    if v.kind() == target {
        return Some(v.clone());
    }
    match (v, target) {
        (_, ValueKind::Float) => to_float(v).map(Value::Float),
        (Value::Float(f), ValueKind::Vec2) => Some(Value::Vec2([*f; 2])),
        (Value::Float(f), ValueKind::Vec3) => Some(Value::Vec3([*f; 3])),
        (Value::Float(f), ValueKind::Vec4) => Some(Value::Vec4([*f; 4])),
        (Value::Float(f), ValueKind::ColorRgba) => Some(Value::ColorRgba([*f; 4])),
        (Value::Vec4(a), ValueKind::ColorRgba) => Some(Value::ColorRgba(*a)),
        (Value::ColorRgba(a), ValueKind::Vec4) => Some(Value::Vec4(*a)),
        (Value::Float(f), ValueKind::Text) => Some(Value::Text(crate::format_number(*f))),
        (Value::Text(s), ValueKind::Vec2 | ValueKind::Vec3 | ValueKind::Vec4) => {
            let nums = ComplexString::parse(s).ok()?.numbers().to_vec();
            Value::from_components(target, &nums)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_broadcasts_into_vectors() {
        let like = Value::vec3(0.0, 0.0, 0.0);
        assert_eq!(
            coerce_like(&Value::Float(2.0), &like),
            Some(Value::vec3(2.0, 2.0, 2.0))
        );
    }

    #[test]
    fn text_with_unit_coerces_to_float() {
        assert_eq!(
            coerce_like(&Value::text("42px"), &Value::Float(0.0)),
            Some(Value::Float(42.0))
        );
        assert_eq!(coerce_like(&Value::text("auto"), &Value::Float(0.0)), None);
    }

    #[test]
    fn bool_has_no_vector_mapping() {
        assert_eq!(coerce_like(&Value::Bool(true), &Value::vec3(0.0, 0.0, 0.0)), None);
        assert_eq!(to_vector(&Value::Bool(true)), vec![1.0]);
    }
}

//! Value: runtime instances read from and written to animated targets.
//! All numeric types use f32.

use serde::{Deserialize, Serialize};

/// Coarse kind of a [`Value`], used for dispatch when building bindings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Float,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    ColorRgba,
    Text,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// Boolean (step)
    Bool(bool),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector
    Vec3([f32; 3]),

    /// 4D vector
    Vec4([f32; 4]),

    /// RGBA color (linear by convention)
    ColorRgba([f32; 4]),

    /// Text, possibly carrying embedded numbers ("10px 20px")
    Text(String),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::ColorRgba(_) => ValueKind::ColorRgba,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Numeric components for the fixed-width kinds, `None` for bool/text.
    pub fn components(&self) -> Option<&[f32]> {
        match self {
            Value::Float(f) => Some(std::slice::from_ref(f)),
            Value::Vec2(a) => Some(a),
            Value::Vec3(a) => Some(a),
            Value::Vec4(a) | Value::ColorRgba(a) => Some(a),
            Value::Bool(_) | Value::Text(_) => None,
        }
    }

    /// Rebuild a value of `kind` from a component slice. Returns `None` when
    /// the kind is not numeric or the slice length does not match.
    pub fn from_components(kind: ValueKind, comps: &[f32]) -> Option<Value> {
        match (kind, comps.len()) {
            (ValueKind::Float, 1) => Some(Value::Float(comps[0])),
            (ValueKind::Vec2, 2) => Some(Value::Vec2([comps[0], comps[1]])),
            (ValueKind::Vec3, 3) => Some(Value::Vec3([comps[0], comps[1], comps[2]])),
            (ValueKind::Vec4, 4) => Some(Value::Vec4([comps[0], comps[1], comps[2], comps[3]])),
            (ValueKind::ColorRgba, 4) => Some(Value::ColorRgba([
                comps[0], comps[1], comps[2], comps[3],
            ])),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Value::ColorRgba([r, g, b, a])
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Value::Vec2(v)
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Value::Vec3(v)
    }
}

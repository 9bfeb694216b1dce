//! Animated targets.
//!
//! The engine never owns what it animates: every [`Target`] holds a weak
//! reference, and a dropped target simply stops receiving writes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use vizij_api_core::Value;

/// Property bag owned by the host, keyed by property name.
pub type PropertyMap = hashbrown::HashMap<String, Value>;

/// Host objects that expose named properties to the engine.
pub trait Animatable {
    /// Current value of `property`, or `None` if the object has no such property.
    fn get(&self, property: &str) -> Option<Value>;
    /// Write `value` to `property`.
    fn set(&mut self, property: &str, value: Value);
}

/// Name of the single property exposed by a [`Target::Cell`].
pub const CELL_PROPERTY: &str = "value";

/// A weakly-held animation target.
#[derive(Clone)]
pub enum Target {
    /// A bare shared scalar, animated through the property `"value"`.
    Cell(Weak<Cell<f32>>),
    Map(Weak<RefCell<PropertyMap>>),
    Object(Weak<RefCell<dyn Animatable>>),
}

/// Identity of a target (its allocation address). Two `Target`s built from
/// the same `Rc` share a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey(usize);

impl Target {
    pub fn cell(cell: &Rc<Cell<f32>>) -> Self {
        Target::Cell(Rc::downgrade(cell))
    }

    pub fn map(map: &Rc<RefCell<PropertyMap>>) -> Self {
        Target::Map(Rc::downgrade(map))
    }

    pub fn object<T: Animatable + 'static>(object: &Rc<RefCell<T>>) -> Self {
        let weak: Weak<RefCell<T>> = Rc::downgrade(object);
        Target::Object(weak)
    }

    pub fn key(&self) -> TargetKey {
        let ptr = match self {
            Target::Cell(w) => w.as_ptr() as *const (),
            Target::Map(w) => w.as_ptr() as *const (),
            Target::Object(w) => w.as_ptr() as *const (),
        };
        TargetKey(ptr as usize)
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Target::Cell(w) => w.strong_count() > 0,
            Target::Map(w) => w.strong_count() > 0,
            Target::Object(w) => w.strong_count() > 0,
        }
    }

    /// Read `property`. Returns `None` when the target is gone, the property
    /// is absent, or the host currently holds a mutable borrow.
    pub fn get(&self, property: &str) -> Option<Value> {
        match self {
            Target::Cell(w) => {
                if property != CELL_PROPERTY {
                    return None;
                }
                w.upgrade().map(|c| Value::Float(c.get()))
            }
            Target::Map(w) => {
                let map = w.upgrade()?;
                let map = map.try_borrow().ok()?;
                map.get(property).cloned()
            }
            Target::Object(w) => {
                let obj = w.upgrade()?;
                let obj = obj.try_borrow().ok()?;
                obj.get(property)
            }
        }
    }

    /// Write `property`. Returns false if nothing was written.
    pub fn set(&self, property: &str, value: Value) -> bool {
        match self {
            Target::Cell(w) => {
                let (Some(cell), Some(v)) = (w.upgrade(), value.as_float()) else {
                    return false;
                };
                if property != CELL_PROPERTY {
                    return false;
                }
                cell.set(v);
                true
            }
            Target::Map(w) => {
                let Some(map) = w.upgrade() else {
                    return false;
                };
                let Ok(mut map) = map.try_borrow_mut() else {
                    log::warn!("target map is borrowed; skipped write to {property:?}");
                    return false;
                };
                map.insert(property.to_string(), value);
                true
            }
            Target::Object(w) => {
                let Some(obj) = w.upgrade() else {
                    return false;
                };
                let Ok(mut obj) = obj.try_borrow_mut() else {
                    log::warn!("target object is borrowed; skipped write to {property:?}");
                    return false;
                };
                obj.set(property, value);
                true
            }
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Target::Cell(_) => "Cell",
            Target::Map(_) => "Map",
            Target::Object(_) => "Object",
        };
        f.debug_struct("Target")
            .field("kind", &kind)
            .field("key", &self.key())
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sprite {
        x: f32,
    }

    impl Animatable for Sprite {
        fn get(&self, property: &str) -> Option<Value> {
            (property == "x").then_some(Value::Float(self.x))
        }

        fn set(&mut self, property: &str, value: Value) {
            if let ("x", Some(v)) = (property, value.as_float()) {
                self.x = v;
            }
        }
    }

    #[test]
    fn cell_exposes_value_only() {
        let cell = Rc::new(Cell::new(3.0));
        let t = Target::cell(&cell);
        assert_eq!(t.get("value"), Some(Value::Float(3.0)));
        assert_eq!(t.get("x"), None);
        assert!(t.set("value", Value::Float(5.0)));
        assert_eq!(cell.get(), 5.0);
    }

    #[test]
    fn dropped_targets_stop_receiving_writes() {
        let map = Rc::new(RefCell::new(PropertyMap::new()));
        let t = Target::map(&map);
        assert!(t.set("x", Value::Float(1.0)));
        drop(map);
        assert!(!t.is_alive());
        assert!(!t.set("x", Value::Float(2.0)));
        assert_eq!(t.get("x"), None);
    }

    #[test]
    fn objects_share_identity_across_handles() {
        let sprite = Rc::new(RefCell::new(Sprite { x: 0.0 }));
        let a = Target::object(&sprite);
        let b = Target::object(&sprite);
        assert_eq!(a.key(), b.key());
        assert!(a.set("x", Value::Float(4.0)));
        assert_eq!(b.get("x"), Some(Value::Float(4.0)));
    }

    #[test]
    fn borrowed_map_is_skipped() {
        let map = Rc::new(RefCell::new(PropertyMap::new()));
        let t = Target::map(&map);
        let _guard = map.borrow_mut();
        assert!(!t.set("x", Value::Float(1.0)));
    }
}

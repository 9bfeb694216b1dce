//! vizij-api-core: value model shared by the timeline engine and its drivers.

pub mod coercion;
pub mod complex;
pub mod value;

pub use complex::{format_number, ComplexString, ParseComplexError};
pub use value::{Value, ValueKind};

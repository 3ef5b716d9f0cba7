//! Field-level emission rules for the canonical description form.
//!
//! Every serialized model field names its own `skip_serializing_if` predicate
//! through [`Emit::is_default`], so the decision "is this field written back"
//! is fixed at compile time per field instead of inspected at runtime.

use serde::Serializer;
use serde::ser::SerializeSeq;
use serde_json::Value;

use super::tool::Property;

/// A value that knows whether it equals its type's zero/default.
pub trait Emit {
    /// True when the value should be left out of the canonical form.
    fn is_default(&self) -> bool;
}

impl Emit for String {
    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

impl Emit for bool {
    fn is_default(&self) -> bool {
        !*self
    }
}

impl<T> Emit for Vec<T> {
    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Emit> Emit for Option<T> {
    fn is_default(&self) -> bool {
        self.as_ref().is_none_or(Emit::is_default)
    }
}

impl Emit for Value {
    fn is_default(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
        }
    }
}

/// `Settable` defaults to true; only read-only members differ from it.
pub(crate) fn default_settable() -> bool {
    true
}

/// Skip predicate for a property list: nothing settable means nothing to write.
pub(crate) fn no_settable(properties: &[Property]) -> bool {
    !properties.iter().any(|p| p.settable)
}

/// Serializes only the externally settable members of a property list.
pub(crate) fn settable_only<S>(properties: &[Property], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let settable: Vec<&Property> = properties.iter().filter(|p| p.settable).collect();
    let mut seq = serializer.serialize_seq(Some(settable.len()))?;
    for property in settable {
        seq.serialize_element(property)?;
    }
    seq.end()
}

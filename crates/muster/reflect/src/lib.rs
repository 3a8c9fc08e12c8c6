//! Message inspection capability for muster validators.
//!
//! The validation engine never depends on a concrete schema technology.
//! Instead it consumes the [`MessageInspect`] capability: look a field up
//! by name, ask whether it has been explicitly set, and read its value
//! (which may itself be a nested message). Any presence-tracking message
//! representation — generated protobuf types, a schema registry, or the
//! [`DynamicMessage`] shipped here — can implement it.

#![deny(unsafe_code)]

use std::collections::BTreeMap;

use serde_json::Value;

/// Convert a declared (snake_case) field name to its wire (camelCase)
/// spelling.
///
/// This is the fallback naming convention used everywhere a lookup by the
/// declared spelling fails: `first_name` and `firstName` refer to the same
/// field. Dots pass through untouched, so whole dotted paths can be
/// converted in one call.
pub fn wire_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Handle to a field resolved by [`MessageInspect::field_by_name`].
///
/// Carries the stored field name so follow-up presence and value queries
/// hit the same field regardless of which spelling resolved it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The stored (declared) name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The value of one field as seen through [`MessageInspect`].
#[derive(Clone)]
pub enum FieldValue<'a> {
    /// The field exists but holds no value.
    Unset,
    /// A scalar or composite leaf value.
    Scalar(Value),
    /// A nested message that can be inspected further.
    Message(&'a dyn MessageInspect),
}

impl std::fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Unset => f.write_str("Unset"),
            FieldValue::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            FieldValue::Message(_) => f.write_str("Message(..)"),
        }
    }
}

impl<'a> FieldValue<'a> {
    /// The nested message, if this value is one. The returned reference
    /// carries the message's own lifetime, not this value's borrow.
    pub fn as_message(&self) -> Option<&'a dyn MessageInspect> {
        match self {
            FieldValue::Message(m) => Some(*m),
            _ => None,
        }
    }
}

/// Capability interface over a decoded, presence-tracked message.
///
/// Implementations must answer three questions: does a field with this
/// name exist, has it been explicitly set, and what does it hold.
/// `field_by_name` receives the declared spelling first; implementations
/// are expected to also match the [`wire_name`] spelling so callers can
/// declare paths in either form.
pub trait MessageInspect {
    /// Look up a field by name. Returns `None` when no field matches
    /// either the given spelling or its wire-name equivalent.
    fn field_by_name(&self, name: &str) -> Option<FieldDescriptor>;

    /// Whether the field has been explicitly set on this message.
    fn has_field(&self, field: &FieldDescriptor) -> bool;

    /// The current value of the field.
    fn field_value(&self, field: &FieldDescriptor) -> FieldValue<'_>;
}

/// A field value stored in a [`DynamicMessage`].
#[derive(Clone, Debug, PartialEq)]
pub enum DynamicValue {
    Scalar(Value),
    Message(DynamicMessage),
}

/// In-memory presence-tracked message.
///
/// A field is "set" exactly when a value has been stored under its name;
/// there is no schema, so unknown names simply fail lookup. Useful for
/// tests and for hosts that build messages at runtime rather than from
/// generated types.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicMessage {
    fields: BTreeMap<String, DynamicValue>,
}

impl DynamicMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a scalar field under the declared name.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .insert(name.into(), DynamicValue::Scalar(value.into()));
        self
    }

    /// Store a nested message under the declared name.
    pub fn set_message(mut self, name: impl Into<String>, message: DynamicMessage) -> Self {
        self.fields
            .insert(name.into(), DynamicValue::Message(message));
        self
    }

    /// Read a stored field back by its declared name.
    pub fn get(&self, name: &str) -> Option<&DynamicValue> {
        self.fields.get(name)
    }
}

impl MessageInspect for DynamicMessage {
    fn field_by_name(&self, name: &str) -> Option<FieldDescriptor> {
        if self.fields.contains_key(name) {
            return Some(FieldDescriptor::new(name));
        }
        // fall back to matching the wire spelling of a stored name
        self.fields
            .keys()
            .find(|stored| wire_name(stored) == name)
            .map(FieldDescriptor::new)
    }

    fn has_field(&self, field: &FieldDescriptor) -> bool {
        self.fields.contains_key(field.name())
    }

    fn field_value(&self, field: &FieldDescriptor) -> FieldValue<'_> {
        match self.fields.get(field.name()) {
            None => FieldValue::Unset,
            Some(DynamicValue::Scalar(v)) => FieldValue::Scalar(v.clone()),
            Some(DynamicValue::Message(m)) => FieldValue::Message(m),
        }
    }
}

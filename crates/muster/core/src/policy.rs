//! Policy and condition kinds attached to declared fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of check applied to a declared field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Policy {
    /// The captured value must not be its structural zero value.
    NonZero,
    /// The captured value must differ from the comparison target.
    NotEqualTo,
    /// The captured value must equal the comparison target.
    MustEqual,
    /// Caller-supplied evaluation; used for faults added by custom
    /// validation functions.
    Custom,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::NonZero => "non-zero",
            Policy::NotEqualTo => "must not equal",
            Policy::MustEqual => "must equal",
            Policy::Custom => "custom evaluation",
        };
        f.write_str(name)
    }
}

/// When a field's policy applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// The policy always applies.
    Always,
    /// The policy applies only when the field's path is in the active mask.
    InMask,
}

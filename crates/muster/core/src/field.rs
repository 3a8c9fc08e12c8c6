//! The declared-field value object and its pure evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PolicyViolation;
use crate::path::{normalize_path, FieldMask};
use crate::policy::{Condition, Policy};

/// The concrete kind of a captured value. Equality policies require both
/// sides to share one; a mismatch is a configuration fault, never a
/// silent pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Structural zero check over a closed set of kinds: null, false, numeric
/// zero, empty string, empty container.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// One declared field assertion, immutable once constructed.
///
/// Zero-ness and mask membership are computed at construction, so
/// [`Field::validate`] is a pure read with no access to the message.
#[derive(Clone, Debug)]
pub struct Field {
    path: String,
    path_normalized: String,
    value: Value,
    in_mask: bool,
    zero: bool,
    policy: Policy,
    condition: Condition,
    compare_to: Option<Value>,
}

impl Field {
    pub(crate) fn new(
        path: impl Into<String>,
        value: Value,
        policy: Policy,
        condition: Condition,
        compare_to: Option<Value>,
        mask: &FieldMask,
    ) -> Self {
        let path = path.into();
        let path_normalized = normalize_path(&path);
        let in_mask = mask.contains(&path_normalized);
        let zero = is_zero(&value);
        Self {
            path,
            path_normalized,
            value,
            in_mask,
            zero,
            policy,
            condition,
            compare_to,
        }
    }

    /// The path as declared; the field's identity key.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The canonical (wire) spelling of the path.
    pub fn path_normalized(&self) -> &str {
        &self.path_normalized
    }

    /// The value captured at declaration time.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn zero(&self) -> bool {
        self.zero
    }

    pub fn in_mask(&self) -> bool {
        self.in_mask
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// The comparison target for equality policies.
    pub fn compare_to(&self) -> Option<&Value> {
        self.compare_to.as_ref()
    }

    /// Evaluate this field's policy under its condition.
    ///
    /// Mask-conditioned fields outside the mask pass silently. Equality
    /// policies first require both sides to share a [`ValueKind`];
    /// comparison itself is deep structural equality, so structurally
    /// equal composites compare equal regardless of provenance.
    pub fn validate(&self) -> Result<(), PolicyViolation> {
        if self.condition == Condition::InMask && !self.in_mask {
            return Ok(());
        }
        match self.policy {
            Policy::NonZero => {
                if self.zero {
                    Err(PolicyViolation::Zero {
                        value: self.value.clone(),
                    })
                } else {
                    Ok(())
                }
            }
            Policy::NotEqualTo | Policy::MustEqual => {
                // a missing target behaves like a null one and fails the
                // comparability check against anything non-null
                let target = self.compare_to.as_ref().unwrap_or(&Value::Null);
                let value_kind = ValueKind::of(&self.value);
                let target_kind = ValueKind::of(target);
                if value_kind != target_kind {
                    return Err(PolicyViolation::NotComparable {
                        value_kind,
                        target_kind,
                    });
                }
                let equal = self.value == *target;
                match self.policy {
                    Policy::NotEqualTo if equal => Err(PolicyViolation::Forbidden {
                        value: self.value.clone(),
                    }),
                    Policy::MustEqual if !equal => Err(PolicyViolation::Mismatch {
                        value: self.value.clone(),
                        expected: target.clone(),
                    }),
                    _ => Ok(()),
                }
            }
            // custom evaluation is carried by the validator's custom slot,
            // never by a declared field
            Policy::Custom => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(
        value: Value,
        policy: Policy,
        condition: Condition,
        compare_to: Option<Value>,
        mask: &FieldMask,
    ) -> Field {
        Field::new("user.first_name", value, policy, condition, compare_to, mask)
    }

    #[test]
    fn zero_values_cover_every_kind() {
        assert!(is_zero(&Value::Null));
        assert!(is_zero(&json!(false)));
        assert!(is_zero(&json!(0)));
        assert!(is_zero(&json!(0.0)));
        assert!(is_zero(&json!("")));
        assert!(is_zero(&json!([])));
        assert!(is_zero(&json!({})));

        assert!(!is_zero(&json!(true)));
        assert!(!is_zero(&json!(1)));
        assert!(!is_zero(&json!("bob")));
        assert!(!is_zero(&json!([0])));
        assert!(!is_zero(&json!({"k": null})));
    }

    #[test]
    fn non_zero_fails_on_zero_value() {
        let f = field(
            json!(""),
            Policy::NonZero,
            Condition::Always,
            None,
            &FieldMask::none(),
        );
        assert!(matches!(
            f.validate(),
            Err(PolicyViolation::Zero { .. })
        ));
    }

    #[test]
    fn non_zero_passes_on_set_value() {
        let f = field(
            json!("bob"),
            Policy::NonZero,
            Condition::Always,
            None,
            &FieldMask::none(),
        );
        assert!(f.validate().is_ok());
    }

    #[test]
    fn masked_condition_skips_when_not_in_mask() {
        // no mask supplied at all: mask-scoped assertions never apply
        let f = field(
            json!(""),
            Policy::NonZero,
            Condition::InMask,
            None,
            &FieldMask::none(),
        );
        assert!(f.validate().is_ok());

        // mask supplied but path absent
        let mask = FieldMask::from_paths(["user.last_name"]);
        let f = field(json!(""), Policy::NonZero, Condition::InMask, None, &mask);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn masked_condition_applies_when_in_mask() {
        let mask = FieldMask::from_paths(["user.first_name"]);
        let f = field(json!(""), Policy::NonZero, Condition::InMask, None, &mask);
        assert!(f.validate().is_err());
    }

    #[test]
    fn must_equal_fails_on_mismatch() {
        let f = field(
            json!("Bob"),
            Policy::MustEqual,
            Condition::Always,
            Some(json!("bob")),
            &FieldMask::none(),
        );
        assert!(matches!(
            f.validate(),
            Err(PolicyViolation::Mismatch { .. })
        ));
    }

    #[test]
    fn not_equal_fails_on_forbidden_value() {
        let f = field(
            json!("bob"),
            Policy::NotEqualTo,
            Condition::Always,
            Some(json!("bob")),
            &FieldMask::none(),
        );
        assert!(matches!(
            f.validate(),
            Err(PolicyViolation::Forbidden { .. })
        ));
    }

    #[test]
    fn cross_kind_comparison_is_a_config_fault() {
        let f = field(
            json!("21"),
            Policy::MustEqual,
            Condition::Always,
            Some(json!(21)),
            &FieldMask::none(),
        );
        let err = f.validate().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn missing_target_is_a_config_fault() {
        let f = field(
            json!("bob"),
            Policy::MustEqual,
            Condition::Always,
            None,
            &FieldMask::none(),
        );
        assert!(f.validate().unwrap_err().is_config());
    }

    #[test]
    fn equality_is_deep_structural() {
        let f = field(
            json!({"line1": "a", "line2": "b"}),
            Policy::MustEqual,
            Condition::Always,
            Some(json!({"line2": "b", "line1": "a"})),
            &FieldMask::none(),
        );
        assert!(f.validate().is_ok());
    }
}

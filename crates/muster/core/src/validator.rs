//! The fluent declaration builder and its execution contract.

use muster_reflect::MessageInspect;
use serde_json::Value;
use tracing::debug;

use crate::context::RequestContext;
use crate::errors::{PolicyViolation, ValidationErrors};
use crate::field::Field;
use crate::path::FieldMask;
use crate::policy::{Condition, Policy};
use crate::resolver::PresenceResolver;

/// The validation seam consumed by [`crate::Arrangement`].
///
/// Implemented by [`MessageValidator`]; hosts with bespoke validation can
/// implement it directly.
pub trait Validate<T>: Send + Sync {
    /// Run validation against `message`. `None` is the only success
    /// signal; `Some` carries every fault found in this pass.
    fn execute(&self, ctx: &RequestContext, message: &T) -> Option<ValidationErrors>;
}

type CustomValidation<T> =
    Box<dyn Fn(&RequestContext, &T, &mut ValidationErrors) -> anyhow::Result<()> + Send + Sync>;

/// Accumulates field assertions and at most one custom validation step,
/// then evaluates them in a fixed order.
///
/// Built once, executable many times: declared fields are immutable after
/// build and every `execute` call allocates its own fault collector and
/// presence cache, so sharing a built validator across threads is safe.
pub struct MessageValidator<T> {
    mask: FieldMask,
    fields: Vec<Field>,
    custom: Option<CustomValidation<T>>,
}

impl<T> MessageValidator<T> {
    /// A validator with no field mask: mask-conditioned assertions never
    /// apply.
    pub fn new() -> Self {
        Self {
            mask: FieldMask::none(),
            fields: Vec::new(),
            custom: None,
        }
    }

    /// A validator scoped to the paths of the request's field mask.
    pub fn with_mask<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mask: FieldMask::from_paths(paths),
            fields: Vec::new(),
            custom: None,
        }
    }

    fn assert(
        mut self,
        path: impl Into<String>,
        value: Value,
        policy: Policy,
        condition: Condition,
        compare_to: Option<Value>,
    ) -> Self {
        self.fields
            .push(Field::new(path, value, policy, condition, compare_to, &self.mask));
        self
    }

    /// Assert that the value captured for `path` is not its structural
    /// zero value.
    pub fn assert_non_zero(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assert(path, value.into(), Policy::NonZero, Condition::Always, None)
    }

    /// Assert that the captured value differs from `target`.
    pub fn assert_not_equal_to(
        self,
        path: impl Into<String>,
        value: impl Into<Value>,
        target: impl Into<Value>,
    ) -> Self {
        self.assert(
            path,
            value.into(),
            Policy::NotEqualTo,
            Condition::Always,
            Some(target.into()),
        )
    }

    /// Assert that the captured value equals `target`.
    pub fn assert_equal_to(
        self,
        path: impl Into<String>,
        value: impl Into<Value>,
        target: impl Into<Value>,
    ) -> Self {
        self.assert(
            path,
            value.into(),
            Policy::MustEqual,
            Condition::Always,
            Some(target.into()),
        )
    }

    /// [`Self::assert_non_zero`], applied only when `path` is in the mask.
    pub fn assert_non_zero_when_in_mask(
        self,
        path: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.assert(path, value.into(), Policy::NonZero, Condition::InMask, None)
    }

    /// [`Self::assert_not_equal_to`], applied only when `path` is in the
    /// mask.
    pub fn assert_not_equal_to_when_in_mask(
        self,
        path: impl Into<String>,
        value: impl Into<Value>,
        target: impl Into<Value>,
    ) -> Self {
        self.assert(
            path,
            value.into(),
            Policy::NotEqualTo,
            Condition::InMask,
            Some(target.into()),
        )
    }

    /// [`Self::assert_equal_to`], applied only when `path` is in the mask.
    pub fn assert_equal_to_when_in_mask(
        self,
        path: impl Into<String>,
        value: impl Into<Value>,
        target: impl Into<Value>,
    ) -> Self {
        self.assert(
            path,
            value.into(),
            Policy::MustEqual,
            Condition::InMask,
            Some(target.into()),
        )
    }

    /// Install the custom validation step. One slot per validator: a
    /// second call replaces the first, by design.
    ///
    /// The function receives the full message and the mutable fault
    /// collector; path-scoped faults added to the collector merge exactly
    /// like built-in field faults. Returning an error records the
    /// distinct message-scoped custom error instead.
    pub fn custom_validation(
        mut self,
        f: impl Fn(&RequestContext, &T, &mut ValidationErrors) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.custom = Some(Box::new(f));
        self
    }
}

impl<T> Default for MessageValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MessageInspect> Validate<T> for MessageValidator<T> {
    /// Execution order: the custom validation step runs first, so custom
    /// logic can inspect and augment the collector before built-in faults
    /// land; field declarations then evaluate in declaration order. A
    /// custom error does not stop field evaluation — the caller sees all
    /// problems in one pass.
    fn execute(&self, ctx: &RequestContext, message: &T) -> Option<ValidationErrors> {
        let mut errs = ValidationErrors::new();
        let mut resolver = PresenceResolver::new();

        if let Some(custom) = &self.custom {
            debug!("running custom validation");
            if let Err(err) = custom(ctx, message, &mut errs) {
                errs.set_custom_error(err.context("custom message validation failed"));
            }
        }

        debug!(fields = self.fields.len(), "evaluating field declarations");
        for field in &self.fields {
            if let Err(violation) = field.validate() {
                // a zero captured value may be an explicit zero or a field
                // that was never set; the resolver knows which
                let violation = match violation {
                    PolicyViolation::Zero { .. } if !resolver.is_set(field.path(), message) => {
                        PolicyViolation::Unset
                    }
                    other => other,
                };
                debug!(path = field.path(), policy = %field.policy(), %violation, "field declaration failed");
                errs.add_violation(field, violation);
            }
        }

        if errs.has_errors() {
            Some(errs)
        } else {
            None
        }
    }
}

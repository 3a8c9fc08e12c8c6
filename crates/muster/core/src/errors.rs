//! Fault taxonomy, aggregation, and stage classification.
//!
//! Three classes of failure flow through the engine. Field faults and
//! configuration faults are collected per-path so the caller sees every
//! problem in one pass; custom faults are either path-scoped (merged like
//! field faults) or message-scoped (kept distinct); stage faults wrap an
//! opaque caller error with the stage that produced it and always
//! terminate the pipeline.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::field::{Field, ValueKind};
use crate::policy::Policy;

/// Why one policy failed against one field.
///
/// `NotComparable` is a configuration fault: the caller declared an
/// assertion that cannot be evaluated. It is collected alongside field
/// faults (other declarations still run) but stays queryable as its own
/// class via [`ValidationErrors::has_config_faults`].
#[derive(Debug, Error)]
pub enum PolicyViolation {
    #[error("field explicitly set to zero value (value: {value})")]
    Zero { value: Value },

    #[error("field not set")]
    Unset,

    #[error("expected values to be equal (value: {value}, expected: {expected})")]
    Mismatch { value: Value, expected: Value },

    #[error("field set to forbidden value (value: {value})")]
    Forbidden { value: Value },

    #[error("equality check failed, kinds not comparable (value: {value_kind}, target: {target_kind})")]
    NotComparable {
        value_kind: ValueKind,
        target_kind: ValueKind,
    },
}

impl PolicyViolation {
    /// Whether this is a configuration fault rather than a field fault.
    pub fn is_config(&self) -> bool {
        matches!(self, PolicyViolation::NotComparable { .. })
    }
}

/// All recorded failures for one field path.
///
/// Identity is the path string: further faults on the same path join the
/// cause list in place, they never create a second entry.
#[derive(Debug)]
pub struct FieldError {
    path: String,
    policy: Policy,
    value: Option<Value>,
    expected: Option<Value>,
    causes: Vec<anyhow::Error>,
}

impl FieldError {
    fn new(
        path: String,
        policy: Policy,
        value: Option<Value>,
        expected: Option<Value>,
        cause: anyhow::Error,
    ) -> Self {
        Self {
            path,
            policy,
            value,
            expected,
            causes: vec![cause],
        }
    }

    /// The dot-delimited path this fault is scoped to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The policy that failed first on this path.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// The offending value captured at declaration time, if known.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The comparison target, for equality policies.
    pub fn expected(&self) -> Option<&Value> {
        self.expected.as_ref()
    }

    /// Every cause recorded against this path, in arrival order.
    pub fn causes(&self) -> &[anyhow::Error] {
        &self.causes
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed {} policy: ", self.path, self.policy)?;
        for (i, cause) in self.causes.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldError {}

/// The aggregate outcome of one validator execution.
///
/// Ordered field faults (declaration order preserved, merged by path) plus
/// an optional message-scoped custom error that cannot be attributed to
/// one path. Created empty per execution and returned immutable; the only
/// success signal is its absence.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    field_errors: Vec<FieldError>,
    custom_error: Option<anyhow::Error>,
    idx: HashMap<String, usize>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path-scoped fault from a custom validation function.
    pub fn add_field_err(&mut self, path: impl Into<String>, err: impl Into<anyhow::Error>) {
        self.push(path.into(), Policy::Custom, None, None, err.into());
    }

    /// Like [`Self::add_field_err`], also recording the offending value
    /// and, when relevant, the expected one.
    pub fn add_field_err_with(
        &mut self,
        path: impl Into<String>,
        err: impl Into<anyhow::Error>,
        value: Option<Value>,
        expected: Option<Value>,
    ) {
        self.push(path.into(), Policy::Custom, value, expected, err.into());
    }

    pub(crate) fn add_violation(&mut self, field: &Field, violation: PolicyViolation) {
        self.push(
            field.path().to_string(),
            field.policy(),
            Some(field.value().clone()),
            field.compare_to().cloned(),
            anyhow::Error::new(violation),
        );
    }

    pub(crate) fn set_custom_error(&mut self, err: anyhow::Error) {
        self.custom_error = Some(err);
    }

    fn push(
        &mut self,
        path: String,
        policy: Policy,
        value: Option<Value>,
        expected: Option<Value>,
        cause: anyhow::Error,
    ) {
        match self.idx.get(&path) {
            Some(&i) => self.field_errors[i].causes.push(cause),
            None => {
                self.field_errors
                    .push(FieldError::new(path.clone(), policy, value, expected, cause));
                self.idx.insert(path, self.field_errors.len() - 1);
            }
        }
    }

    /// The message-scoped custom validation error, if one was raised.
    pub fn custom_error(&self) -> Option<&anyhow::Error> {
        self.custom_error.as_ref()
    }

    /// Field faults in first-seen order.
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// The faulted paths, in first-seen order.
    pub fn paths(&self) -> Vec<&str> {
        self.field_errors.iter().map(|e| e.path()).collect()
    }

    /// O(1)-probing view keyed by path, for callers asking "did field X
    /// fail" without parsing the rendering.
    pub fn as_map(&self) -> HashMap<&str, &FieldError> {
        self.field_errors.iter().map(|e| (e.path(), e)).collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty() || self.custom_error.is_some()
    }

    /// Whether any recorded cause is a configuration fault (an assertion
    /// that could not be evaluated).
    pub fn has_config_faults(&self) -> bool {
        self.field_errors.iter().any(|e| {
            e.causes.iter().any(|c| {
                c.downcast_ref::<PolicyViolation>()
                    .is_some_and(PolicyViolation::is_config)
            })
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(custom) = &self.custom_error {
            // alternate form renders the whole context chain
            writeln!(f, "{custom:#}")?;
        }
        for err in &self.field_errors {
            writeln!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// One named phase of an arrangement's execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Auth,
    Validate,
    Serve,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Auth => "auth",
            Stage::Validate => "validate",
            Stage::Serve => "serve",
        };
        f.write_str(name)
    }
}

/// Wire-level classification of a failed arrangement, for transport
/// adapters mapping stage errors onto their status vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    Unauthenticated,
    InvalidArgument,
    Internal,
}

/// The single stage-tagged error of a failed arrangement execution.
///
/// Exactly one variant per failed call; stage faults are never merged
/// with field faults.
#[derive(Debug, Error)]
pub enum ArrangementError {
    #[error("authentication failed: {0}")]
    Auth(anyhow::Error),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("serve failed: {0}")]
    Serve(anyhow::Error),
}

impl ArrangementError {
    /// The stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            ArrangementError::Auth(_) => Stage::Auth,
            ArrangementError::Validation(_) => Stage::Validate,
            ArrangementError::Serve(_) => Stage::Serve,
        }
    }

    pub fn auth_err(&self) -> Option<&anyhow::Error> {
        match self {
            ArrangementError::Auth(err) => Some(err),
            _ => None,
        }
    }

    pub fn validation_errs(&self) -> Option<&ValidationErrors> {
        match self {
            ArrangementError::Validation(errs) => Some(errs),
            _ => None,
        }
    }

    pub fn serve_err(&self) -> Option<&anyhow::Error> {
        match self {
            ArrangementError::Serve(err) => Some(err),
            _ => None,
        }
    }

    /// Classify for transports: auth failures are unauthenticated,
    /// validation failures are invalid arguments, serve failures are
    /// internal.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ArrangementError::Auth(_) => StatusCode::Unauthenticated,
            ArrangementError::Validation(_) => StatusCode::InvalidArgument,
            ArrangementError::Serve(_) => StatusCode::Internal,
        }
    }
}

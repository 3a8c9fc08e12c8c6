//! Declarative message validation and request staging.
//!
//! Service handlers for structured request messages tend to open with the
//! same imperative preamble: authenticate the caller, check that this
//! field is set, that one differs from a forbidden value, honor the
//! request's field mask, then finally run the business logic. muster turns
//! that preamble into data. Callers declare field assertions on a
//! [`MessageValidator`], optionally scoped to a field mask, and compose
//! the validator with auth and serve functions into an [`Arrangement`]:
//!
//! ```
//! use muster_core::{arrange, MessageValidator, RequestContext};
//! use muster_reflect::DynamicMessage;
//!
//! let req = DynamicMessage::new()
//!     .set_message("user", DynamicMessage::new().set("first_name", "bob"));
//!
//! let response = arrange::<DynamicMessage, String>()
//!     .with_validate(
//!         MessageValidator::new()
//!             .assert_non_zero("user.first_name", "bob")
//!             .assert_non_zero("user.id", ""),
//!     )
//!     .with_serve(|_ctx, _msg| Ok("created".to_string()))
//!     .exec(&RequestContext::new(), &req);
//!
//! // user.id was zero, so the serve stage never ran
//! assert!(response.error().is_some());
//! ```
//!
//! ## Stages
//!
//! An arrangement executes `Auth → Validate → Serve`. Each stage runs only
//! if the previous one produced no error; the first failure is tagged with
//! its [`Stage`] and returned in the [`Response`] envelope, which carries
//! exactly one of a success payload or a stage error. Validation failures
//! aggregate every field fault into one [`ValidationErrors`] so callers
//! see all problems in a single pass.
//!
//! ## Field presence
//!
//! Assertions capture values at declaration time. Where a captured value
//! alone cannot disambiguate presence — an empty string may be explicitly
//! set or simply absent — the engine consults a per-execution
//! [`PresenceResolver`] over the [`MessageInspect`] capability
//! (see [`muster_reflect`]).

#![deny(unsafe_code)]

pub mod arrange;
pub mod context;
pub mod envelope;
pub mod errors;
pub mod field;
pub mod path;
pub mod policy;
pub mod resolver;
pub mod validator;

pub use arrange::{arrange, Arrangement};
pub use context::RequestContext;
pub use envelope::Response;
pub use errors::{
    ArrangementError, FieldError, PolicyViolation, Stage, StatusCode, ValidationErrors,
};
pub use field::{Field, ValueKind};
pub use path::{normalize_path, FieldMask};
pub use policy::{Condition, Policy};
pub use resolver::PresenceResolver;
pub use validator::{MessageValidator, Validate};

pub use muster_reflect::{DynamicMessage, FieldDescriptor, FieldValue, MessageInspect};

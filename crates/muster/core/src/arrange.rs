//! The staged `Auth → Validate → Serve` execution unit.

use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::envelope::Response;
use crate::errors::{ArrangementError, Stage};
use crate::validator::Validate;

type AuthFn<T> = Box<dyn Fn(&RequestContext, &T) -> anyhow::Result<()> + Send + Sync>;
type ServeFn<T, U> = Box<dyn Fn(&RequestContext, &T) -> anyhow::Result<U> + Send + Sync>;

/// Start building an arrangement for a message type `T` and response
/// payload `U`.
pub fn arrange<T, U>() -> Arrangement<T, U> {
    Arrangement::new()
}

/// Composes an authentication step, a message validator, and a
/// business-logic step into one ordered, short-circuiting execution.
///
/// Stages run `Auth → Validate → Serve`; each runs only if the previous
/// produced no error, and the first failure is tagged with its [`Stage`]
/// and returned in the [`Response`] envelope — later stages are never
/// invoked, not even partially. Unconfigured stages always pass. Built
/// once, executed many times: all per-call state lives in the envelope
/// and the validator's own per-execution allocations.
pub struct Arrangement<T, U> {
    auth: Option<AuthFn<T>>,
    validate: Option<Box<dyn Validate<T>>>,
    serve: Option<ServeFn<T, U>>,
}

impl<T, U> Arrangement<T, U> {
    pub fn new() -> Self {
        Self {
            auth: None,
            validate: None,
            serve: None,
        }
    }

    /// Add the authentication step, run before any validation.
    pub fn with_auth(
        mut self,
        f: impl Fn(&RequestContext, &T) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.auth = Some(Box::new(f));
        self
    }

    /// Add the validation step.
    pub fn with_validate(mut self, validator: impl Validate<T> + 'static) -> Self {
        self.validate = Some(Box::new(validator));
        self
    }

    /// Add the business-logic step, run only when every earlier stage
    /// passed.
    pub fn with_serve(
        mut self,
        f: impl Fn(&RequestContext, &T) -> anyhow::Result<U> + Send + Sync + 'static,
    ) -> Self {
        self.serve = Some(Box::new(f));
        self
    }

    /// Execute the staged pipeline against one message.
    pub fn exec(&self, ctx: &RequestContext, message: &T) -> Response<U> {
        if let Some(auth) = &self.auth {
            debug!(stage = %Stage::Auth, "evaluating stage");
            if let Err(err) = auth(ctx, message) {
                warn!(stage = %Stage::Auth, error = %err, "stage failed");
                return Response::failed(ArrangementError::Auth(err));
            }
        }

        if let Some(validate) = &self.validate {
            debug!(stage = %Stage::Validate, "evaluating stage");
            if let Some(errs) = validate.execute(ctx, message) {
                warn!(
                    stage = %Stage::Validate,
                    faults = errs.field_errors().len(),
                    "stage failed"
                );
                return Response::failed(ArrangementError::Validation(errs));
            }
        }

        if let Some(serve) = &self.serve {
            debug!(stage = %Stage::Serve, "evaluating stage");
            return match serve(ctx, message) {
                Ok(data) => Response::succeeded(data),
                Err(err) => {
                    warn!(stage = %Stage::Serve, error = %err, "stage failed");
                    Response::failed(ArrangementError::Serve(err))
                }
            };
        }

        Response::empty()
    }
}

impl<T, U> Default for Arrangement<T, U> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{StatusCode, ValidationErrors};
    use crate::validator::MessageValidator;
    use anyhow::anyhow;
    use muster_reflect::DynamicMessage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ctx() -> RequestContext {
        RequestContext::new()
    }

    /// A validator stand-in that counts invocations.
    struct SpyValidator {
        calls: Arc<AtomicUsize>,
        faults: bool,
    }

    impl Validate<DynamicMessage> for SpyValidator {
        fn execute(&self, _: &RequestContext, _: &DynamicMessage) -> Option<ValidationErrors> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.faults {
                let mut errs = ValidationErrors::new();
                errs.add_field_err("user.id", anyhow!("spy fault"));
                Some(errs)
            } else {
                None
            }
        }
    }

    #[test]
    fn auth_failure_skips_validate_and_serve() {
        let validate_calls = Arc::new(AtomicUsize::new(0));
        let serve_calls = Arc::new(AtomicUsize::new(0));
        let serve_spy = serve_calls.clone();

        let arrangement = arrange::<DynamicMessage, String>()
            .with_auth(|_, _| Err(anyhow!("caller id cannot be empty")))
            .with_validate(SpyValidator {
                calls: validate_calls.clone(),
                faults: false,
            })
            .with_serve(move |_, _| {
                serve_spy.fetch_add(1, Ordering::SeqCst);
                Ok("never".to_string())
            });

        let resp = arrangement.exec(&ctx(), &DynamicMessage::new());

        let err = resp.error().expect("auth error");
        assert_eq!(err.stage(), Stage::Auth);
        assert!(err.auth_err().is_some());
        assert!(err.validation_errs().is_none());
        assert!(err.serve_err().is_none());
        assert_eq!(validate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(serve_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn validation_failure_skips_serve() {
        let serve_calls = Arc::new(AtomicUsize::new(0));
        let serve_spy = serve_calls.clone();

        let arrangement = arrange::<DynamicMessage, String>()
            .with_auth(|_, _| Ok(()))
            .with_validate(SpyValidator {
                calls: Arc::new(AtomicUsize::new(0)),
                faults: true,
            })
            .with_serve(move |_, _| {
                serve_spy.fetch_add(1, Ordering::SeqCst);
                Ok("never".to_string())
            });

        let resp = arrangement.exec(&ctx(), &DynamicMessage::new());

        let err = resp.error().unwrap();
        assert_eq!(err.stage(), Stage::Validate);
        assert_eq!(resp.status_code(), Some(StatusCode::InvalidArgument));
        assert_eq!(serve_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_stages_pass_through_to_serve() {
        let req = DynamicMessage::new()
            .set_message("user", DynamicMessage::new().set("first_name", "bob"));

        let resp = arrange::<DynamicMessage, String>()
            .with_auth(|ctx, _| {
                ctx.meta("caller_id")
                    .map(|_| ())
                    .ok_or_else(|| anyhow!("caller id cannot be empty"))
            })
            .with_validate(MessageValidator::new().assert_non_zero("user.first_name", "bob"))
            .with_serve(|_, _| Ok("created".to_string()))
            .exec(&RequestContext::new().with_meta("caller_id", "svc"), &req);

        assert!(resp.is_success());
        assert_eq!(resp.data(), Some(&"created".to_string()));
    }

    #[test]
    fn serve_failure_is_tagged_internal() {
        let resp = arrange::<DynamicMessage, String>()
            .with_serve(|_, _| Err(anyhow!("downstream unavailable")))
            .exec(&ctx(), &DynamicMessage::new());

        let err = resp.error().unwrap();
        assert_eq!(err.stage(), Stage::Serve);
        assert_eq!(err.status_code(), StatusCode::Internal);
        assert!(resp.data().is_none());
    }

    #[test]
    fn unconfigured_stages_always_pass() {
        let resp = arrange::<DynamicMessage, String>().exec(&ctx(), &DynamicMessage::new());
        assert!(resp.is_success());
        assert!(resp.data().is_none());
    }

    #[test]
    fn built_arrangement_is_reusable() {
        let serve_calls = Arc::new(AtomicUsize::new(0));
        let serve_spy = serve_calls.clone();
        let arrangement = arrange::<DynamicMessage, u32>().with_serve(move |_, _| {
            Ok(serve_spy.fetch_add(1, Ordering::SeqCst) as u32)
        });

        let msg = DynamicMessage::new();
        assert_eq!(arrangement.exec(&ctx(), &msg).data(), Some(&0));
        assert_eq!(arrangement.exec(&ctx(), &msg).data(), Some(&1));
        assert_eq!(serve_calls.load(Ordering::SeqCst), 2);
    }
}

//! The response envelope returned by an arrangement execution.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::{ArrangementError, StatusCode};

/// What one arrangement execution produced.
///
/// Holds at most one of a success payload or a stage-tagged error — the
/// constructors make any other combination unrepresentable. An
/// arrangement with no serve stage completes with neither. Metadata is a
/// free-form side channel for transport adapters and callers.
#[derive(Debug, Default)]
pub struct Response<U> {
    data: Option<U>,
    meta: HashMap<String, Value>,
    error: Option<ArrangementError>,
}

impl<U> Response<U> {
    pub(crate) fn succeeded(data: U) -> Self {
        Self {
            data: Some(data),
            meta: HashMap::new(),
            error: None,
        }
    }

    pub(crate) fn failed(error: ArrangementError) -> Self {
        Self {
            data: None,
            meta: HashMap::new(),
            error: Some(error),
        }
    }

    /// All stages passed but no serve stage was configured.
    pub(crate) fn empty() -> Self {
        Self {
            data: None,
            meta: HashMap::new(),
            error: None,
        }
    }

    /// The success payload, when the pipeline ran to completion.
    pub fn data(&self) -> Option<&U> {
        self.data.as_ref()
    }

    /// The stage-tagged error, when a stage failed.
    pub fn error(&self) -> Option<&ArrangementError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The wire classification of the error, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.error.as_ref().map(ArrangementError::status_code)
    }

    /// Attach a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn meta(&self) -> &HashMap<String, Value> {
        &self.meta
    }

    /// Unwrap into a result: the payload (if a serve stage produced one)
    /// or the stage error.
    pub fn into_result(self) -> Result<Option<U>, ArrangementError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }
}

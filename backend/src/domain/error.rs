//! Domain-level error type shared by services and adapters.
//!
//! The error is transport agnostic: inbound adapters map it to HTTP
//! responses while services construct it from port-level failures. The
//! active [`TraceId`](crate::middleware::trace::TraceId) is captured at
//! construction so error payloads correlate with request logs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::middleware::trace::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication failed, either locally or against the aggregator.
    Unauthorized,
    /// The requested resource does not exist.
    NotFound,
    /// The operation conflicts with the current lifecycle state.
    Conflict,
    /// A dependency (database, aggregator) is unavailable.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// API error response payload.
///
/// # Examples
/// ```
/// use backend::domain::{Error, ErrorCode};
///
/// let err = Error::new(ErrorCode::NotFound, "missing");
/// assert_eq!(err.code, ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct Error {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    pub code: ErrorCode,
    /// Human-readable error message.
    #[schema(example = "Something went wrong")]
    pub message: String,
    /// Correlation identifier for tracing this error across systems.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(alias = "trace_id")]
    pub trace_id: Option<String>,
    /// Supplementary structured details, such as field-specific issues or
    /// the aggregator-reported requisition status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Error {
    /// Create a new error.
    ///
    /// Captures the current trace identifier if one is in scope so the
    /// error payload is correlated automatically.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    /// Attach a trace identifier to the error.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{Error, ErrorCode};
    /// let err = Error::new(ErrorCode::NotFound, "gone").with_trace_id("abc");
    /// assert_eq!(err.trace_id.as_deref(), Some("abc"));
    /// ```
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Error;
    /// use serde_json::json;
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "ref" }));
    /// assert!(err.details.is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use serde_json::json;

    #[test]
    fn constructors_set_expected_codes() {
        assert_eq!(Error::invalid_request("x").code, ErrorCode::InvalidRequest);
        assert_eq!(Error::unauthorized("x").code, ErrorCode::Unauthorized);
        assert_eq!(Error::not_found("x").code, ErrorCode::NotFound);
        assert_eq!(Error::conflict("x").code, ErrorCode::Conflict);
        assert_eq!(
            Error::service_unavailable("x").code,
            ErrorCode::ServiceUnavailable
        );
        assert_eq!(Error::internal("x").code, ErrorCode::InternalError);
    }

    #[test]
    fn serialises_without_empty_optional_fields() {
        let err = Error::not_found("missing connection");
        let value = serde_json::to_value(&err).expect("serialise error");
        assert_eq!(value["code"], "not_found");
        assert_eq!(value["message"], "missing connection");
        assert!(value.get("traceId").is_none());
        assert!(value.get("details").is_none());
    }

    #[test]
    fn details_round_trip() {
        let err = Error::conflict("not linked").with_details(json!({ "status": "CR" }));
        let value = serde_json::to_value(&err).expect("serialise error");
        assert_eq!(value["details"]["status"], "CR");
    }
}

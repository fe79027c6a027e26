use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

const BODY_SNIPPET_LIMIT: usize = 200;

/// Discriminant of a [`Failure`], stable across message wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotFound,
    CredentialNotFound,
    UnsupportedCredentialType,
    RemoteFetchFailed,
    Interrupted,
    InvalidJson,
    InvalidQuery,
    NoData,
    NoJobContext,
    ParameterNotFound,
}

impl FailureKind {
    pub fn code(self) -> &'static str {
        match self {
            FailureKind::NotFound => "NOT_FOUND",
            FailureKind::CredentialNotFound => "CREDENTIAL_NOT_FOUND",
            FailureKind::UnsupportedCredentialType => "UNSUPPORTED_CREDENTIAL_TYPE",
            FailureKind::RemoteFetchFailed => "REMOTE_FETCH_FAILED",
            FailureKind::Interrupted => "INTERRUPTED",
            FailureKind::InvalidJson => "INVALID_JSON",
            FailureKind::InvalidQuery => "INVALID_QUERY",
            FailureKind::NoData => "NO_DATA",
            FailureKind::NoJobContext => "NO_JOB_CONTEXT",
            FailureKind::ParameterNotFound => "PARAMETER_NOT_FOUND",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("Config with ID {id} not found in folder or global context.")]
    NotFound { id: String },
    #[error("Credentials not found: {id}")]
    CredentialNotFound { id: String },
    #[error("Unsupported credentials type: {kind}")]
    UnsupportedCredentialType { kind: String },
    #[error("Failed to fetch JSON from URL '{url}' using credentials '{credential}': {reason}")]
    RemoteFetchFailed {
        url: String,
        credential: String,
        status: Option<u16>,
        reason: String,
    },
    #[error("Request to '{url}' was interrupted: {reason}")]
    Interrupted { url: String, reason: String },
    #[error("Invalid JSON: {reason}")]
    InvalidJson { reason: String },
    #[error("Invalid query '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },
    #[error("No data found for the configured query.")]
    NoData,
    #[error("No job context found for '{job}'")]
    NoJobContext { job: String },
    #[error("Parameter '{name}' not found in job '{job}'")]
    ParameterNotFound { job: String, name: String },
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::NotFound { .. } => FailureKind::NotFound,
            Failure::CredentialNotFound { .. } => FailureKind::CredentialNotFound,
            Failure::UnsupportedCredentialType { .. } => FailureKind::UnsupportedCredentialType,
            Failure::RemoteFetchFailed { .. } => FailureKind::RemoteFetchFailed,
            Failure::Interrupted { .. } => FailureKind::Interrupted,
            Failure::InvalidJson { .. } => FailureKind::InvalidJson,
            Failure::InvalidQuery { .. } => FailureKind::InvalidQuery,
            Failure::NoData => FailureKind::NoData,
            Failure::NoJobContext { .. } => FailureKind::NoJobContext,
            Failure::ParameterNotFound { .. } => FailureKind::ParameterNotFound,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Request context is gone entirely; nothing can be resolved, so callers
    /// answer with a structured error instead of a degraded option list.
    pub fn is_context_loss(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::NoJobContext | FailureKind::ParameterNotFound
        )
    }

    pub fn remote_status(url: &str, credential: Option<&str>, status: u16, body: &str) -> Self {
        let snippet: String = body.chars().take(BODY_SNIPPET_LIMIT).collect();
        Failure::RemoteFetchFailed {
            url: url.to_string(),
            credential: credential.unwrap_or("none").to_string(),
            status: Some(status),
            reason: format!("HTTP {status} - {snippet}"),
        }
    }

    pub fn remote_transport(url: &str, credential: Option<&str>, reason: impl Into<String>) -> Self {
        Failure::RemoteFetchFailed {
            url: url.to_string(),
            credential: credential.unwrap_or("none").to_string(),
            status: None,
            reason: reason.into(),
        }
    }
}

/// Outcome of a resolution or evaluation step.
///
/// Failures are values: every step returns either usable data or a
/// human-readable message, never a fault that crosses the UI boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonResult<T> {
    Success(T),
    Failure(Failure),
}

impl<T> JsonResult<T> {
    pub fn success(value: T) -> Self {
        JsonResult::Success(value)
    }

    pub fn failure(failure: Failure) -> Self {
        JsonResult::Failure(failure)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JsonResult::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            JsonResult::Success(value) => Some(value),
            JsonResult::Failure(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            JsonResult::Success(value) => Some(value),
            JsonResult::Failure(_) => None,
        }
    }

    pub fn failure_ref(&self) -> Option<&Failure> {
        match self {
            JsonResult::Success(_) => None,
            JsonResult::Failure(failure) => Some(failure),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure_ref().map(Failure::kind)
    }

    pub fn error_message(&self) -> Option<String> {
        self.failure_ref().map(ToString::to_string)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> JsonResult<U> {
        match self {
            JsonResult::Success(value) => JsonResult::Success(f(value)),
            JsonResult::Failure(failure) => JsonResult::Failure(failure),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> JsonResult<U>) -> JsonResult<U> {
        match self {
            JsonResult::Success(value) => f(value),
            JsonResult::Failure(failure) => JsonResult::Failure(failure),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            JsonResult::Success(value) => Ok(value),
            JsonResult::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Result<T, Failure>> for JsonResult<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => JsonResult::Success(value),
            Err(failure) => JsonResult::Failure(failure),
        }
    }
}

impl<T: Serialize> Serialize for JsonResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            JsonResult::Success(value) => {
                let mut state = serializer.serialize_struct("JsonResult", 2)?;
                state.serialize_field("ok", &true)?;
                state.serialize_field("value", value)?;
                state.end()
            }
            JsonResult::Failure(failure) => {
                let mut state = serializer.serialize_struct("JsonResult", 3)?;
                state.serialize_field("ok", &false)?;
                state.serialize_field("error", &failure.to_string())?;
                state.serialize_field("code", failure.code())?;
                state.end()
            }
        }
    }
}

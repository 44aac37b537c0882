//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur while validating user-supplied field values.
///
/// Validation errors are local to a dialogue step: the scene re-prompts the
/// same step with a corrective message and never surfaces them as system
/// failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i32,
        max: i32,
        actual: i32,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i32, max: i32, actual: i32) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyField,
    OutOfRange,
    InvalidFormat,

    // Not found errors
    ClientNotFound,
    AppointmentNotFound,
    DoctorNotFound,
    SessionNotFound,

    // State errors
    StateCorruption,
    InvalidStateTransition,

    // External collaborator errors
    BookingServiceError,
    InterpreterError,
    RulesUnavailable,

    // Infrastructure errors
    CacheError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::ClientNotFound => "CLIENT_NOT_FOUND",
            ErrorCode::AppointmentNotFound => "APPOINTMENT_NOT_FOUND",
            ErrorCode::DoctorNotFound => "DOCTOR_NOT_FOUND",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::StateCorruption => "STATE_CORRUPTION",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::BookingServiceError => "BOOKING_SERVICE_ERROR",
            ErrorCode::InterpreterError => "INTERPRETER_ERROR",
            ErrorCode::RulesUnavailable => "RULES_UNAVAILABLE",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Dialogue-level error taxonomy.
///
/// Each variant carries its own recovery policy: validation re-prompts the
/// current step, not-found resets the scene, external-service failures
/// degrade to a human-follow-up message, and state corruption wipes the
/// session so the user can start over.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {detail}")]
    NotFound { entity: &'static str, detail: String },

    #[error("External service '{service}' failed: {reason}")]
    ExternalService { service: &'static str, reason: String },

    #[error("Corrupted session state: {0}")]
    StateCorruption(String),
}

impl DialogError {
    /// Creates a not-found error for a named entity.
    pub fn not_found(entity: &'static str, detail: impl Into<String>) -> Self {
        DialogError::NotFound {
            entity,
            detail: detail.into(),
        }
    }

    /// Creates an external-service error.
    pub fn external(service: &'static str, reason: impl Into<String>) -> Self {
        DialogError::ExternalService {
            service,
            reason: reason.into(),
        }
    }

    /// Error code for structured logging.
    pub fn code(&self) -> ErrorCode {
        match self {
            DialogError::Validation(_) => ErrorCode::ValidationFailed,
            DialogError::NotFound { entity, .. } => match *entity {
                "client" => ErrorCode::ClientNotFound,
                "appointment" => ErrorCode::AppointmentNotFound,
                "doctor" => ErrorCode::DoctorNotFound,
                _ => ErrorCode::SessionNotFound,
            },
            DialogError::ExternalService { service, .. } => match *service {
                "interpreter" => ErrorCode::InterpreterError,
                "rules" => ErrorCode::RulesUnavailable,
                _ => ErrorCode::BookingServiceError,
            },
            DialogError::StateCorruption(_) => ErrorCode::StateCorruption,
        }
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;
use validator::Validate;

use crate::{
    errors::{ApiError, FieldErrors, ServiceError, StepError},
    flash::{Flash, FlashCookies, FlashRedirect},
};

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Validate request input; failures become a 422 with per-field messages
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::Validation(FieldErrors::from(&e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    match err {
        ServiceError::ValidationError(message) => {
            ApiError::Validation(FieldErrors::single("form", message))
        }
        other => ApiError::ServiceError(other),
    }
}

/// Logs the cause and queues the step's message for the current page
pub fn step_flashed(flash: &FlashCookies, err: &StepError) {
    warn!(error = %err.message, cause = %err.source, kind = err.source.kind(), "workflow step failed");
    flash.set(&Flash::error(err.message.clone()));
}

/// Logs the cause and redirects with the step's message
pub fn step_failed(flash: &FlashCookies, location: impl Into<String>, err: &StepError) -> FlashRedirect {
    warn!(error = %err.message, cause = %err.source, kind = err.source.kind(), "workflow step failed");
    flash.redirect(location, Flash::error(err.message.clone()))
}

/// Permission problems surface as 403 rather than a flash
pub fn forbidden_step(err: &StepError) -> Option<ApiError> {
    match &err.source {
        ServiceError::Forbidden(message) => Some(ApiError::Forbidden(message.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    #[test]
    fn validation_maps_to_field_errors() {
        let err = validate_input(&Form { name: String::new() }).unwrap_err();
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields.get("name"), Some(&["Name is required".to_string()][..]))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn forbidden_cause_is_not_flashed() {
        let err = StepError::new("Failed to create supplier", ServiceError::Forbidden("nope".into()));
        assert!(matches!(forbidden_step(&err), Some(ApiError::Forbidden(_))));
        assert!(forbidden_step(&StepError::missing("Failed to get company")).is_none());
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::repository::RepoError;
use crate::scheduling::SchedulingError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    Internal(String),
}

impl ApiError {
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("INVALID_CREDENTIALS", "Username or password is incorrect".into())
    }

    pub fn session_expired() -> Self {
        ApiError::Unauthorized("SESSION_EXPIRED", "Session expired".into())
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound("NOT_FOUND", format!("{what} not found"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::BadRequest("VALIDATION_ERROR", message.into())
    }

    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: code.to_string(),
                message: message.to_string(),
            },
        })
    }
}

/// Map a failed CRUD query. Constraint violations (duplicate username,
/// dangling foreign key) are the caller's fault.
pub fn db_error(e: sqlx::Error) -> ApiError {
    RepoError::from(e).into()
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(what) => ApiError::not_found(what),
            RepoError::Constraint(msg) => ApiError::BadRequest("CONSTRAINT_VIOLATION", msg),
            RepoError::Database(e) => ApiError::Internal(format!("db error: {e}")),
        }
    }
}

impl From<SchedulingError> for ApiError {
    fn from(e: SchedulingError) -> Self {
        let msg = e.to_string();
        match e {
            SchedulingError::NoActiveSchedule => ApiError::BadRequest("NO_ACTIVE_SCHEDULE", msg),
            SchedulingError::NotWithinWorkHours => ApiError::BadRequest("NOT_WITHIN_WORK_HOURS", msg),
            SchedulingError::TimeSlotConflict => ApiError::Conflict("TIME_SLOT_ALLOCATED", msg),
            SchedulingError::ScheduleAlreadyActive => {
                ApiError::Conflict("SCHEDULE_ALREADY_ACTIVE", msg)
            }
            SchedulingError::ScheduleNotActive => ApiError::BadRequest("SCHEDULE_NOT_ACTIVE", msg),
            SchedulingError::MalformedDuration(_) => ApiError::BadRequest("MALFORMED_DURATION", msg),
            SchedulingError::InvalidTimeOfDay(_) | SchedulingError::InvalidWorkHours { .. } => {
                ApiError::BadRequest("INVALID_TIME_OF_DAY", msg)
            }
            SchedulingError::NotOwner(_) => ApiError::Forbidden("FORBIDDEN", msg),
            SchedulingError::NoSuchUser => ApiError::NotFound("NO_SUCH_USER", msg),
            SchedulingError::Repository(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(code, msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Forbidden(code, msg) => {
                (StatusCode::FORBIDDEN, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::BadRequest(code, msg) => {
                (StatusCode::BAD_REQUEST, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::NotFound(code, msg) => {
                (StatusCode::NOT_FOUND, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Conflict(code, msg) => {
                (StatusCode::CONFLICT, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::to_error_response("INTERNAL", &msg),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: impl Into<ApiError>) -> StatusCode {
        e.into().into_response().status()
    }

    #[test]
    fn scheduling_errors_map_to_statuses() {
        assert_eq!(status_of(SchedulingError::TimeSlotConflict), StatusCode::CONFLICT);
        assert_eq!(status_of(SchedulingError::ScheduleAlreadyActive), StatusCode::CONFLICT);
        assert_eq!(status_of(SchedulingError::NoActiveSchedule), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(SchedulingError::NotWithinWorkHours), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(SchedulingError::ScheduleNotActive), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(SchedulingError::NotOwner("patient")), StatusCode::FORBIDDEN);
        assert_eq!(status_of(SchedulingError::NoSuchUser), StatusCode::NOT_FOUND);
    }

    #[test]
    fn repository_errors_pass_through() {
        assert_eq!(
            status_of(SchedulingError::Repository(RepoError::NotFound("appointment"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RepoError::Database(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

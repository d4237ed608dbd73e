use crate::error::ApiError;
use crate::models::AppState;
use axum::Router;
use serde::{Deserialize, Deserializer};

pub mod appointment_routes;
pub mod auth_routes;
pub mod department_routes;
pub mod health_routes;
pub mod nurse_routes;
pub mod patient_routes;
pub mod physician_routes;
pub mod record_routes;
pub mod schedule_routes;
pub mod user_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/auth", auth_routes::router())
        .nest("/api/v1", department_routes::router())
        .nest("/api/v1", physician_routes::router())
        .nest("/api/v1", nurse_routes::router())
        .nest("/api/v1", patient_routes::router())
        .nest("/api/v1", schedule_routes::router())
        .nest("/api/v1", appointment_routes::router())
        .nest("/api/v1", record_routes::router())
        .nest("/api/v1", user_routes::router())
        .merge(health_routes::router())
        .with_state(state)
}

/// Trimmed value of a required text field.
pub(crate) fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(v)
}

pub(crate) fn valid_email(email: &str) -> Result<&str, ApiError> {
    let e = required("email", email)?;
    match e.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(e),
        _ => Err(ApiError::validation("email is not a valid address")),
    }
}

/// For PATCH bodies: absent field => `None`, explicit `null` => `Some(None)`.
pub(crate) fn deserialize_double_option<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_double_option")]
        about: Option<Option<String>>,
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.about, None);
        let null: Patch = serde_json::from_str(r#"{"about":null}"#).unwrap();
        assert_eq!(null.about, Some(None));
        let set: Patch = serde_json::from_str(r#"{"about":"hi"}"#).unwrap();
        assert_eq!(set.about, Some(Some("hi".into())));
    }

    #[test]
    fn required_fields_are_trimmed() {
        assert_eq!(required("full_name", "  Ada ").unwrap(), "Ada");
        assert!(required("full_name", "   ").is_err());
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(valid_email("nurse@clinic.org").is_ok());
        assert!(valid_email("nurse@clinic").is_err());
        assert!(valid_email("@clinic.org").is_err());
        assert!(valid_email("").is_err());
    }
}

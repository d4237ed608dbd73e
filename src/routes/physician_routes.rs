// src/routes/physician_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{deserialize_double_option, required, valid_email};
use crate::{
    error::{ApiError, db_error},
    middleware::auth_context::AuthContext,
    models::{
        ApiOk, AppState, Appointment, ListQuery, OkData, PatientRecordRow, PhysicianRow,
        ROLE_NURSE, ROLE_PHYSICIAN, Schedule,
    },
};

const PHYSICIAN_COLUMNS: &str =
    "physician_id, username, full_name, email, contact, department_name, about, verified, created_at";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/physicians", get(list_physicians).post(create_physician))
        .route(
            "/physicians/{physician_id}",
            get(get_physician)
                .patch(update_physician)
                .delete(delete_physician),
        )
        .route("/physicians/{physician_id}/schedules", get(list_physician_schedules))
        .route("/physicians/{physician_id}/appointments", get(list_physician_appointments))
        .route("/physicians/{physician_id}/records", get(list_physician_records))
}

#[derive(Debug, Deserialize)]
pub struct CreatePhysicianRequest {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub contact: String,
    pub department_name: Option<String>,
    pub about: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePhysicianRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub department_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub about: Option<Option<String>>,
    pub verified: Option<bool>,
}

async fn fetch_physician(state: &AppState, physician_id: Uuid) -> Result<PhysicianRow, ApiError> {
    sqlx::query_as::<_, PhysicianRow>(&format!(
        "SELECT {PHYSICIAN_COLUMNS} FROM physician WHERE physician_id = $1"
    ))
    .bind(physician_id)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("physician"))
}

pub async fn list_physicians(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<PhysicianRow>>>, ApiError> {
    let (limit, offset) = q.bounds();
    let rows = sqlx::query_as::<_, PhysicianRow>(&format!(
        r#"
        SELECT {PHYSICIAN_COLUMNS}
        FROM physician
        ORDER BY full_name ASC
        LIMIT $1 OFFSET $2
        "#
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_physician(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(physician_id): Path<Uuid>,
) -> Result<Json<ApiOk<PhysicianRow>>, ApiError> {
    Ok(Json(ApiOk {
        data: fetch_physician(&state, physician_id).await?,
    }))
}

pub async fn create_physician(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreatePhysicianRequest>,
) -> Result<Json<ApiOk<PhysicianRow>>, ApiError> {
    auth.require_role(&[], "register physicians")?;

    let username = required("username", &req.username)?;
    let full_name = required("full_name", &req.full_name)?;
    let email = valid_email(&req.email)?;
    let contact = required("contact", &req.contact)?;
    let department = req
        .department_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let row = sqlx::query_as::<_, PhysicianRow>(&format!(
        r#"
        INSERT INTO physician (username, full_name, email, contact, department_name, about)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {PHYSICIAN_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(full_name)
    .bind(email)
    .bind(contact)
    .bind(department)
    .bind(req.about.as_deref())
    .fetch_one(&state.db)
    .await
    .map_err(db_error)?;

    tracing::info!(physician_id = %row.physician_id, "physician registered");
    Ok(Json(ApiOk { data: row }))
}

pub async fn update_physician(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(physician_id): Path<Uuid>,
    Json(req): Json<UpdatePhysicianRequest>,
) -> Result<Json<ApiOk<PhysicianRow>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN], "update physicians")?;

    let existing = fetch_physician(&state, physician_id).await?;

    let full_name = match req.full_name.as_deref() {
        Some(s) => required("full_name", s)?.to_string(),
        None => existing.full_name,
    };
    let email = match req.email.as_deref() {
        Some(s) => valid_email(s)?.to_string(),
        None => existing.email,
    };
    let contact = match req.contact.as_deref() {
        Some(s) => required("contact", s)?.to_string(),
        None => existing.contact,
    };
    let department_name = req.department_name.unwrap_or(existing.department_name);
    let about = req.about.unwrap_or(existing.about);
    let verified = req.verified.unwrap_or(existing.verified);

    let row = sqlx::query_as::<_, PhysicianRow>(&format!(
        r#"
        UPDATE physician
        SET full_name = $2,
            email = $3,
            contact = $4,
            department_name = $5,
            about = $6,
            verified = $7
        WHERE physician_id = $1
        RETURNING {PHYSICIAN_COLUMNS}
        "#
    ))
    .bind(physician_id)
    .bind(&full_name)
    .bind(&email)
    .bind(&contact)
    .bind(department_name.as_deref())
    .bind(about.as_deref())
    .bind(verified)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("physician"))?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn delete_physician(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(physician_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    auth.require_role(&[], "remove physicians")?;

    let res = sqlx::query("DELETE FROM physician WHERE physician_id = $1")
        .bind(physician_id)
        .execute(&state.db)
        .await
        .map_err(db_error)?;
    if res.rows_affected() == 0 {
        return Err(ApiError::not_found("physician"));
    }

    Ok(Json(ApiOk { data: OkData { ok: true } }))
}

pub async fn list_physician_schedules(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(physician_id): Path<Uuid>,
) -> Result<Json<ApiOk<Vec<Schedule>>>, ApiError> {
    Ok(Json(ApiOk {
        data: state.schedules.for_physician(physician_id).await?,
    }))
}

pub async fn list_physician_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(physician_id): Path<Uuid>,
) -> Result<Json<ApiOk<Vec<Appointment>>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN, ROLE_NURSE], "view a physician's appointments")?;
    Ok(Json(ApiOk {
        data: state.booking.for_physician(physician_id).await?,
    }))
}

pub async fn list_physician_records(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(physician_id): Path<Uuid>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<PatientRecordRow>>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN, ROLE_NURSE], "view medical records")?;
    let (limit, offset) = q.bounds();
    let rows = sqlx::query_as::<_, PatientRecordRow>(
        r#"
        SELECT record_id, patient_id, physician_id, nurse_id, date,
               diagnosis, disease, prescription, weight
        FROM patient_record
        WHERE physician_id = $1
        ORDER BY date DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(physician_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiOk { data: rows }))
}

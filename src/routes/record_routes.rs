// src/routes/record_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::required;
use crate::{
    error::{ApiError, db_error},
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, ListQuery, OkData, PatientRecordRow, ROLE_NURSE, ROLE_PHYSICIAN},
};

const RECORD_COLUMNS: &str =
    "record_id, patient_id, physician_id, nurse_id, date, diagnosis, disease, prescription, weight";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records).post(create_record))
        .route(
            "/records/{record_id}",
            get(get_record).patch(update_record).delete(delete_record),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub patient_id: Uuid,
    pub physician_id: Uuid,
    pub nurse_id: Option<Uuid>,
    pub date: Option<DateTime<Utc>>,
    pub diagnosis: String,
    pub disease: String,
    pub prescription: String,
    pub weight: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecordRequest {
    pub diagnosis: Option<String>,
    pub disease: Option<String>,
    pub prescription: Option<String>,
    pub weight: Option<String>,
}

/// "72kgs" / "160lbs".
fn validate_weight(weight: &str) -> Result<&str, ApiError> {
    let w = required("weight", weight)?;
    let digits = w.trim_end_matches("kgs").trim_end_matches("lbs");
    if digits.len() == w.len() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation("weight must look like 72kgs or 160lbs"));
    }
    Ok(w)
}

fn ensure_clinical(auth: &AuthContext) -> Result<(), ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN, ROLE_NURSE], "access medical records")
}

pub async fn list_records(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<PatientRecordRow>>>, ApiError> {
    ensure_clinical(&auth)?;
    let (limit, offset) = q.bounds();
    let rows = sqlx::query_as::<_, PatientRecordRow>(&format!(
        r#"
        SELECT {RECORD_COLUMNS}
        FROM patient_record
        ORDER BY date DESC
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

pub async fn get_record(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(record_id): Path<Uuid>,
) -> Result<Json<ApiOk<PatientRecordRow>>, ApiError> {
    ensure_clinical(&auth)?;
    let row = sqlx::query_as::<_, PatientRecordRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM patient_record WHERE record_id = $1"
    ))
    .bind(record_id)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("record"))?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn create_record(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateRecordRequest>,
) -> Result<Json<ApiOk<PatientRecordRow>>, ApiError> {
    ensure_clinical(&auth)?;

    let diagnosis = required("diagnosis", &req.diagnosis)?;
    let disease = required("disease", &req.disease)?;
    let prescription = required("prescription", &req.prescription)?;
    let weight = validate_weight(&req.weight)?;

    let row = sqlx::query_as::<_, PatientRecordRow>(&format!(
        r#"
        INSERT INTO patient_record
            (patient_id, physician_id, nurse_id, date, diagnosis, disease, prescription, weight)
        VALUES ($1, $2, $3, COALESCE($4, now()), $5, $6, $7, $8)
        RETURNING {RECORD_COLUMNS}
        "#
    ))
    .bind(req.patient_id)
    .bind(req.physician_id)
    .bind(req.nurse_id)
    .bind(req.date)
    .bind(diagnosis)
    .bind(disease)
    .bind(prescription)
    .bind(weight)
    .fetch_one(&state.db)
    .await
    .map_err(db_error)?;

    tracing::info!(record_id = %row.record_id, patient_id = %row.patient_id, "record created");
    Ok(Json(ApiOk { data: row }))
}

pub async fn update_record(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(record_id): Path<Uuid>,
    Json(req): Json<UpdateRecordRequest>,
) -> Result<Json<ApiOk<PatientRecordRow>>, ApiError> {
    ensure_clinical(&auth)?;

    let diagnosis = req.diagnosis.as_deref().map(|s| required("diagnosis", s)).transpose()?;
    let disease = req.disease.as_deref().map(|s| required("disease", s)).transpose()?;
    let prescription = req
        .prescription
        .as_deref()
        .map(|s| required("prescription", s))
        .transpose()?;
    let weight = req.weight.as_deref().map(validate_weight).transpose()?;

    let row = sqlx::query_as::<_, PatientRecordRow>(&format!(
        r#"
        UPDATE patient_record
        SET diagnosis = COALESCE($2, diagnosis),
            disease = COALESCE($3, disease),
            prescription = COALESCE($4, prescription),
            weight = COALESCE($5, weight)
        WHERE record_id = $1
        RETURNING {RECORD_COLUMNS}
        "#
    ))
    .bind(record_id)
    .bind(diagnosis)
    .bind(disease)
    .bind(prescription)
    .bind(weight)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("record"))?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn delete_record(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(record_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN], "delete medical records")?;

    let res = sqlx::query("DELETE FROM patient_record WHERE record_id = $1")
        .bind(record_id)
        .execute(&state.db)
        .await
        .map_err(db_error)?;
    if res.rows_affected() == 0 {
        return Err(ApiError::not_found("record"));
    }

    Ok(Json(ApiOk { data: OkData { ok: true } }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_needs_a_unit() {
        assert_eq!(validate_weight("72kgs").unwrap(), "72kgs");
        assert!(validate_weight("160lbs").is_ok());
        assert!(validate_weight("72").is_err());
        assert!(validate_weight("kgs").is_err());
        assert!(validate_weight("7x2kgs").is_err());
    }
}

// src/routes/patient_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::{deserialize_double_option, required, valid_email};
use crate::{
    error::{ApiError, db_error},
    middleware::auth_context::AuthContext,
    models::{
        ApiOk, AppState, Appointment, ListQuery, OkData, PatientRecordRow, PatientRow, ROLE_NURSE,
        ROLE_PATIENT, ROLE_PHYSICIAN,
    },
};

const PATIENT_COLUMNS: &str =
    "patient_id, username, full_name, email, dob, contact, blood_group, created_at";

const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/{patient_id}",
            get(get_patient).patch(update_patient).delete(delete_patient),
        )
        .route("/patients/{patient_id}/appointments", get(list_patient_appointments))
        .route("/patients/{patient_id}/records", get(list_patient_records))
}

#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub dob: Option<NaiveDate>,
    pub contact: String,
    pub blood_group: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePatientRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub dob: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub blood_group: Option<Option<String>>,
}

fn validate_dob(dob: Option<NaiveDate>) -> Result<(), ApiError> {
    if dob.is_some_and(|d| d > Utc::now().date_naive()) {
        return Err(ApiError::validation("dob must not be in the future"));
    }
    Ok(())
}

fn validate_blood_group(group: Option<&str>) -> Result<Option<String>, ApiError> {
    match group.map(str::trim).filter(|g| !g.is_empty()) {
        None => Ok(None),
        Some(g) => {
            let g = g.to_ascii_uppercase();
            if BLOOD_GROUPS.contains(&g.as_str()) {
                Ok(Some(g))
            } else {
                Err(ApiError::validation("blood_group must be one of A,B,AB,O with +/-"))
            }
        }
    }
}

async fn fetch_patient(state: &AppState, patient_id: Uuid) -> Result<PatientRow, ApiError> {
    sqlx::query_as::<_, PatientRow>(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patient WHERE patient_id = $1"
    ))
    .bind(patient_id)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("patient"))
}

pub async fn list_patients(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<PatientRow>>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN, ROLE_NURSE], "list patients")?;
    let (limit, offset) = q.bounds();
    let rows = sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        SELECT {PATIENT_COLUMNS}
        FROM patient
        ORDER BY created_at DESC
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

pub async fn get_patient(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiOk<PatientRow>>, ApiError> {
    Ok(Json(ApiOk {
        data: fetch_patient(&state, patient_id).await?,
    }))
}

pub async fn create_patient(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreatePatientRequest>,
) -> Result<Json<ApiOk<PatientRow>>, ApiError> {
    auth.require_role(&[ROLE_NURSE, ROLE_PATIENT], "register patients")?;

    let username = required("username", &req.username)?;
    let full_name = required("full_name", &req.full_name)?;
    let email = valid_email(&req.email)?;
    let contact = required("contact", &req.contact)?;
    validate_dob(req.dob)?;
    let blood_group = validate_blood_group(req.blood_group.as_deref())?;

    let row = sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        INSERT INTO patient (username, full_name, email, dob, contact, blood_group)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {PATIENT_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(full_name)
    .bind(email)
    .bind(req.dob)
    .bind(contact)
    .bind(blood_group)
    .fetch_one(&state.db)
    .await
    .map_err(db_error)?;

    tracing::info!(patient_id = %row.patient_id, "patient registered");
    Ok(Json(ApiOk { data: row }))
}

pub async fn update_patient(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Json(req): Json<UpdatePatientRequest>,
) -> Result<Json<ApiOk<PatientRow>>, ApiError> {
    auth.require_role(&[ROLE_NURSE, ROLE_PATIENT], "update patients")?;

    let existing = fetch_patient(&state, patient_id).await?;

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
    let dob = req.dob.unwrap_or(existing.dob);
    validate_dob(dob)?;
    let blood_group = match req.blood_group {
        Some(g) => validate_blood_group(g.as_deref())?,
        None => existing.blood_group,
    };

    let row = sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        UPDATE patient
        SET full_name = $2,
            email = $3,
            contact = $4,
            dob = $5,
            blood_group = $6
        WHERE patient_id = $1
        RETURNING {PATIENT_COLUMNS}
        "#
    ))
    .bind(patient_id)
    .bind(&full_name)
    .bind(&email)
    .bind(&contact)
    .bind(dob)
    .bind(blood_group)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("patient"))?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    auth.require_role(&[], "remove patients")?;

    let res = sqlx::query("DELETE FROM patient WHERE patient_id = $1")
        .bind(patient_id)
        .execute(&state.db)
        .await
        .map_err(db_error)?;
    if res.rows_affected() == 0 {
        return Err(ApiError::not_found("patient"));
    }

    Ok(Json(ApiOk { data: OkData { ok: true } }))
}

pub async fn list_patient_appointments(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiOk<Vec<Appointment>>>, ApiError> {
    Ok(Json(ApiOk {
        data: state.booking.for_patient(patient_id).await?,
    }))
}

pub async fn list_patient_records(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<PatientRecordRow>>>, ApiError> {
    let (limit, offset) = q.bounds();
    let rows = sqlx::query_as::<_, PatientRecordRow>(
        r#"
        SELECT record_id, patient_id, physician_id, nurse_id, date,
               diagnosis, disease, prescription, weight
        FROM patient_record
        WHERE patient_id = $1
        ORDER BY date DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(patient_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiOk { data: rows }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_group_is_normalised() {
        assert_eq!(validate_blood_group(Some(" ab+ ")).unwrap(), Some("AB+".into()));
        assert_eq!(validate_blood_group(Some("")).unwrap(), None);
        assert_eq!(validate_blood_group(None).unwrap(), None);
        assert!(validate_blood_group(Some("C+")).is_err());
    }

    #[test]
    fn dob_cannot_be_in_the_future() {
        let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
        assert!(validate_dob(Some(tomorrow)).is_err());
        assert!(validate_dob(NaiveDate::from_ymd_opt(1990, 5, 17)).is_ok());
        assert!(validate_dob(None).is_ok());
    }
}

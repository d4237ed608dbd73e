// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{
        ApiOk, AppState, Appointment, AppointmentChanges, ListQuery, NewAppointment, OkData,
        ROLE_NURSE, ROLE_PATIENT, ROLE_PHYSICIAN,
    },
};

/*
Booking paths:
  POST  /appointments/patient/{patient_id}            patient request, stored pending
  POST  /appointments/physician/{physician_id}        physician booking
  PATCH /appointments/physician/{physician_id}/{id}   reschedule by physician
  PATCH /appointments/patient/{patient_id}/{id}       reschedule by patient (resets approval)
  PUT   /appointments/{id}/approval                   approve / withdraw
*/

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments))
        .route(
            "/appointments/{appointment_id}",
            get(get_appointment).delete(delete_appointment),
        )
        .route("/appointments/patient/{patient_id}", post(book_by_patient))
        .route("/appointments/physician/{physician_id}", post(book_by_physician))
        .route(
            "/appointments/physician/{physician_id}/{appointment_id}",
            patch(update_by_physician),
        )
        .route(
            "/appointments/patient/{patient_id}/{appointment_id}",
            patch(update_by_patient),
        )
        .route("/appointments/{appointment_id}/approval", put(set_approval))
}

#[derive(Debug, Deserialize)]
pub struct PatientBookingRequest {
    pub physician_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub duration: String,
}

#[derive(Debug, Deserialize)]
pub struct PhysicianBookingRequest {
    pub patient_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub duration: String,
    pub approved: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

fn validate_date(at: DateTime<Utc>) -> Result<(), ApiError> {
    if at < Utc::now() {
        return Err(ApiError::validation("appointment_date must not be in the past"));
    }
    Ok(())
}

pub async fn list_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<Appointment>>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN, ROLE_NURSE], "list appointments")?;
    let (limit, offset) = q.bounds();
    Ok(Json(ApiOk {
        data: state.booking.list(limit, offset).await?,
    }))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    Ok(Json(ApiOk {
        data: state.booking.find(appointment_id).await?,
    }))
}

pub async fn book_by_patient(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Json(req): Json<PatientBookingRequest>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    auth.require_role(&[ROLE_PATIENT, ROLE_NURSE], "book appointments")?;
    validate_date(req.appointment_date)?;

    let booked = state
        .booking
        .book_by_patient(NewAppointment {
            physician_id: req.physician_id,
            patient_id,
            appointment_date: req.appointment_date,
            duration: req.duration.trim().to_string(),
            approved: false,
        })
        .await?;
    Ok(Json(ApiOk { data: booked }))
}

pub async fn book_by_physician(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(physician_id): Path<Uuid>,
    Json(req): Json<PhysicianBookingRequest>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN], "book appointments for a physician")?;
    validate_date(req.appointment_date)?;

    let booked = state
        .booking
        .book_by_physician(NewAppointment {
            physician_id,
            patient_id: req.patient_id,
            appointment_date: req.appointment_date,
            duration: req.duration.trim().to_string(),
            approved: req.approved.unwrap_or(true),
        })
        .await?;
    Ok(Json(ApiOk { data: booked }))
}

pub async fn update_by_physician(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((physician_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<AppointmentChanges>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN], "reschedule appointments")?;
    if let Some(at) = req.appointment_date {
        validate_date(at)?;
    }
    Ok(Json(ApiOk {
        data: state
            .booking
            .update_by_physician(physician_id, appointment_id, req)
            .await?,
    }))
}

pub async fn update_by_patient(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((patient_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<AppointmentChanges>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    auth.require_role(&[ROLE_PATIENT, ROLE_NURSE], "reschedule appointments")?;
    if let Some(at) = req.appointment_date {
        validate_date(at)?;
    }
    Ok(Json(ApiOk {
        data: state
            .booking
            .update_by_patient(patient_id, appointment_id, req)
            .await?,
    }))
}

pub async fn set_approval(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN], "approve appointments")?;
    Ok(Json(ApiOk {
        data: state.booking.set_approval(appointment_id, req.approved).await?,
    }))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN, ROLE_PATIENT], "cancel appointments")?;
    state.booking.cancel(appointment_id).await?;
    Ok(Json(ApiOk { data: OkData { ok: true } }))
}

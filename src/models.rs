use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::scheduling::{AccessService, BookingService, ScheduleLifecycle};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub session_ttl_hours: i64,
    pub booking: BookingService,
    pub schedules: ScheduleLifecycle,
    pub access: AccessService,
}

/* -------------------------
   Scheduling core
--------------------------*/

/// A physician's declared working hours. `start_time` / `end_time` are
/// wall-clock `HH:MM` strings without a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub schedule_id: Uuid,
    pub physician_id: Uuid,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSchedule {
    pub physician_id: Uuid,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleChanges {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// A booked (or requested) slot. `duration` keeps the textual form it was
/// submitted in, e.g. `1h30m`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub appointment_id: Uuid,
    pub physician_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub duration: String,
    pub approved: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub physician_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub duration: String,
    #[serde(default)]
    pub approved: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentChanges {
    pub appointment_date: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub approved: Option<bool>,
}

fn default_true() -> bool {
    true
}

/* -------------------------
   Access control
--------------------------*/

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Permission {
    pub permission_id: Uuid,
    pub role_id: i16,
    pub permission: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role_id: i16,
    pub is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SessionTokenRow {
    pub session_token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/* -------------------------
   CRUD rows
--------------------------*/

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepartmentRow {
    pub department_id: Uuid,
    pub department_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PhysicianRow {
    pub physician_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub contact: String,
    pub department_name: Option<String>,
    pub about: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NurseRow {
    pub nurse_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PatientRow {
    pub patient_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub dob: Option<NaiveDate>,
    pub contact: String,
    pub blood_group: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PatientRecordRow {
    pub record_id: Uuid,
    pub patient_id: Uuid,
    pub physician_id: Uuid,
    pub nurse_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub diagnosis: String,
    pub disease: String,
    pub prescription: String,
    pub weight: String,
}

/* -------------------------
   API envelopes
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    /// Clamped `(limit, offset)` pair ready to bind.
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/* -------------------------
   Helpers
--------------------------*/

/// Role mapping stored in app_user.role_id:
/// 0 patient, 1 admin, 2 physician, 3 nurse
pub const ROLE_PATIENT: i16 = 0;
pub const ROLE_ADMIN: i16 = 1;
pub const ROLE_PHYSICIAN: i16 = 2;
pub const ROLE_NURSE: i16 = 3;

pub fn role_to_string(role: i16) -> String {
    match role {
        ROLE_PATIENT => "patient",
        ROLE_ADMIN => "admin",
        ROLE_PHYSICIAN => "physician",
        ROLE_NURSE => "nurse",
        _ => "unknown",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_bounds_are_clamped() {
        let q = ListQuery { limit: Some(10_000), offset: Some(-3) };
        assert_eq!(q.bounds(), (ListQuery::MAX_LIMIT, 0));

        let q = ListQuery { limit: None, offset: None };
        assert_eq!(q.bounds(), (ListQuery::DEFAULT_LIMIT, 0));
    }

    #[test]
    fn unknown_role_maps_to_unknown() {
        assert_eq!(role_to_string(ROLE_PHYSICIAN), "physician");
        assert_eq!(role_to_string(42), "unknown");
    }
}

//! Storage seams consumed by the scheduling core.
//!
//! `PgStore` backs the running server. The unit tests drive `InMemoryStore`,
//! which keeps everything in lock-guarded vectors.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Appointment, NewAppointment, NewSchedule, Permission, Schedule, UserRow};

#[cfg(test)]
pub mod inmem;
pub mod pg;

#[cfg(test)]
pub use inmem::InMemoryStore;
pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("db error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.constraint().is_some() => {
                RepoError::Constraint(db.message().to_string())
            }
            _ => RepoError::Database(e),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn create(&self, schedule: NewSchedule) -> RepoResult<Schedule>;
    async fn find(&self, schedule_id: Uuid) -> RepoResult<Schedule>;
    async fn find_all(&self, limit: i64, offset: i64) -> RepoResult<Vec<Schedule>>;
    async fn find_by_physician(&self, physician_id: Uuid) -> RepoResult<Vec<Schedule>>;
    async fn update(&self, schedule: Schedule) -> RepoResult<Schedule>;
    async fn delete(&self, schedule_id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create(&self, appointment: NewAppointment) -> RepoResult<Appointment>;
    async fn find(&self, appointment_id: Uuid) -> RepoResult<Appointment>;
    async fn find_all(&self, limit: i64, offset: i64) -> RepoResult<Vec<Appointment>>;
    async fn find_by_physician(&self, physician_id: Uuid) -> RepoResult<Vec<Appointment>>;
    async fn find_by_patient(&self, patient_id: Uuid) -> RepoResult<Vec<Appointment>>;
    async fn update(&self, appointment: Appointment) -> RepoResult<Appointment>;
    async fn delete(&self, appointment_id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> RepoResult<UserRow>;
    async fn find_by_role(&self, role_id: i16) -> RepoResult<Vec<Permission>>;
}

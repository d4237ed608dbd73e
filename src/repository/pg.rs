use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Appointment, NewAppointment, NewSchedule, Permission, Schedule, UserRow};

use super::{AppointmentStore, PermissionStore, RepoError, RepoResult, ScheduleStore};

/// Postgres-backed stores. Cloning is cheap (the pool is shared).
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const SCHEDULE_COLUMNS: &str = "schedule_id, physician_id, start_time, end_time, active";
const APPOINTMENT_COLUMNS: &str =
    "appointment_id, physician_id, patient_id, appointment_date, duration, approved";

#[async_trait]
impl ScheduleStore for PgStore {
    async fn create(&self, schedule: NewSchedule) -> RepoResult<Schedule> {
        let row = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            INSERT INTO schedule (physician_id, start_time, end_time, active)
            VALUES ($1, $2, $3, $4)
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(schedule.physician_id)
        .bind(&schedule.start_time)
        .bind(&schedule.end_time)
        .bind(schedule.active)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find(&self, schedule_id: Uuid) -> RepoResult<Schedule> {
        sqlx::query_as::<_, Schedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedule WHERE schedule_id = $1"
        ))
        .bind(schedule_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound("schedule"))
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepoResult<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedule
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_physician(&self, physician_id: Uuid) -> RepoResult<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, Schedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedule
            WHERE physician_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(physician_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update(&self, schedule: Schedule) -> RepoResult<Schedule> {
        sqlx::query_as::<_, Schedule>(&format!(
            r#"
            UPDATE schedule
            SET start_time = $2,
                end_time = $3,
                active = $4
            WHERE schedule_id = $1
            RETURNING {SCHEDULE_COLUMNS}
            "#
        ))
        .bind(schedule.schedule_id)
        .bind(&schedule.start_time)
        .bind(&schedule.end_time)
        .bind(schedule.active)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound("schedule"))
    }

    async fn delete(&self, schedule_id: Uuid) -> RepoResult<()> {
        let res = sqlx::query("DELETE FROM schedule WHERE schedule_id = $1")
            .bind(schedule_id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound("schedule"));
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for PgStore {
    async fn create(&self, appointment: NewAppointment) -> RepoResult<Appointment> {
        let row = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            INSERT INTO appointment (physician_id, patient_id, appointment_date, duration, approved)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        ))
        .bind(appointment.physician_id)
        .bind(appointment.patient_id)
        .bind(appointment.appointment_date)
        .bind(&appointment.duration)
        .bind(appointment.approved)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find(&self, appointment_id: Uuid) -> RepoResult<Appointment> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointment WHERE appointment_id = $1"
        ))
        .bind(appointment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound("appointment"))
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepoResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointment
            ORDER BY appointment_date ASC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_physician(&self, physician_id: Uuid) -> RepoResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointment
            WHERE physician_id = $1
            ORDER BY appointment_date ASC
            "#
        ))
        .bind(physician_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> RepoResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointment
            WHERE patient_id = $1
            ORDER BY appointment_date ASC
            "#
        ))
        .bind(patient_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update(&self, appointment: Appointment) -> RepoResult<Appointment> {
        sqlx::query_as::<_, Appointment>(&format!(
            r#"
            UPDATE appointment
            SET appointment_date = $2,
                duration = $3,
                approved = $4,
                updated_at = now()
            WHERE appointment_id = $1
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        ))
        .bind(appointment.appointment_id)
        .bind(appointment.appointment_date)
        .bind(&appointment.duration)
        .bind(appointment.approved)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound("appointment"))
    }

    async fn delete(&self, appointment_id: Uuid) -> RepoResult<()> {
        let res = sqlx::query("DELETE FROM appointment WHERE appointment_id = $1")
            .bind(appointment_id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound("appointment"));
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for PgStore {
    async fn find_user(&self, user_id: Uuid) -> RepoResult<UserRow> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, display_name, password_hash, role_id, is_active
            FROM app_user
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound("user"))
    }

    async fn find_by_role(&self, role_id: i16) -> RepoResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, Permission>(
            r#"
            SELECT permission_id, role_id, permission
            FROM permission
            WHERE role_id = $1
            ORDER BY permission ASC
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

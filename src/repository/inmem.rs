use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Appointment, NewAppointment, NewSchedule, Permission, Schedule, UserRow};

use super::{AppointmentStore, PermissionStore, RepoError, RepoResult, ScheduleStore};

/// Shared-state store for tests. Reads take the shared lock, writes the
/// exclusive one. Insertion order is kept so scans behave like an
/// `ORDER BY` on creation.
#[derive(Default)]
pub struct InMemoryStore {
    schedules: RwLock<Vec<Schedule>>,
    appointments: RwLock<Vec<Appointment>>,
    users: RwLock<Vec<UserRow>>,
    permissions: RwLock<Vec<Permission>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a schedule row as-is, bypassing the lifecycle rules.
    pub fn seed_schedule(&self, schedule: Schedule) {
        self.schedules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(schedule);
    }

    /// Insert an appointment row as-is (including malformed durations).
    pub fn seed_appointment(&self, appointment: Appointment) {
        self.appointments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(appointment);
    }

    pub fn seed_user(&self, user: UserRow, permissions: Vec<Permission>) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user);
        self.permissions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(permissions);
    }

    pub fn appointment_count(&self) -> usize {
        self.appointments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn page<T: Clone>(rows: &[T], limit: i64, offset: i64) -> Vec<T> {
    rows.iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl ScheduleStore for InMemoryStore {
    async fn create(&self, schedule: NewSchedule) -> RepoResult<Schedule> {
        let row = Schedule {
            schedule_id: Uuid::new_v4(),
            physician_id: schedule.physician_id,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            active: schedule.active,
        };
        self.seed_schedule(row.clone());
        Ok(row)
    }

    async fn find(&self, schedule_id: Uuid) -> RepoResult<Schedule> {
        self.schedules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.schedule_id == schedule_id)
            .cloned()
            .ok_or(RepoError::NotFound("schedule"))
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepoResult<Vec<Schedule>> {
        let rows = self.schedules.read().unwrap_or_else(PoisonError::into_inner);
        Ok(page(&rows, limit, offset))
    }

    async fn find_by_physician(&self, physician_id: Uuid) -> RepoResult<Vec<Schedule>> {
        Ok(self
            .schedules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.physician_id == physician_id)
            .cloned()
            .collect())
    }

    async fn update(&self, schedule: Schedule) -> RepoResult<Schedule> {
        let mut rows = self.schedules.write().unwrap_or_else(PoisonError::into_inner);
        let slot = rows
            .iter_mut()
            .find(|s| s.schedule_id == schedule.schedule_id)
            .ok_or(RepoError::NotFound("schedule"))?;
        *slot = schedule.clone();
        Ok(schedule)
    }

    async fn delete(&self, schedule_id: Uuid) -> RepoResult<()> {
        let mut rows = self.schedules.write().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|s| s.schedule_id != schedule_id);
        if rows.len() == before {
            return Err(RepoError::NotFound("schedule"));
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn create(&self, appointment: NewAppointment) -> RepoResult<Appointment> {
        let row = Appointment {
            appointment_id: Uuid::new_v4(),
            physician_id: appointment.physician_id,
            patient_id: appointment.patient_id,
            appointment_date: appointment.appointment_date,
            duration: appointment.duration,
            approved: appointment.approved,
        };
        // Give concurrent callers a chance to interleave between check and write.
        tokio::task::yield_now().await;
        self.seed_appointment(row.clone());
        Ok(row)
    }

    async fn find(&self, appointment_id: Uuid) -> RepoResult<Appointment> {
        tokio::task::yield_now().await;
        self.appointments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| a.appointment_id == appointment_id)
            .cloned()
            .ok_or(RepoError::NotFound("appointment"))
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepoResult<Vec<Appointment>> {
        let rows = self.appointments.read().unwrap_or_else(PoisonError::into_inner);
        Ok(page(&rows, limit, offset))
    }

    async fn find_by_physician(&self, physician_id: Uuid) -> RepoResult<Vec<Appointment>> {
        Ok(self
            .appointments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|a| a.physician_id == physician_id)
            .cloned()
            .collect())
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> RepoResult<Vec<Appointment>> {
        Ok(self
            .appointments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn update(&self, appointment: Appointment) -> RepoResult<Appointment> {
        let mut rows = self.appointments.write().unwrap_or_else(PoisonError::into_inner);
        let slot = rows
            .iter_mut()
            .find(|a| a.appointment_id == appointment.appointment_id)
            .ok_or(RepoError::NotFound("appointment"))?;
        *slot = appointment.clone();
        Ok(appointment)
    }

    async fn delete(&self, appointment_id: Uuid) -> RepoResult<()> {
        let mut rows = self.appointments.write().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|a| a.appointment_id != appointment_id);
        if rows.len() == before {
            return Err(RepoError::NotFound("appointment"));
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn find_user(&self, user_id: Uuid) -> RepoResult<UserRow> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned()
            .ok_or(RepoError::NotFound("user"))
    }

    async fn find_by_role(&self, role_id: i16) -> RepoResult<Vec<Permission>> {
        Ok(self
            .permissions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|p| p.role_id == role_id)
            .cloned()
            .collect())
    }
}

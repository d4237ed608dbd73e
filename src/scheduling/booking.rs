use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentChanges, NewAppointment};
use crate::repository::{AppointmentStore, ScheduleStore};

use super::{
    BookingLocks, SchedulingError,
    conflict::{appointment_end, check_conflicts},
    locks::BookingGuard,
    selector::active_schedule,
    window,
};

/// Whose calendar a booking is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Calendar {
    /// The physician's appointments only.
    Physician,
    /// The physician's appointments and the patient's own.
    PhysicianAndPatient,
}

impl Calendar {
    fn lock_keys(self, physician_id: Uuid, patient_id: Uuid) -> Vec<Uuid> {
        match self {
            Calendar::Physician => vec![physician_id],
            Calendar::PhysicianAndPatient => vec![physician_id, patient_id],
        }
    }
}

/// Books and reschedules appointments against a physician's active schedule
/// and existing approved bookings.
#[derive(Clone)]
pub struct BookingService {
    schedules: Arc<dyn ScheduleStore>,
    appointments: Arc<dyn AppointmentStore>,
    locks: BookingLocks,
}

impl BookingService {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        appointments: Arc<dyn AppointmentStore>,
        locks: BookingLocks,
    ) -> Self {
        Self {
            schedules,
            appointments,
            locks,
        }
    }

    /// A patient's request. Always stored pending; the physician approves it
    /// later.
    pub async fn book_by_patient(
        &self,
        mut request: NewAppointment,
    ) -> Result<Appointment, SchedulingError> {
        request.approved = false;
        self.book(request, Calendar::PhysicianAndPatient).await
    }

    /// A physician booking into their own calendar, approved or not.
    pub async fn book_by_physician(
        &self,
        request: NewAppointment,
    ) -> Result<Appointment, SchedulingError> {
        self.book(request, Calendar::Physician).await
    }

    pub async fn update_by_physician(
        &self,
        physician_id: Uuid,
        appointment_id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Appointment, SchedulingError> {
        self.reschedule(appointment_id, Calendar::Physician, |mut next| {
            if next.physician_id != physician_id {
                return Err(SchedulingError::NotOwner("physician"));
            }
            if let Some(date) = changes.appointment_date {
                next.appointment_date = date;
            }
            if let Some(duration) = changes.duration {
                next.duration = duration;
            }
            if let Some(approved) = changes.approved {
                next.approved = approved;
            }
            Ok(next)
        })
        .await
    }

    /// Patients can move or resize their own appointment but not approve it;
    /// any change puts it back to pending.
    pub async fn update_by_patient(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Appointment, SchedulingError> {
        self.reschedule(appointment_id, Calendar::PhysicianAndPatient, |current| {
            if current.patient_id != patient_id {
                return Err(SchedulingError::NotOwner("patient"));
            }
            let mut next = current.clone();
            if let Some(date) = changes.appointment_date {
                next.appointment_date = date;
            }
            if let Some(duration) = changes.duration {
                next.duration = duration;
            }
            if next.appointment_date != current.appointment_date || next.duration != current.duration {
                next.approved = false;
            }
            Ok(next)
        })
        .await
    }

    /// Toggle approval. Approving makes the appointment authoritative, so it
    /// has to clear the physician's approved calendar first.
    pub async fn set_approval(
        &self,
        appointment_id: Uuid,
        approved: bool,
    ) -> Result<Appointment, SchedulingError> {
        let (_guard, mut current) = self
            .lock_appointment(appointment_id, Calendar::Physician)
            .await?;
        if !approved {
            current.approved = false;
            return Ok(self.appointments.update(current).await?);
        }

        let end = appointment_end(&current)?;
        let existing = self.appointments.find_by_physician(current.physician_id).await?;
        check_conflicts(current.appointment_date, end, Some(appointment_id), &existing)?;

        current.approved = true;
        let updated = self.appointments.update(current).await?;
        info!(
            appointment_id = %updated.appointment_id,
            physician_id = %updated.physician_id,
            "appointment approved"
        );
        Ok(updated)
    }

    pub async fn cancel(&self, appointment_id: Uuid) -> Result<(), SchedulingError> {
        self.appointments.delete(appointment_id).await?;
        info!(%appointment_id, "appointment deleted");
        Ok(())
    }

    pub async fn find(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        Ok(self.appointments.find(appointment_id).await?)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.appointments.find_all(limit, offset).await?)
    }

    pub async fn for_physician(&self, physician_id: Uuid) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.appointments.find_by_physician(physician_id).await?)
    }

    pub async fn for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.appointments.find_by_patient(patient_id).await?)
    }

    async fn book(
        &self,
        request: NewAppointment,
        calendar: Calendar,
    ) -> Result<Appointment, SchedulingError> {
        let end = candidate_end(request.appointment_date, &request.duration)?;
        self.ensure_within_work_hours(request.physician_id, request.appointment_date)
            .await?;

        let _guard = self
            .locks
            .acquire(&calendar.lock_keys(request.physician_id, request.patient_id))
            .await?;
        let existing = self
            .existing(calendar, request.physician_id, request.patient_id)
            .await?;
        check_conflicts(request.appointment_date, end, None, &existing).inspect_err(|_| {
            warn!(
                physician_id = %request.physician_id,
                patient_id = %request.patient_id,
                at = %request.appointment_date,
                "booking rejected: slot taken"
            );
        })?;

        let created = self.appointments.create(request).await?;
        info!(
            appointment_id = %created.appointment_id,
            physician_id = %created.physician_id,
            approved = created.approved,
            "appointment booked"
        );
        Ok(created)
    }

    /// Lock the appointment's parties, then read it again so changes are
    /// merged into the row as it is inside the critical section.
    async fn lock_appointment(
        &self,
        appointment_id: Uuid,
        calendar: Calendar,
    ) -> Result<(BookingGuard, Appointment), SchedulingError> {
        let seen = self.appointments.find(appointment_id).await?;
        let guard = self
            .locks
            .acquire(&calendar.lock_keys(seen.physician_id, seen.patient_id))
            .await?;
        let current = self.appointments.find(appointment_id).await?;
        Ok((guard, current))
    }

    async fn reschedule<F>(
        &self,
        appointment_id: Uuid,
        calendar: Calendar,
        merge: F,
    ) -> Result<Appointment, SchedulingError>
    where
        F: FnOnce(Appointment) -> Result<Appointment, SchedulingError>,
    {
        let (_guard, current) = self.lock_appointment(appointment_id, calendar).await?;
        let next = merge(current)?;

        let end = candidate_end(next.appointment_date, &next.duration)?;
        self.ensure_within_work_hours(next.physician_id, next.appointment_date)
            .await?;
        let existing = self
            .existing(calendar, next.physician_id, next.patient_id)
            .await?;
        check_conflicts(next.appointment_date, end, Some(next.appointment_id), &existing)?;

        let updated = self.appointments.update(next).await?;
        info!(
            appointment_id = %updated.appointment_id,
            physician_id = %updated.physician_id,
            "appointment updated"
        );
        Ok(updated)
    }

    async fn ensure_within_work_hours(
        &self,
        physician_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        let schedules = self.schedules.find_by_physician(physician_id).await?;
        let schedule = active_schedule(&schedules).ok_or_else(|| {
            warn!(%physician_id, "booking rejected: no active schedule");
            SchedulingError::NoActiveSchedule
        })?;

        let opens = window::fractional_hours(&schedule.start_time)?;
        let closes = window::fractional_hours(&schedule.end_time)?;
        let booked = window::fractional_hours(&window::time_of_day(at))?;
        if !window::magnitude_within(opens, closes, booked) {
            warn!(
                %physician_id,
                start = %schedule.start_time,
                end = %schedule.end_time,
                at = %window::time_of_day(at),
                "booking rejected: outside work hours"
            );
            return Err(SchedulingError::NotWithinWorkHours);
        }
        Ok(())
    }

    async fn existing(
        &self,
        calendar: Calendar,
        physician_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut rows = self.appointments.find_by_physician(physician_id).await?;
        if calendar == Calendar::PhysicianAndPatient {
            for a in self.appointments.find_by_patient(patient_id).await? {
                if !rows.iter().any(|r| r.appointment_id == a.appointment_id) {
                    rows.push(a);
                }
            }
        }
        Ok(rows)
    }
}

/// End of a new or moved appointment. Durations must be positive.
fn candidate_end(start: DateTime<Utc>, raw: &str) -> Result<DateTime<Utc>, SchedulingError> {
    let d = window::parse_duration(raw)?;
    if d <= Duration::zero() {
        return Err(SchedulingError::MalformedDuration(raw.to_string()));
    }
    start
        .checked_add_signed(d)
        .ok_or_else(|| SchedulingError::MalformedDuration(raw.to_string()))
}

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::Appointment;

use super::{SchedulingError, window};

/// End instant of a stored appointment (`date + duration`).
pub fn appointment_end(appointment: &Appointment) -> Result<DateTime<Utc>, SchedulingError> {
    let duration = window::parse_duration(&appointment.duration)?;
    appointment
        .appointment_date
        .checked_add_signed(duration)
        .ok_or_else(|| SchedulingError::MalformedDuration(appointment.duration.clone()))
}

/// Reject the candidate `[start, end]` when it overlaps any approved
/// appointment in `existing`, other than `exclude` (the appointment being
/// rescheduled). Both windows are closed, so touching ends collide.
///
/// Pending appointments never block. Every record's duration is parsed,
/// and a single malformed one fails the whole check.
pub fn check_conflicts(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<Uuid>,
    existing: &[Appointment],
) -> Result<(), SchedulingError> {
    for booked in existing {
        let booked_end = appointment_end(booked)?;
        if !booked.approved || Some(booked.appointment_id) == exclude {
            continue;
        }
        if window::instant_within(booked.appointment_date, booked_end, start)
            || window::instant_within(start, end, booked.appointment_date)
        {
            tracing::debug!(
                appointment_id = %booked.appointment_id,
                %start,
                "candidate overlaps approved appointment"
            );
            return Err(SchedulingError::TimeSlotConflict);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    fn booked(start: DateTime<Utc>, duration: &str, approved: bool) -> Appointment {
        Appointment {
            appointment_id: Uuid::new_v4(),
            physician_id: Uuid::nil(),
            patient_id: Uuid::nil(),
            appointment_date: start,
            duration: duration.into(),
            approved,
        }
    }

    #[test]
    fn empty_calendar_accepts_anything() {
        assert!(check_conflicts(at(9, 0), at(10, 0), None, &[]).is_ok());
    }

    #[test]
    fn approved_overlap_conflicts() {
        let existing = [booked(at(9, 0), "1h", true)];
        assert!(matches!(
            check_conflicts(at(9, 30), at(10, 0), None, &existing),
            Err(SchedulingError::TimeSlotConflict)
        ));
    }

    #[test]
    fn end_boundary_conflicts() {
        let existing = [booked(at(9, 0), "1h", true)];
        assert!(matches!(
            check_conflicts(at(10, 0), at(10, 30), None, &existing),
            Err(SchedulingError::TimeSlotConflict)
        ));
        assert!(check_conflicts(at(10, 1), at(10, 31), None, &existing).is_ok());
    }

    #[test]
    fn candidate_running_into_approved_slot_conflicts() {
        let existing = [booked(at(10, 0), "1h", true)];
        for (start, end) in [(at(9, 30), at(10, 30)), (at(9, 0), at(10, 0)), (at(9, 0), at(12, 0))] {
            assert!(
                matches!(
                    check_conflicts(start, end, None, &existing),
                    Err(SchedulingError::TimeSlotConflict)
                ),
                "{start}..{end}"
            );
        }
        assert!(check_conflicts(at(8, 30), at(9, 59), None, &existing).is_ok());
    }

    #[test]
    fn pending_appointments_never_block() {
        let existing = [booked(at(9, 0), "1h", false)];
        assert!(check_conflicts(at(9, 30), at(10, 0), None, &existing).is_ok());
    }

    #[test]
    fn own_slot_is_excluded() {
        let existing = [booked(at(9, 0), "1h", true)];
        let own = existing[0].appointment_id;
        assert!(check_conflicts(at(9, 15), at(10, 15), Some(own), &existing).is_ok());
    }

    #[test]
    fn malformed_duration_fails_closed() {
        // Even a pending, far-away record must parse.
        let existing = [
            booked(at(14, 0), "1h", true),
            booked(at(18, 0), "an hour", false),
        ];
        assert!(matches!(
            check_conflicts(at(9, 0), at(10, 0), None, &existing),
            Err(SchedulingError::MalformedDuration(d)) if d == "an hour"
        ));
    }

    #[test]
    fn end_instant_adds_duration() {
        let a = booked(at(9, 0), "1h30m", true);
        assert_eq!(appointment_end(&a).unwrap(), at(10, 30));
    }
}

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{NewSchedule, Schedule, ScheduleChanges};
use crate::repository::ScheduleStore;

use super::{BookingLocks, SchedulingError, window};

/// Keeps each physician at no more than one active schedule, and lets only
/// the active one be edited.
#[derive(Clone)]
pub struct ScheduleLifecycle {
    schedules: Arc<dyn ScheduleStore>,
    locks: BookingLocks,
}

impl ScheduleLifecycle {
    pub fn new(schedules: Arc<dyn ScheduleStore>, locks: BookingLocks) -> Self {
        Self { schedules, locks }
    }

    pub async fn create_schedule(&self, schedule: NewSchedule) -> Result<Schedule, SchedulingError> {
        validate_hours(&schedule.start_time, &schedule.end_time)?;

        let _guard = self.locks.acquire(&[schedule.physician_id]).await?;
        let existing = self.schedules.find_by_physician(schedule.physician_id).await?;
        if existing.iter().any(|s| s.active) {
            warn!(physician_id = %schedule.physician_id, "schedule rejected: one is already active");
            return Err(SchedulingError::ScheduleAlreadyActive);
        }

        let created = self.schedules.create(schedule).await?;
        info!(
            schedule_id = %created.schedule_id,
            physician_id = %created.physician_id,
            "schedule created"
        );
        Ok(created)
    }

    /// Change the working hours of an active schedule. Owner and `active`
    /// flag are left alone.
    pub async fn update_schedule(
        &self,
        schedule_id: Uuid,
        changes: ScheduleChanges,
    ) -> Result<Schedule, SchedulingError> {
        let current = self.schedules.find(schedule_id).await?;
        if !current.active {
            return Err(SchedulingError::ScheduleNotActive);
        }

        let next = Schedule {
            start_time: changes.start_time.unwrap_or_else(|| current.start_time.clone()),
            end_time: changes.end_time.unwrap_or_else(|| current.end_time.clone()),
            ..current
        };
        validate_hours(&next.start_time, &next.end_time)?;

        let updated = self.schedules.update(next).await?;
        info!(%schedule_id, "schedule updated");
        Ok(updated)
    }

    pub async fn find(&self, schedule_id: Uuid) -> Result<Schedule, SchedulingError> {
        Ok(self.schedules.find(schedule_id).await?)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Schedule>, SchedulingError> {
        Ok(self.schedules.find_all(limit, offset).await?)
    }

    pub async fn for_physician(&self, physician_id: Uuid) -> Result<Vec<Schedule>, SchedulingError> {
        Ok(self.schedules.find_by_physician(physician_id).await?)
    }

    pub async fn delete(&self, schedule_id: Uuid) -> Result<(), SchedulingError> {
        self.schedules.delete(schedule_id).await?;
        info!(%schedule_id, "schedule deleted");
        Ok(())
    }
}

fn validate_hours(start: &str, end: &str) -> Result<(), SchedulingError> {
    window::parse_time_of_day(start)?;
    window::parse_time_of_day(end)?;
    if window::fractional_hours(start)? >= window::fractional_hours(end)? {
        return Err(SchedulingError::InvalidWorkHours {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryStore, RepoError};

    fn lifecycle() -> (Arc<InMemoryStore>, ScheduleLifecycle) {
        let store = Arc::new(InMemoryStore::new());
        let lifecycle = ScheduleLifecycle::new(store.clone(), BookingLocks::default());
        (store, lifecycle)
    }

    fn new_schedule(physician_id: Uuid, active: bool) -> NewSchedule {
        NewSchedule {
            physician_id,
            start_time: "08:00".into(),
            end_time: "15:00".into(),
            active,
        }
    }

    #[tokio::test]
    async fn first_schedule_is_created() {
        let (_, lc) = lifecycle();
        let physician = Uuid::new_v4();
        let s = lc.create_schedule(new_schedule(physician, true)).await.unwrap();
        assert!(s.active);
        assert_eq!(s.physician_id, physician);
    }

    #[tokio::test]
    async fn second_active_schedule_is_rejected() {
        let (store, lc) = lifecycle();
        let physician = Uuid::new_v4();
        lc.create_schedule(new_schedule(physician, true)).await.unwrap();

        let err = lc.create_schedule(new_schedule(physician, true)).await.unwrap_err();
        assert!(matches!(err, SchedulingError::ScheduleAlreadyActive));

        let all = ScheduleStore::find_by_physician(store.as_ref(), physician).await.unwrap();
        assert_eq!(all.iter().filter(|s| s.active).count(), 1);
    }

    #[tokio::test]
    async fn other_physicians_are_independent() {
        let (_, lc) = lifecycle();
        lc.create_schedule(new_schedule(Uuid::new_v4(), true)).await.unwrap();
        lc.create_schedule(new_schedule(Uuid::new_v4(), true)).await.unwrap();
    }

    #[tokio::test]
    async fn inactive_schedules_do_not_block_creation() {
        let (_, lc) = lifecycle();
        let physician = Uuid::new_v4();
        lc.create_schedule(new_schedule(physician, false)).await.unwrap();
        lc.create_schedule(new_schedule(physician, true)).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_creates_leave_one_active() {
        let (_, lc) = lifecycle();
        let physician = Uuid::new_v4();
        let (a, b) = tokio::join!(
            lc.create_schedule(new_schedule(physician, true)),
            lc.create_schedule(new_schedule(physician, true)),
        );
        assert!(a.is_ok() ^ b.is_ok());
    }

    #[tokio::test]
    async fn bad_hours_are_rejected() {
        let (_, lc) = lifecycle();
        let mut s = new_schedule(Uuid::new_v4(), true);
        s.end_time = "5pm".into();
        assert!(matches!(
            lc.create_schedule(s).await,
            Err(SchedulingError::InvalidTimeOfDay(_))
        ));

        let mut s = new_schedule(Uuid::new_v4(), true);
        s.start_time = "18:00".into();
        assert!(matches!(
            lc.create_schedule(s).await,
            Err(SchedulingError::InvalidWorkHours { .. })
        ));
    }

    #[tokio::test]
    async fn only_active_schedule_can_be_updated() {
        let (_, lc) = lifecycle();
        let inactive = lc
            .create_schedule(new_schedule(Uuid::new_v4(), false))
            .await
            .unwrap();
        let err = lc
            .update_schedule(
                inactive.schedule_id,
                ScheduleChanges {
                    end_time: Some("16:00".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::ScheduleNotActive));
    }

    #[tokio::test]
    async fn active_schedule_update_returns_new_fields() {
        let (_, lc) = lifecycle();
        let active = lc
            .create_schedule(new_schedule(Uuid::new_v4(), true))
            .await
            .unwrap();
        let updated = lc
            .update_schedule(
                active.schedule_id,
                ScheduleChanges {
                    start_time: Some("09:30".into()),
                    end_time: Some("18:00".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.start_time, "09:30");
        assert_eq!(updated.end_time, "18:00");
        assert!(updated.active);
        assert_eq!(updated.physician_id, active.physician_id);
        assert_eq!(lc.find(active.schedule_id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn updating_missing_schedule_is_not_found() {
        let (_, lc) = lifecycle();
        let err = lc
            .update_schedule(Uuid::new_v4(), ScheduleChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::Repository(RepoError::NotFound("schedule"))
        ));
    }
}

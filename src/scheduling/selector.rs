use crate::models::Schedule;

/// First schedule flagged active, in the order given. Uniqueness is enforced
/// when schedules are written, not assumed here.
pub fn active_schedule(schedules: &[Schedule]) -> Option<&Schedule> {
    schedules.iter().find(|s| s.active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn schedule(active: bool, start: &str, end: &str) -> Schedule {
        Schedule {
            schedule_id: Uuid::new_v4(),
            physician_id: Uuid::nil(),
            start_time: start.into(),
            end_time: end.into(),
            active,
        }
    }

    #[test]
    fn empty_set_has_no_active_schedule() {
        assert!(active_schedule(&[]).is_none());
    }

    #[test]
    fn all_inactive_has_no_active_schedule() {
        let set = [schedule(false, "08:00", "12:00"), schedule(false, "13:00", "17:00")];
        assert!(active_schedule(&set).is_none());
    }

    #[test]
    fn picks_the_active_entry() {
        let set = [schedule(false, "07:00", "11:00"), schedule(true, "08:00", "17:00")];
        let found = active_schedule(&set).expect("active schedule");
        assert_eq!(found, &set[1]);
        assert_eq!(found.start_time, "08:00");
        assert_eq!(found.end_time, "17:00");
    }

    #[test]
    fn first_match_wins_when_several_are_active() {
        let set = [schedule(true, "09:00", "10:00"), schedule(true, "08:00", "17:00")];
        assert_eq!(active_schedule(&set), Some(&set[0]));
    }
}

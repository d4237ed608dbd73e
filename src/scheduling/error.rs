use thiserror::Error;

use crate::repository::RepoError;

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("no active schedule found for this physician")]
    NoActiveSchedule,

    #[error("appointment not within the physician's work hours")]
    NotWithinWorkHours,

    #[error("this time slot is already booked")]
    TimeSlotConflict,

    #[error("you must have exactly one active schedule")]
    ScheduleAlreadyActive,

    #[error("only an active schedule can be updated")]
    ScheduleNotActive,

    #[error("malformed duration: {0:?}")]
    MalformedDuration(String),

    #[error("invalid time of day: {0:?}")]
    InvalidTimeOfDay(String),

    #[error("work hours must open before they close ({start} - {end})")]
    InvalidWorkHours { start: String, end: String },

    #[error("appointment does not belong to this {0}")]
    NotOwner(&'static str),

    #[error("no such user")]
    NoSuchUser,

    #[error(transparent)]
    Repository(#[from] RepoError),
}

//! Appointment scheduling and conflict resolution.
//!
//! Pure pieces (`window`, `selector`, `conflict`) decide; `BookingService`
//! and `ScheduleLifecycle` read from the stores, decide and write.

pub mod access;
pub mod booking;
pub mod conflict;
pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod selector;
pub mod window;

pub use access::AccessService;
pub use booking::BookingService;
pub use error::SchedulingError;
pub use lifecycle::ScheduleLifecycle;
pub use locks::BookingLocks;

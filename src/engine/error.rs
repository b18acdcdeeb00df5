use crate::store::StoreError;
use chrono::NaiveTime;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    CheckIn,
    CheckOut,
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowKind::CheckIn => write!(f, "check-in"),
            WindowKind::CheckOut => write!(f, "check-out"),
        }
    }
}

/// Business-rule rejections are deterministic: re-attempting a failed
/// precondition yields the same variant. `Backend` is the only
/// non-deterministic kind and the only one a caller may meaningfully
/// retry or degrade on.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("{kind} is allowed only between {open} and {close}")]
    OutsideWindow {
        kind: WindowKind,
        open: NaiveTime,
        close: NaiveTime,
    },
    #[error("you have already checked in today")]
    AlreadyCheckedIn,
    #[error("you have already checked out today")]
    AlreadyCheckedOut,
    #[error("you must check in before checking out")]
    NotCheckedIn,
    #[error("attendance backend unavailable: {0}")]
    Backend(String),
}

impl From<StoreError> for AttendanceError {
    fn from(e: StoreError) -> Self {
        match e {
            // The unique key on (teacher_id, date) is the authoritative
            // duplicate guard; the read-then-write check is only a fast path.
            StoreError::Duplicate => AttendanceError::AlreadyCheckedIn,
            StoreError::Unavailable(reason) => AttendanceError::Backend(reason),
        }
    }
}

#[derive(Debug, Error)]
pub enum AnnouncementError {
    #[error("announcement does not exist")]
    NotFound,
    #[error("you can only modify announcements you created")]
    Unauthorized,
    #[error("announcement backend unavailable: {0}")]
    Backend(String),
}

impl From<StoreError> for AnnouncementError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AnnouncementError::Backend("duplicate row".into()),
            StoreError::Unavailable(reason) => AnnouncementError::Backend(reason),
        }
    }
}

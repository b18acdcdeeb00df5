//! Typed contract against the document store. The engine is constructed
//! over these traits and stays agnostic to which backend serves it: the
//! one-shot query methods and the `watch_*` subscriptions are deliberately
//! separate access modes.

pub mod memory;
pub mod mysql;

use crate::model::announcement::Announcement;
use crate::model::attendance::AttendanceRecord;
use crate::model::role::Role;
use crate::model::user::UserProfile;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::broadcast;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A row already exists for the natural key.
    #[error("duplicate record")]
    Duplicate,
    /// The backend could not be reached or rejected the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::Duplicate;
            }
        }
        StoreError::Unavailable(e.to_string())
    }
}

/// "Start after the last seen item" marker. Ordering is `date` descending
/// with `id` descending as the tiebreak, so the pair pins a unique
/// position in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub date: NaiveDate,
    pub id: u64,
}

impl Cursor {
    pub fn of(record: &AttendanceRecord) -> Self {
        Cursor {
            date: record.date,
            id: record.id,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.date.format("%Y-%m-%d"), self.id)
    }
}

impl FromStr for Cursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date, id) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed cursor {:?}", s))?;
        Ok(Cursor {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| format!("malformed cursor date: {}", e))?,
            id: id.parse().map_err(|_| format!("malformed cursor id {:?}", id))?,
        })
    }
}

/// Ledger change pushed to subscribers after the store confirms a write.
#[derive(Debug, Clone)]
pub enum RecordEvent {
    CheckedIn(AttendanceRecord),
    CheckedOut(AttendanceRecord),
}

impl RecordEvent {
    pub fn record(&self) -> &AttendanceRecord {
        match self {
            RecordEvent::CheckedIn(r) | RecordEvent::CheckedOut(r) => r,
        }
    }
}

/// Board change pushed to subscribers; serialized as-is onto the SSE feed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnouncementEvent {
    Posted(Announcement),
    Updated(Announcement),
    Pinned { id: u64, pinned: bool },
    Deleted { id: u64 },
}

pub struct NewAttendance {
    pub teacher_id: u64,
    pub date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub is_late: bool,
}

pub struct NewAnnouncement {
    pub text: String,
    pub date: DateTime<Utc>,
    pub author_id: u64,
}

pub trait AttendanceStore: Send + Sync + 'static {
    /// Append a record; the store assigns the id. A row already present
    /// for `(teacher_id, date)` yields `StoreError::Duplicate`.
    fn insert_attendance(
        &self,
        rec: NewAttendance,
    ) -> impl Future<Output = Result<AttendanceRecord, StoreError>> + Send;

    /// Equality lookup on the natural key.
    fn find_for_day(
        &self,
        teacher_id: u64,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<AttendanceRecord>, StoreError>> + Send;

    /// Single-field update; nothing but `check_out_time` is touched.
    /// Returns `None` when no row matched (missing or already set).
    fn set_check_out(
        &self,
        id: u64,
        time: NaiveTime,
    ) -> impl Future<Output = Result<Option<AttendanceRecord>, StoreError>> + Send;

    /// Range query: `date` descending (id descending tiebreak), optionally
    /// scoped to one teacher, starting after `after` when given.
    fn attendance_page(
        &self,
        teacher_id: Option<u64>,
        limit: u32,
        after: Option<Cursor>,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, StoreError>> + Send;

    fn attendance_total(
        &self,
        teacher_id: Option<u64>,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Streaming access mode; fires after each confirmed write.
    fn watch_attendance(&self) -> broadcast::Receiver<RecordEvent>;
}

pub trait AnnouncementStore: Send + Sync + 'static {
    fn insert_announcement(
        &self,
        new: NewAnnouncement,
    ) -> impl Future<Output = Result<Announcement, StoreError>> + Send;

    fn get_announcement(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<Announcement>, StoreError>> + Send;

    /// Edit refreshes the sort key together with the text.
    fn update_announcement_text(
        &self,
        id: u64,
        text: String,
        date: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn set_pinned(
        &self,
        id: u64,
        pinned: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_announcement(&self, id: u64) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Whole board, `date` descending; the caller splits pinned from
    /// unpinned and pages the latter.
    fn announcements_desc(
        &self,
    ) -> impl Future<Output = Result<Vec<Announcement>, StoreError>> + Send;

    fn watch_announcements(&self) -> broadcast::Receiver<AnnouncementEvent>;
}

pub trait UserStore: Send + Sync + 'static {
    /// Roster ordered by display name.
    fn list_users(&self) -> impl Future<Output = Result<Vec<UserProfile>, StoreError>> + Send;

    fn get_user(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<UserProfile>, StoreError>> + Send;

    /// First authenticated touch creates the profile with the default
    /// role; later calls leave the stored row alone.
    fn upsert_user(
        &self,
        id: u64,
        name: String,
    ) -> impl Future<Output = Result<UserProfile, StoreError>> + Send;

    /// Returns false when the profile does not exist.
    fn set_role(
        &self,
        id: u64,
        role: Role,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn set_name(
        &self,
        id: u64,
        name: String,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn set_fcm_token(
        &self,
        id: u64,
        token: String,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

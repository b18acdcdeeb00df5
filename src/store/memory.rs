use crate::model::announcement::Announcement;
use crate::model::attendance::AttendanceRecord;
use crate::model::role::Role;
use crate::model::user::UserProfile;
use crate::store::{
    AnnouncementEvent, AnnouncementStore, AttendanceStore, Cursor, NewAnnouncement, NewAttendance,
    RecordEvent, StoreError, UserStore,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;

/// In-process backend with the same observable behavior as the MySQL
/// store. Used by the test suites; `set_offline` simulates an
/// unreachable backend so degradation paths can be exercised.
pub struct MemoryStore {
    attendance: RwLock<Vec<AttendanceRecord>>,
    announcements: RwLock<Vec<Announcement>>,
    users: RwLock<Vec<UserProfile>>,
    next_id: AtomicU64,
    offline: AtomicBool,
    record_events: broadcast::Sender<RecordEvent>,
    announcement_events: broadcast::Sender<AnnouncementEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (record_events, _) = broadcast::channel(EVENT_BUFFER);
        let (announcement_events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            attendance: RwLock::new(Vec::new()),
            announcements: RwLock::new(Vec::new()),
            users: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            offline: AtomicBool::new(false),
            record_events,
            announcement_events,
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn seed_user(&self, id: u64, name: &str, role: Role) {
        self.users
            .write()
            .expect("users lock poisoned")
            .push(UserProfile {
                id,
                name: name.to_string(),
                role,
                fcm_token: None,
            });
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store offline".into()))
        } else {
            Ok(())
        }
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

fn desc(a: &AttendanceRecord, b: &AttendanceRecord) -> std::cmp::Ordering {
    b.date.cmp(&a.date).then(b.id.cmp(&a.id))
}

impl AttendanceStore for MemoryStore {
    async fn insert_attendance(&self, rec: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        self.check_online()?;
        let mut ledger = self.attendance.write().expect("attendance lock poisoned");
        if ledger
            .iter()
            .any(|r| r.teacher_id == rec.teacher_id && r.date == rec.date)
        {
            return Err(StoreError::Duplicate);
        }
        let record = AttendanceRecord {
            id: self.alloc_id(),
            teacher_id: rec.teacher_id,
            date: rec.date,
            check_in_time: rec.check_in_time,
            check_out_time: None,
            is_late: rec.is_late,
        };
        ledger.push(record.clone());
        let _ = self.record_events.send(RecordEvent::CheckedIn(record.clone()));
        Ok(record)
    }

    async fn find_for_day(
        &self,
        teacher_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        self.check_online()?;
        let ledger = self.attendance.read().expect("attendance lock poisoned");
        Ok(ledger
            .iter()
            .find(|r| r.teacher_id == teacher_id && r.date == date)
            .cloned())
    }

    async fn set_check_out(
        &self,
        id: u64,
        time: NaiveTime,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        self.check_online()?;
        let mut ledger = self.attendance.write().expect("attendance lock poisoned");
        let Some(record) = ledger
            .iter_mut()
            .find(|r| r.id == id && r.check_out_time.is_none())
        else {
            return Ok(None);
        };
        record.check_out_time = Some(time);
        let record = record.clone();
        let _ = self
            .record_events
            .send(RecordEvent::CheckedOut(record.clone()));
        Ok(Some(record))
    }

    async fn attendance_page(
        &self,
        teacher_id: Option<u64>,
        limit: u32,
        after: Option<Cursor>,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.check_online()?;
        let ledger = self.attendance.read().expect("attendance lock poisoned");
        let mut rows: Vec<AttendanceRecord> = ledger
            .iter()
            .filter(|r| teacher_id.is_none_or(|t| r.teacher_id == t))
            .filter(|r| {
                after.is_none_or(|c| r.date < c.date || (r.date == c.date && r.id < c.id))
            })
            .cloned()
            .collect();
        rows.sort_by(desc);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn attendance_total(&self, teacher_id: Option<u64>) -> Result<u64, StoreError> {
        self.check_online()?;
        let ledger = self.attendance.read().expect("attendance lock poisoned");
        Ok(ledger
            .iter()
            .filter(|r| teacher_id.is_none_or(|t| r.teacher_id == t))
            .count() as u64)
    }

    fn watch_attendance(&self) -> broadcast::Receiver<RecordEvent> {
        self.record_events.subscribe()
    }
}

impl AnnouncementStore for MemoryStore {
    async fn insert_announcement(&self, new: NewAnnouncement) -> Result<Announcement, StoreError> {
        self.check_online()?;
        let announcement = Announcement {
            id: self.alloc_id(),
            text: new.text,
            date: new.date,
            author_id: new.author_id,
            pinned: false,
        };
        self.announcements
            .write()
            .expect("announcements lock poisoned")
            .push(announcement.clone());
        let _ = self
            .announcement_events
            .send(AnnouncementEvent::Posted(announcement.clone()));
        Ok(announcement)
    }

    async fn get_announcement(&self, id: u64) -> Result<Option<Announcement>, StoreError> {
        self.check_online()?;
        let board = self.announcements.read().expect("announcements lock poisoned");
        Ok(board.iter().find(|a| a.id == id).cloned())
    }

    async fn update_announcement_text(
        &self,
        id: u64,
        text: String,
        date: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        let mut board = self.announcements.write().expect("announcements lock poisoned");
        if let Some(a) = board.iter_mut().find(|a| a.id == id) {
            a.text = text;
            a.date = date;
            let _ = self
                .announcement_events
                .send(AnnouncementEvent::Updated(a.clone()));
        }
        Ok(())
    }

    async fn set_pinned(&self, id: u64, pinned: bool) -> Result<(), StoreError> {
        self.check_online()?;
        let mut board = self.announcements.write().expect("announcements lock poisoned");
        if let Some(a) = board.iter_mut().find(|a| a.id == id) {
            a.pinned = pinned;
        }
        let _ = self
            .announcement_events
            .send(AnnouncementEvent::Pinned { id, pinned });
        Ok(())
    }

    async fn delete_announcement(&self, id: u64) -> Result<(), StoreError> {
        self.check_online()?;
        self.announcements
            .write()
            .expect("announcements lock poisoned")
            .retain(|a| a.id != id);
        let _ = self
            .announcement_events
            .send(AnnouncementEvent::Deleted { id });
        Ok(())
    }

    async fn announcements_desc(&self) -> Result<Vec<Announcement>, StoreError> {
        self.check_online()?;
        let board = self.announcements.read().expect("announcements lock poisoned");
        let mut rows: Vec<Announcement> = board.to_vec();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    fn watch_announcements(&self) -> broadcast::Receiver<AnnouncementEvent> {
        self.announcement_events.subscribe()
    }
}

impl UserStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        self.check_online()?;
        let users = self.users.read().expect("users lock poisoned");
        let mut rows: Vec<UserProfile> = users.to_vec();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get_user(&self, id: u64) -> Result<Option<UserProfile>, StoreError> {
        self.check_online()?;
        let users = self.users.read().expect("users lock poisoned");
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn upsert_user(&self, id: u64, name: String) -> Result<UserProfile, StoreError> {
        self.check_online()?;
        let mut users = self.users.write().expect("users lock poisoned");
        if let Some(existing) = users.iter().find(|u| u.id == id) {
            return Ok(existing.clone());
        }
        let profile = UserProfile {
            id,
            name,
            role: Role::Teacher,
            fcm_token: None,
        };
        users.push(profile.clone());
        Ok(profile)
    }

    async fn set_role(&self, id: u64, role: Role) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut users = self.users.write().expect("users lock poisoned");
        match users.iter_mut().find(|u| u.id == id) {
            Some(u) => {
                u.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_name(&self, id: u64, name: String) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut users = self.users.write().expect("users lock poisoned");
        match users.iter_mut().find(|u| u.id == id) {
            Some(u) => {
                u.name = name;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_fcm_token(&self, id: u64, token: String) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut users = self.users.write().expect("users lock poisoned");
        match users.iter_mut().find(|u| u.id == id) {
            Some(u) => {
                u.fcm_token = Some(token);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

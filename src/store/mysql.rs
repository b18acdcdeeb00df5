use crate::model::announcement::Announcement;
use crate::model::attendance::AttendanceRecord;
use crate::model::role::Role;
use crate::model::user::UserProfile;
use crate::store::{
    AnnouncementEvent, AnnouncementStore, AttendanceStore, Cursor, NewAnnouncement, NewAttendance,
    RecordEvent, StoreError, UserStore,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::prelude::FromRow;
use sqlx::MySqlPool;
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;

/// Production backend over the attendance/announcements/users tables.
/// Publishes change events after each confirmed write so subscribers see
/// the same records one-shot queries would return.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    record_events: broadcast::Sender<RecordEvent>,
    announcement_events: broadcast::Sender<AnnouncementEvent>,
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    teacher_id: u64,
    date: NaiveDate,
    check_in_time: NaiveTime,
    check_out_time: Option<NaiveTime>,
    is_late: bool,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(r: AttendanceRow) -> Self {
        AttendanceRecord {
            id: r.id,
            teacher_id: r.teacher_id,
            date: r.date,
            check_in_time: r.check_in_time,
            check_out_time: r.check_out_time,
            is_late: r.is_late,
        }
    }
}

#[derive(FromRow)]
struct AnnouncementRow {
    id: u64,
    text: String,
    date: DateTime<Utc>,
    author_id: u64,
    pinned: bool,
}

impl From<AnnouncementRow> for Announcement {
    fn from(r: AnnouncementRow) -> Self {
        Announcement {
            id: r.id,
            text: r.text,
            date: r.date,
            author_id: r.author_id,
            pinned: r.pinned,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: u64,
    name: String,
    role: String,
    fcm_token: Option<String>,
}

impl From<UserRow> for UserProfile {
    fn from(r: UserRow) -> Self {
        UserProfile {
            id: r.id,
            name: r.name,
            role: Role::from_stored(&r.role),
            fcm_token: r.fcm_token,
        }
    }
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        let (record_events, _) = broadcast::channel(EVENT_BUFFER);
        let (announcement_events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            pool,
            record_events,
            announcement_events,
        }
    }

    async fn fetch_attendance(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, teacher_id, date, check_in_time, check_out_time, is_late
            FROM attendance
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

impl AttendanceStore for MySqlStore {
    async fn insert_attendance(&self, rec: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (teacher_id, date, check_in_time, is_late)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(rec.teacher_id)
        .bind(rec.date)
        .bind(rec.check_in_time)
        .bind(rec.is_late)
        .execute(&self.pool)
        .await?;

        let record = AttendanceRecord {
            id: result.last_insert_id(),
            teacher_id: rec.teacher_id,
            date: rec.date,
            check_in_time: rec.check_in_time,
            check_out_time: None,
            is_late: rec.is_late,
        };
        let _ = self.record_events.send(RecordEvent::CheckedIn(record.clone()));
        Ok(record)
    }

    async fn find_for_day(
        &self,
        teacher_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, teacher_id, date, check_in_time, check_out_time, is_late
            FROM attendance
            WHERE teacher_id = ? AND date = ?
            "#,
        )
        .bind(teacher_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn set_check_out(
        &self,
        id: u64,
        time: NaiveTime,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?
            WHERE id = ?
            AND check_out_time IS NULL
            "#,
        )
        .bind(time)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let record = self.fetch_attendance(id).await?;
        if let Some(record) = &record {
            let _ = self
                .record_events
                .send(RecordEvent::CheckedOut(record.clone()));
        }
        Ok(record)
    }

    async fn attendance_page(
        &self,
        teacher_id: Option<u64>,
        limit: u32,
        after: Option<Cursor>,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut sql = String::from(
            "SELECT id, teacher_id, date, check_in_time, check_out_time, is_late \
             FROM attendance WHERE 1=1",
        );
        if teacher_id.is_some() {
            sql.push_str(" AND teacher_id = ?");
        }
        if after.is_some() {
            sql.push_str(" AND (date < ? OR (date = ? AND id < ?))");
        }
        sql.push_str(" ORDER BY date DESC, id DESC LIMIT ?");

        let mut q = sqlx::query_as::<_, AttendanceRow>(&sql);
        if let Some(teacher_id) = teacher_id {
            q = q.bind(teacher_id);
        }
        if let Some(cursor) = after {
            q = q.bind(cursor.date).bind(cursor.date).bind(cursor.id);
        }
        let rows = q.bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn attendance_total(&self, teacher_id: Option<u64>) -> Result<u64, StoreError> {
        let total: i64 = match teacher_id {
            Some(teacher_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE teacher_id = ?")
                    .bind(teacher_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(total as u64)
    }

    fn watch_attendance(&self) -> broadcast::Receiver<RecordEvent> {
        self.record_events.subscribe()
    }
}

impl AnnouncementStore for MySqlStore {
    async fn insert_announcement(&self, new: NewAnnouncement) -> Result<Announcement, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO announcements (text, date, author_id, pinned)
            VALUES (?, ?, ?, FALSE)
            "#,
        )
        .bind(&new.text)
        .bind(new.date)
        .bind(new.author_id)
        .execute(&self.pool)
        .await?;

        let announcement = Announcement {
            id: result.last_insert_id(),
            text: new.text,
            date: new.date,
            author_id: new.author_id,
            pinned: false,
        };
        let _ = self
            .announcement_events
            .send(AnnouncementEvent::Posted(announcement.clone()));
        Ok(announcement)
    }

    async fn get_announcement(&self, id: u64) -> Result<Option<Announcement>, StoreError> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            "SELECT id, text, date, author_id, pinned FROM announcements WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn update_announcement_text(
        &self,
        id: u64,
        text: String,
        date: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE announcements SET text = ?, date = ? WHERE id = ?")
            .bind(&text)
            .bind(date)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if let Some(updated) = self.get_announcement(id).await? {
            let _ = self
                .announcement_events
                .send(AnnouncementEvent::Updated(updated));
        }
        Ok(())
    }

    async fn set_pinned(&self, id: u64, pinned: bool) -> Result<(), StoreError> {
        sqlx::query("UPDATE announcements SET pinned = ? WHERE id = ?")
            .bind(pinned)
            .bind(id)
            .execute(&self.pool)
            .await?;
        let _ = self
            .announcement_events
            .send(AnnouncementEvent::Pinned { id, pinned });
        Ok(())
    }

    async fn delete_announcement(&self, id: u64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let _ = self
            .announcement_events
            .send(AnnouncementEvent::Deleted { id });
        Ok(())
    }

    async fn announcements_desc(&self) -> Result<Vec<Announcement>, StoreError> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(
            "SELECT id, text, date, author_id, pinned FROM announcements ORDER BY date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn watch_announcements(&self) -> broadcast::Receiver<AnnouncementEvent> {
        self.announcement_events.subscribe()
    }
}

impl UserStore for MySqlStore {
    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, role, fcm_token FROM users ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_user(&self, id: u64) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, role, fcm_token FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn upsert_user(&self, id: u64, name: String) -> Result<UserProfile, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, role)
            VALUES (?, ?, 'teacher')
            ON DUPLICATE KEY UPDATE id = id
            "#,
        )
        .bind(id)
        .bind(&name)
        .execute(&self.pool)
        .await?;

        self.get_user(id)
            .await?
            .ok_or_else(|| StoreError::Unavailable("profile vanished after upsert".into()))
    }

    async fn set_role(&self, id: u64, role: Role) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_name(&self, id: u64, name: String) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_fcm_token(&self, id: u64, token: String) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET fcm_token = ? WHERE id = ?")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

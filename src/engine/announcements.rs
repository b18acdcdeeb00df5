use crate::engine::error::AnnouncementError;
use crate::model::announcement::Announcement;
use crate::store::{AnnouncementStore, NewAnnouncement};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Board view: the whole pinned set rides along with every page, the
/// unpinned set is paginated. Both subsets are date descending.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnnouncementBoard {
    pub pinned: Vec<Announcement>,
    pub unpinned: Vec<Announcement>,
    pub total_unpinned: u64,
    pub page: u32,
    pub has_more: bool,
}

/// Author-gated mutations over the announcement collection. Every write
/// re-reads the stored row and compares `author_id` against the acting
/// user before touching anything.
pub struct AnnouncementService<S> {
    store: Arc<S>,
    page_size: u32,
}

impl<S> Clone for AnnouncementService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            page_size: self.page_size,
        }
    }
}

impl<S: AnnouncementStore> AnnouncementService<S> {
    pub fn new(store: Arc<S>, page_size: u32) -> Self {
        Self { store, page_size }
    }

    pub async fn post(
        &self,
        author_id: u64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Announcement, AnnouncementError> {
        let announcement = self
            .store
            .insert_announcement(NewAnnouncement {
                text: text.trim().to_string(),
                date: now,
                author_id,
            })
            .await?;
        Ok(announcement)
    }

    /// Edit refreshes the sort key along with the text, so edited posts
    /// resurface at the top of the board.
    pub async fn edit(
        &self,
        actor_id: u64,
        id: u64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Announcement, AnnouncementError> {
        let existing = self.owned_by(actor_id, id).await?;
        let text = text.trim().to_string();
        self.store
            .update_announcement_text(id, text.clone(), now)
            .await?;
        Ok(Announcement {
            text,
            date: now,
            ..existing
        })
    }

    pub async fn delete(&self, actor_id: u64, id: u64) -> Result<(), AnnouncementError> {
        self.owned_by(actor_id, id).await?;
        self.store.delete_announcement(id).await?;
        Ok(())
    }

    /// Flips the pinned flag; returns the new state.
    pub async fn toggle_pin(&self, actor_id: u64, id: u64) -> Result<bool, AnnouncementError> {
        let existing = self.owned_by(actor_id, id).await?;
        let pinned = !existing.pinned;
        self.store.set_pinned(id, pinned).await?;
        Ok(pinned)
    }

    pub async fn board(&self, page: u32) -> Result<AnnouncementBoard, AnnouncementError> {
        let page = page.max(1);
        let all = self.store.announcements_desc().await?;

        let (pinned, unpinned): (Vec<Announcement>, Vec<Announcement>) =
            all.into_iter().partition(|a| a.pinned);
        let total_unpinned = unpinned.len() as u64;

        let page_size = self.page_size as usize;
        let visible: Vec<Announcement> = unpinned
            .into_iter()
            .skip((page as usize - 1) * page_size)
            .take(page_size)
            .collect();
        // A full page means there may be more; the same heuristic the
        // board UI paginates with.
        let has_more = visible.len() == page_size;

        Ok(AnnouncementBoard {
            pinned,
            unpinned: visible,
            total_unpinned,
            page,
            has_more,
        })
    }

    async fn owned_by(&self, actor_id: u64, id: u64) -> Result<Announcement, AnnouncementError> {
        let announcement = self
            .store
            .get_announcement(id)
            .await?
            .ok_or(AnnouncementError::NotFound)?;
        if announcement.author_id != actor_id {
            return Err(AnnouncementError::Unauthorized);
        }
        Ok(announcement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn service() -> AnnouncementService<MemoryStore> {
        AnnouncementService::new(Arc::new(MemoryStore::new()), 5)
    }

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 10, h, 0, 0).unwrap()
    }

    #[actix_web::test]
    async fn non_author_mutations_are_rejected_and_leave_the_record_alone() {
        let service = service();
        let posted = service.post(1000, "exam schedule is out", ts(6)).await.unwrap();

        for result in [
            service.edit(2000, posted.id, "defaced", ts(7)).await.err(),
            service.delete(2000, posted.id).await.err(),
            service.toggle_pin(2000, posted.id).await.err(),
        ] {
            assert!(matches!(result, Some(AnnouncementError::Unauthorized)));
        }

        let board = service.board(1).await.unwrap();
        assert_eq!(board.unpinned.len(), 1);
        assert_eq!(board.unpinned[0].text, "exam schedule is out");
        assert!(!board.unpinned[0].pinned);
    }

    #[actix_web::test]
    async fn edit_refreshes_text_and_sort_key_for_the_author() {
        let service = service();
        let first = service.post(1000, "first", ts(6)).await.unwrap();
        service.post(1000, "second", ts(7)).await.unwrap();

        let edited = service.edit(1000, first.id, "first, amended", ts(8)).await.unwrap();
        assert_eq!(edited.text, "first, amended");
        assert_eq!(edited.date, ts(8));

        let board = service.board(1).await.unwrap();
        assert_eq!(board.unpinned[0].id, first.id, "edited post resurfaces on top");
    }

    #[actix_web::test]
    async fn pin_toggle_splits_the_board() {
        let service = service();
        let a = service.post(1000, "a", ts(6)).await.unwrap();
        service.post(1000, "b", ts(7)).await.unwrap();

        assert!(service.toggle_pin(1000, a.id).await.unwrap());
        let board = service.board(1).await.unwrap();
        assert_eq!(board.pinned.len(), 1);
        assert_eq!(board.unpinned.len(), 1);
        assert_eq!(board.total_unpinned, 1);

        assert!(!service.toggle_pin(1000, a.id).await.unwrap());
        let board = service.board(1).await.unwrap();
        assert!(board.pinned.is_empty());
        assert_eq!(board.unpinned.len(), 2);
    }

    #[actix_web::test]
    async fn missing_announcement_is_not_found() {
        let service = service();
        let err = service.delete(1000, 99).await.unwrap_err();
        assert!(matches!(err, AnnouncementError::NotFound));
    }

    #[actix_web::test]
    async fn unpinned_pages_use_the_full_page_heuristic() {
        let service = service();
        for i in 0..7 {
            service.post(1000, &format!("post {i}"), ts(6 + i)).await.unwrap();
        }

        let first = service.board(1).await.unwrap();
        assert_eq!(first.unpinned.len(), 5);
        assert!(first.has_more);

        let second = service.board(2).await.unwrap();
        assert_eq!(second.unpinned.len(), 2);
        assert!(!second.has_more);
        assert_eq!(second.total_unpinned, 7);
    }
}

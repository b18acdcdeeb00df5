use crate::engine::error::{AttendanceError, WindowKind};
use crate::engine::policy::AttendancePolicy;
use crate::engine::projection::ProjectionCache;
use crate::model::attendance::AttendanceRecord;
use crate::store::{AttendanceStore, Cursor, NewAttendance};
use crate::utils::day_filter;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast::error::RecvError;
use utoipa::ToSchema;

/// Inclusive date range applied in memory to an already-fetched window,
/// never pushed down to the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|s| date >= s) && self.end_date.is_none_or(|e| date <= e)
    }

    pub fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PageRequest {
    /// Store-side cursor pagination: start after the last seen item.
    Forward { per_page: u32, after: Option<Cursor> },
    /// Land on an absolute page by re-fetching from the beginning and
    /// keeping the tail slice. O(page²) in fetched rows, acceptable for
    /// the small page counts this view sees.
    Position { page: u32, per_page: u32 },
    /// Bypass pagination up to the hard cap.
    All,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordPage {
    pub records: Vec<AttendanceRecord>,
    /// Pass back as `after` to continue forward.
    #[schema(example = "2026-08-08:41", value_type = Option<String>)]
    pub next_cursor: Option<String>,
    pub total: u64,
    pub page_count: u64,
    pub has_more: bool,
    /// Set when a show-all fetch hit the hard cap with records left over.
    pub truncated: bool,
    /// Set when the backend was unreachable and this is the reconciled
    /// local view instead of an authoritative read.
    pub from_cache: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyCheckIns {
    #[schema(example = "2026-08-08", value_type = String)]
    pub date: NaiveDate,
    pub check_ins: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub daily: Vec<DailyCheckIns>,
    pub late: u64,
    pub on_time: u64,
    pub from_cache: bool,
}

/// Gates check-in/check-out by the policy windows, guarantees
/// at-most-once-per-day semantics, computes lateness once at creation,
/// and serves the paginated / show-all projection.
pub struct AttendanceEngine<S> {
    store: Arc<S>,
    policy: AttendancePolicy,
    projection: Arc<RwLock<ProjectionCache>>,
}

impl<S> Clone for AttendanceEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
            projection: Arc::clone(&self.projection),
        }
    }
}

impl<S: AttendanceStore> AttendanceEngine<S> {
    pub fn new(store: Arc<S>, policy: AttendancePolicy) -> Self {
        let cap = policy.show_all_cap as usize;
        Self {
            store,
            policy,
            projection: Arc::new(RwLock::new(ProjectionCache::new(cap))),
        }
    }

    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }

    pub async fn check_in(
        &self,
        teacher_id: u64,
        now: NaiveDateTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let time = now.time();
        if !self.policy.check_in.contains(time) {
            return Err(AttendanceError::OutsideWindow {
                kind: WindowKind::CheckIn,
                open: self.policy.check_in.open,
                close: self.policy.check_in.close,
            });
        }

        let date = now.date();
        // Fast path: a filter miss proves no record exists for the day, so
        // the store lookup can be skipped. A hit (or false positive) falls
        // through to the authoritative equality query; the unique key on
        // (teacher_id, date) backstops both paths.
        if day_filter::might_exist(teacher_id, date)
            && self.store.find_for_day(teacher_id, date).await?.is_some()
        {
            return Err(AttendanceError::AlreadyCheckedIn);
        }

        let record = self
            .store
            .insert_attendance(NewAttendance {
                teacher_id,
                date,
                check_in_time: time,
                is_late: self.policy.is_late(time),
            })
            .await?;

        day_filter::insert(teacher_id, date);
        self.apply(record.clone());
        Ok(record)
    }

    pub async fn check_out(
        &self,
        teacher_id: u64,
        now: NaiveDateTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let time = now.time();
        if !self.policy.check_out.contains(time) {
            return Err(AttendanceError::OutsideWindow {
                kind: WindowKind::CheckOut,
                open: self.policy.check_out.open,
                close: self.policy.check_out.close,
            });
        }

        let record = self
            .store
            .find_for_day(teacher_id, now.date())
            .await?
            .ok_or(AttendanceError::NotCheckedIn)?;
        if record.check_out_time.is_some() {
            return Err(AttendanceError::AlreadyCheckedOut);
        }

        let updated = self
            .store
            .set_check_out(record.id, time)
            .await?
            // The conditional update matched nothing: a concurrent retry
            // got there first.
            .ok_or(AttendanceError::AlreadyCheckedOut)?;

        self.apply(updated.clone());
        Ok(updated)
    }

    /// Paginated / show-all projection. Business ordering is always date
    /// descending; the date-range filter is applied to the fetched window.
    /// When the backend is unreachable the reconciled local cache is
    /// served instead, marked `from_cache`.
    pub async fn list_page(
        &self,
        scope: Option<u64>,
        filter: &RecordFilter,
        request: PageRequest,
    ) -> Result<RecordPage, AttendanceError> {
        match self.fetch_page(scope, request).await {
            Ok(mut page) => {
                for record in &page.records {
                    self.apply(record.clone());
                }
                if !filter.is_empty() {
                    page.records.retain(|r| filter.matches(r.date));
                }
                Ok(page)
            }
            Err(AttendanceError::Backend(reason)) => {
                tracing::warn!(%reason, "attendance backend unavailable, serving cached view");
                Ok(self.cached_page(scope, filter))
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_page(
        &self,
        scope: Option<u64>,
        request: PageRequest,
    ) -> Result<RecordPage, AttendanceError> {
        let total = self.store.attendance_total(scope).await?;

        match request {
            PageRequest::Forward { per_page, after } => {
                let per_page = per_page.clamp(1, self.policy.show_all_cap);
                let records = self.store.attendance_page(scope, per_page, after).await?;
                let next_cursor = records.last().map(|r| Cursor::of(r).to_string());
                let has_more = records.len() as u64 == per_page as u64;
                Ok(RecordPage {
                    next_cursor,
                    total,
                    page_count: page_count(total, per_page),
                    has_more,
                    truncated: false,
                    from_cache: false,
                    records,
                })
            }
            PageRequest::Position { page, per_page } => {
                let per_page = per_page.clamp(1, self.policy.show_all_cap);
                let page = page.max(1);
                let page_count = page_count(total, per_page);
                if page as u64 > page_count {
                    return Ok(RecordPage {
                        next_cursor: None,
                        total,
                        page_count,
                        has_more: false,
                        truncated: false,
                        from_cache: false,
                        records: Vec::new(),
                    });
                }
                // Re-fetch everything up to the requested page and keep
                // its slice; matches cursor pagination record-for-record.
                let fetched = self
                    .store
                    .attendance_page(scope, per_page.saturating_mul(page), None)
                    .await?;
                let records: Vec<AttendanceRecord> = fetched
                    .into_iter()
                    .skip(per_page.saturating_mul(page - 1) as usize)
                    .take(per_page as usize)
                    .collect();
                let next_cursor = records.last().map(|r| Cursor::of(r).to_string());
                Ok(RecordPage {
                    next_cursor,
                    total,
                    page_count,
                    has_more: (page as u64) < page_count,
                    truncated: false,
                    from_cache: false,
                    records,
                })
            }
            PageRequest::All => {
                let cap = self.policy.show_all_cap;
                let records = self.store.attendance_page(scope, cap, None).await?;
                Ok(RecordPage {
                    next_cursor: None,
                    total,
                    page_count: 1,
                    has_more: false,
                    truncated: total > cap as u64,
                    from_cache: false,
                    records,
                })
            }
        }
    }

    fn cached_page(&self, scope: Option<u64>, filter: &RecordFilter) -> RecordPage {
        let cap = self.policy.show_all_cap as usize;
        let mut records = self
            .projection
            .read()
            .expect("projection lock poisoned")
            .snapshot(scope, cap);
        let total = records.len() as u64;
        if !filter.is_empty() {
            records.retain(|r| filter.matches(r.date));
        }
        RecordPage {
            next_cursor: None,
            total,
            page_count: 1,
            has_more: false,
            truncated: false,
            from_cache: true,
            records,
        }
    }

    /// Per-day check-in counts plus late/on-time tallies over the same
    /// projection the report export consumes.
    pub async fn summary(
        &self,
        scope: Option<u64>,
        filter: &RecordFilter,
    ) -> Result<AttendanceSummary, AttendanceError> {
        let page = self.list_page(scope, filter, PageRequest::All).await?;

        let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        let mut late = 0u64;
        let mut on_time = 0u64;
        for record in &page.records {
            *daily.entry(record.date).or_insert(0) += 1;
            if record.is_late {
                late += 1;
            } else {
                on_time += 1;
            }
        }

        Ok(AttendanceSummary {
            daily: daily
                .into_iter()
                .map(|(date, check_ins)| DailyCheckIns { date, check_ins })
                .collect(),
            late,
            on_time,
            from_cache: page.from_cache,
        })
    }

    fn apply(&self, record: AttendanceRecord) {
        self.projection
            .write()
            .expect("projection lock poisoned")
            .apply(record);
    }

    /// Long-running reconciler: folds confirmed writes from the store's
    /// subscription feed into the local projection. Spawned at startup;
    /// exits when the store drops its sender.
    pub async fn run_reconciler(self) {
        let mut events = self.store.watch_attendance();
        loop {
            match events.recv().await {
                Ok(event) => self.apply(event.record().clone()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "projection reconciler lagged behind the event feed");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

fn page_count(total: u64, per_page: u32) -> u64 {
    total.div_ceil(per_page as u64)
}

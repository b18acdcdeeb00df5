use crate::model::attendance::AttendanceRecord;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Read-side cache of recently seen ledger entries. Updated optimistically
/// on successful writes and reconciled last-write-wins per record id as
/// fetches and subscription events deliver the authoritative rows. Serves
/// as the read-only fallback view when the backend is unreachable.
pub struct ProjectionCache {
    records: HashMap<u64, AttendanceRecord>,
    cap: usize,
}

impl ProjectionCache {
    pub fn new(cap: usize) -> Self {
        Self {
            records: HashMap::new(),
            cap,
        }
    }

    /// Insert or replace by id; the newest version of a record wins.
    pub fn apply(&mut self, record: AttendanceRecord) {
        self.records.insert(record.id, record);
        if self.records.len() > self.cap {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(id) = self
            .records
            .values()
            .min_by_key(|r| (r.date, r.id))
            .map(|r| r.id)
        {
            self.records.remove(&id);
        }
    }

    /// Date-descending view, optionally scoped to one teacher.
    pub fn snapshot(&self, teacher_id: Option<u64>, limit: usize) -> Vec<AttendanceRecord> {
        let mut rows: Vec<AttendanceRecord> = self
            .records
            .values()
            .filter(|r| teacher_id.is_none_or(|t| r.teacher_id == t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        rows
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn record(id: u64, teacher_id: u64, date: &str) -> AttendanceRecord {
        AttendanceRecord {
            id,
            teacher_id,
            date: date.parse::<NaiveDate>().unwrap(),
            check_in_time: NaiveTime::from_hms_opt(7, 15, 0).unwrap(),
            check_out_time: None,
            is_late: false,
        }
    }

    #[test]
    fn apply_is_last_write_wins_per_id() {
        let mut cache = ProjectionCache::new(10);
        cache.apply(record(1, 9, "2026-08-07"));

        let mut updated = record(1, 9, "2026-08-07");
        updated.check_out_time = NaiveTime::from_hms_opt(14, 31, 0);
        cache.apply(updated);

        assert_eq!(cache.len(), 1);
        let snap = cache.snapshot(None, 10);
        assert!(snap[0].check_out_time.is_some());
    }

    #[test]
    fn snapshot_is_date_descending_and_scoped() {
        let mut cache = ProjectionCache::new(10);
        cache.apply(record(1, 9, "2026-08-05"));
        cache.apply(record(2, 9, "2026-08-07"));
        cache.apply(record(3, 8, "2026-08-06"));

        let all = cache.snapshot(None, 10);
        assert_eq!(
            all.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![2, 3, 1]
        );

        let scoped = cache.snapshot(Some(9), 10);
        assert_eq!(scoped.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn cap_evicts_the_oldest_entry() {
        let mut cache = ProjectionCache::new(2);
        cache.apply(record(1, 9, "2026-08-01"));
        cache.apply(record(2, 9, "2026-08-02"));
        cache.apply(record(3, 9, "2026-08-03"));

        assert_eq!(cache.len(), 2);
        let ids: Vec<u64> = cache.snapshot(None, 10).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}

//! Projection behavior over the in-process store: pagination shapes,
//! backward navigation equivalence, the show-all cap, the in-memory date
//! filter, and degradation to the cached view when the backend drops.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sams::engine::{AttendanceEngine, AttendanceError, AttendancePolicy, PageRequest, RecordFilter};
use sams::store::{Cursor, MemoryStore};
use std::sync::Arc;

fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 7, n).unwrap()
}

/// One check-in per day across `days` days for the given teacher.
async fn seed(engine: &AttendanceEngine<MemoryStore>, teacher_id: u64, days: u32) {
    for n in 1..=days {
        engine
            .check_in(teacher_id, at(day(n), 7, 15))
            .await
            .expect("seed check-in");
    }
}

fn engine_with(store: Arc<MemoryStore>) -> AttendanceEngine<MemoryStore> {
    AttendanceEngine::new(store, AttendancePolicy::default())
}

#[actix_web::test]
async fn forward_pagination_yields_5_5_2_over_12_records() {
    let engine = engine_with(Arc::new(MemoryStore::new()));
    seed(&engine, 1, 12).await;
    let filter = RecordFilter::default();

    let first = engine
        .list_page(Some(1), &filter, PageRequest::Forward { per_page: 5, after: None })
        .await
        .unwrap();
    assert_eq!(first.records.len(), 5);
    assert_eq!(first.total, 12);
    assert_eq!(first.page_count, 3);
    assert!(first.has_more);
    // Descending by date: the newest seeded day comes first.
    assert_eq!(first.records[0].date, day(12));
    assert_eq!(first.records[4].date, day(8));

    let after: Cursor = first.next_cursor.as_deref().unwrap().parse().unwrap();
    let second = engine
        .list_page(
            Some(1),
            &filter,
            PageRequest::Forward { per_page: 5, after: Some(after) },
        )
        .await
        .unwrap();
    assert_eq!(second.records.len(), 5);
    assert!(second.has_more);
    assert_eq!(second.records[0].date, day(7));

    let after: Cursor = second.next_cursor.as_deref().unwrap().parse().unwrap();
    let third = engine
        .list_page(
            Some(1),
            &filter,
            PageRequest::Forward { per_page: 5, after: Some(after) },
        )
        .await
        .unwrap();
    assert_eq!(third.records.len(), 2);
    assert!(!third.has_more, "the short last page has no more records");
    assert_eq!(third.records[1].date, day(1));
}

#[actix_web::test]
async fn backward_navigation_returns_the_same_page_as_the_forward_fetch() {
    let engine = engine_with(Arc::new(MemoryStore::new()));
    seed(&engine, 1, 12).await;
    let filter = RecordFilter::default();

    let first = engine
        .list_page(Some(1), &filter, PageRequest::Forward { per_page: 5, after: None })
        .await
        .unwrap();
    let after: Cursor = first.next_cursor.as_deref().unwrap().parse().unwrap();
    let forward_second = engine
        .list_page(
            Some(1),
            &filter,
            PageRequest::Forward { per_page: 5, after: Some(after) },
        )
        .await
        .unwrap();

    // Navigating back from page 3 re-fetches from the beginning and must
    // land on exactly the records the cursor walk saw.
    let positioned_second = engine
        .list_page(Some(1), &filter, PageRequest::Position { page: 2, per_page: 5 })
        .await
        .unwrap();

    let forward_ids: Vec<u64> = forward_second.records.iter().map(|r| r.id).collect();
    let positioned_ids: Vec<u64> = positioned_second.records.iter().map(|r| r.id).collect();
    assert_eq!(forward_ids, positioned_ids);
    assert!(positioned_second.has_more);
}

#[actix_web::test]
async fn show_all_is_capped_and_flags_truncation() {
    let mut policy = AttendancePolicy::default();
    policy.show_all_cap = 10;
    let engine = AttendanceEngine::new(Arc::new(MemoryStore::new()), policy);
    seed(&engine, 1, 12).await;

    let page = engine
        .list_page(Some(1), &RecordFilter::default(), PageRequest::All)
        .await
        .unwrap();
    assert_eq!(page.records.len(), 10);
    assert_eq!(page.total, 12);
    assert!(page.truncated, "true total exceeds the cap");
    assert!(!page.has_more);
}

#[actix_web::test]
async fn date_range_filter_is_inclusive_and_keeps_descending_order() {
    let engine = engine_with(Arc::new(MemoryStore::new()));
    seed(&engine, 1, 12).await;

    let filter = RecordFilter {
        start_date: Some(day(4)),
        end_date: Some(day(9)),
    };
    let page = engine
        .list_page(Some(1), &filter, PageRequest::All)
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = page.records.iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        (4..=9).rev().map(day).collect::<Vec<_>>(),
        "both bounds included, order untouched"
    );
}

#[actix_web::test]
async fn scope_restricts_to_one_teacher() {
    let engine = engine_with(Arc::new(MemoryStore::new()));
    seed(&engine, 1, 3).await;
    seed(&engine, 2, 2).await;

    let own = engine
        .list_page(Some(1), &RecordFilter::default(), PageRequest::All)
        .await
        .unwrap();
    assert_eq!(own.records.len(), 3);
    assert!(own.records.iter().all(|r| r.teacher_id == 1));

    let everyone = engine
        .list_page(None, &RecordFilter::default(), PageRequest::All)
        .await
        .unwrap();
    assert_eq!(everyone.total, 5);
}

#[actix_web::test]
async fn backend_outage_degrades_reads_to_the_cached_view() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(Arc::clone(&store));
    seed(&engine, 1, 4).await;

    // Writes applied optimistically mean the cache already holds the
    // ledger even if no list fetch ever ran.
    store.set_offline(true);

    let page = engine
        .list_page(Some(1), &RecordFilter::default(), PageRequest::Forward {
            per_page: 5,
            after: None,
        })
        .await
        .unwrap();
    assert!(page.from_cache);
    assert_eq!(page.records.len(), 4);
    assert_eq!(page.records[0].date, day(4), "cached view keeps ledger order");

    // Writes do not degrade; the failure is surfaced.
    let err = engine.check_in(9, at(day(20), 7, 0)).await.unwrap_err();
    assert!(matches!(err, AttendanceError::Backend(_)));

    store.set_offline(false);
    let live = engine
        .list_page(Some(1), &RecordFilter::default(), PageRequest::Forward {
            per_page: 5,
            after: None,
        })
        .await
        .unwrap();
    assert!(!live.from_cache);
}

#[actix_web::test]
async fn summary_tallies_daily_counts_and_lateness() {
    // Window reaching past the threshold so late check-ins are possible.
    let mut policy = AttendancePolicy::default();
    policy.check_in.close = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let engine = AttendanceEngine::new(Arc::new(MemoryStore::new()), policy);

    engine.check_in(1, at(day(1), 7, 30)).await.unwrap();
    engine.check_in(2, at(day(1), 8, 15)).await.unwrap();
    engine.check_in(1, at(day(2), 8, 0)).await.unwrap();

    let summary = engine.summary(None, &RecordFilter::default()).await.unwrap();
    assert_eq!(summary.on_time, 1);
    assert_eq!(summary.late, 2);
    assert_eq!(summary.daily.len(), 2);
    assert_eq!(summary.daily[0].check_ins, 2);
    assert_eq!(summary.daily[1].check_ins, 1);
}

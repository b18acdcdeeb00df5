use anyhow::{anyhow, Result};
use autoscale_cuckoo_filter::CuckooFilter;
use chrono::NaiveDate;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real roster sizes.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Approximate membership of `(teacher, day)` pairs that already have a
/// check-in. A miss proves no record exists; a hit must be confirmed
/// against the store, so false positives cannot reject anyone.
static DAY_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

#[inline]
fn key(teacher_id: u64, date: NaiveDate) -> String {
    format!("{}:{}", teacher_id, date.format("%Y-%m-%d"))
}

/// Check whether a day record might exist (false positives possible)
pub fn might_exist(teacher_id: u64, date: NaiveDate) -> bool {
    DAY_FILTER
        .read()
        .expect("day filter poisoned")
        .contains(&key(teacher_id, date))
}

/// Record a confirmed check-in for the day
pub fn insert(teacher_id: u64, date: NaiveDate) {
    DAY_FILTER
        .write()
        .expect("day filter poisoned")
        .add(&key(teacher_id, date));
}

/// Warm up the filter from recent ledger rows using streaming + batching
pub async fn warmup_day_filter(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (u64, NaiveDate)>(
        r#"
        SELECT teacher_id, date
        FROM attendance
        WHERE date >= CURDATE() - INTERVAL ? DAY
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (teacher_id, date) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(key(teacher_id, date));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Day filter warmup complete: {} records (last {} days)", total, days);
    Ok(())
}

fn insert_batch(keys: &[String]) {
    let mut filter = DAY_FILTER.write().expect("day filter poisoned");

    for key in keys {
        filter.add(key);
    }
}

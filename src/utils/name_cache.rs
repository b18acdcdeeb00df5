use crate::store::UserStore;
use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

const UNKNOWN_TEACHER: &str = "Unknown Teacher";

/// user id => display name, backing the head-teacher roster view and the
/// report export so neither refetches profiles per row.
pub static NAME_CACHE: Lazy<Cache<u64, String>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Resolve a display name, falling back to the store on a cache miss.
pub async fn resolve<S: UserStore>(store: &S, user_id: u64) -> String {
    if let Some(name) = NAME_CACHE.get(&user_id).await {
        return name;
    }
    match store.get_user(user_id).await {
        Ok(Some(profile)) => {
            NAME_CACHE.insert(user_id, profile.name.clone()).await;
            profile.name
        }
        _ => UNKNOWN_TEACHER.to_string(),
    }
}

/// Keep the cache current when a profile is renamed
pub async fn rename(user_id: u64, name: &str) {
    NAME_CACHE.insert(user_id, name.to_string()).await;
}

/// Load profile names into the in-memory cache (batched)
pub async fn warmup_name_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (u64, String)>("SELECT id, name FROM users").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (id, name) = row?;
        batch.push((id, name));
        total_count += 1;

        if batch.len() >= batch_size {
            batch_insert(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_insert(&batch).await;
    }

    log::info!("Name cache warmup complete: {} profiles", total_count);

    Ok(())
}

async fn batch_insert(entries: &[(u64, String)]) {
    let futures: Vec<_> = entries
        .iter()
        .map(|(id, name)| NAME_CACHE.insert(*id, name.clone()))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

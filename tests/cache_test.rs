use std::time::Duration;

use errand::cache::sqlite::SqliteCache;
use errand::cache::{CachedResponse, ResponseCache};

fn page(body: &str) -> CachedResponse {
    CachedResponse {
        content_type: "text/html".to_string(),
        body: body.to_string(),
    }
}

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn miss_then_hit() {
    let cache = SqliteCache::in_memory().unwrap();
    assert!(cache.get("shop.test/dogs").await.unwrap().is_none());

    cache.put("shop.test/dogs", &page("<p>dogs</p>"), HOUR).await.unwrap();

    assert_eq!(
        cache.get("shop.test/dogs").await.unwrap(),
        Some(page("<p>dogs</p>"))
    );
    assert!(cache.get("shop.test/cats").await.unwrap().is_none());
}

#[tokio::test]
async fn put_replaces_existing_entry() {
    let cache = SqliteCache::in_memory().unwrap();
    cache.put("u", &page("old"), HOUR).await.unwrap();
    cache.put("u", &page("new"), HOUR).await.unwrap();

    assert_eq!(cache.get("u").await.unwrap().unwrap().body, "new");
}

#[tokio::test]
async fn expired_entries_are_not_served_and_purge() {
    let cache = SqliteCache::in_memory().unwrap();
    cache.put("stale", &page("x"), Duration::ZERO).await.unwrap();
    cache.put("fresh", &page("y"), HOUR).await.unwrap();

    assert!(cache.get("stale").await.unwrap().is_none());
    assert_eq!(cache.purge_expired().await.unwrap(), 1);
    assert!(cache.get("fresh").await.unwrap().is_some());
}

#[tokio::test]
async fn persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");
    let path_str = path.to_str().unwrap();

    {
        let cache = SqliteCache::open(path_str).unwrap();
        cache.put("u", &page("kept"), HOUR).await.unwrap();
    }

    {
        let cache = SqliteCache::open(path_str).unwrap();
        assert_eq!(cache.get("u").await.unwrap().unwrap().body, "kept");
    }
}

#[tokio::test]
async fn huge_ttl_saturates_instead_of_overflowing() {
    let cache = SqliteCache::in_memory().unwrap();
    cache
        .put("forever", &page("z"), Duration::from_secs(u64::MAX))
        .await
        .unwrap();

    assert_eq!(cache.get("forever").await.unwrap().unwrap().body, "z");
    assert_eq!(cache.purge_expired().await.unwrap(), 0);
}

//! Policy document cache rows.
//!
//! One row per robots.txt location, holding the raw document text and the
//! time it was fetched. Staleness is judged by the caller; the table itself
//! never expires rows.

use super::connection::Store;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached policy document.
#[derive(Debug, Clone)]
pub struct CachedPolicy {
    pub content: String,
    /// RFC 3339 timestamp of the fetch that produced `content`.
    pub fetched_at: String,
}

impl CachedPolicy {
    /// Age of this entry, or `None` if the stored timestamp is unparseable.
    pub fn age(&self) -> Option<chrono::Duration> {
        let fetched = chrono::DateTime::parse_from_rfc3339(&self.fetched_at).ok()?;
        Some(chrono::Utc::now().signed_duration_since(fetched))
    }
}

impl Store {
    /// Get a cached policy document by its location.
    ///
    /// Returns None on a miss; never a partial row.
    pub async fn get_policy(&self, location: &str) -> Result<Option<CachedPolicy>, Error> {
        let location = location.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedPolicy>, Error> {
                let result = conn.query_row(
                    "SELECT content, fetched_at FROM robots_txt WHERE url = ?1",
                    params![location],
                    |row| Ok(CachedPolicy { content: row.get(0)?, fetched_at: row.get(1)? }),
                );

                match result {
                    Ok(p) => Ok(Some(p)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a cached policy document, stamped with the current
    /// time.
    ///
    /// Uses UPSERT semantics keyed by location; repeated puts with identical
    /// text only refresh the timestamp.
    pub async fn put_policy(&self, location: &str, content: &str) -> Result<(), Error> {
        self.put_policy_at(location, content, &chrono::Utc::now().to_rfc3339()).await
    }

    /// Insert or replace a cached policy document with an explicit RFC 3339
    /// fetch time. Used when importing rows whose fetch predates this
    /// process.
    pub async fn put_policy_at(&self, location: &str, content: &str, fetched_at: &str) -> Result<(), Error> {
        let location = location.to_string();
        let content = content.to_string();
        let fetched_at = fetched_at.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO robots_txt (url, content, fetched_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(url) DO UPDATE SET
                        content = excluded.content,
                        fetched_at = excluded.fetched_at",
                    params![location, content, fetched_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing() {
        let store = Store::open_in_memory().await.unwrap();
        let result = store.get_policy("https://example.com/robots.txt").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        let loc = "https://example.com/robots.txt";

        store.put_policy(loc, "User-agent: *\nDisallow: /private").await.unwrap();
        store.put_policy(loc, "User-agent: *\nDisallow: /private").await.unwrap();

        let cached = store.get_policy(loc).await.unwrap().unwrap();
        assert_eq!(cached.content, "User-agent: *\nDisallow: /private");
    }

    #[tokio::test]
    async fn test_put_replaces_content() {
        let store = Store::open_in_memory().await.unwrap();
        let loc = "https://example.com/robots.txt";

        store.put_policy(loc, "User-agent: *\nDisallow: /a").await.unwrap();
        store.put_policy(loc, "User-agent: *\nDisallow: /b").await.unwrap();

        let cached = store.get_policy(loc).await.unwrap().unwrap();
        assert_eq!(cached.content, "User-agent: *\nDisallow: /b");
    }

    #[tokio::test]
    async fn test_put_at_preserves_given_timestamp() {
        let store = Store::open_in_memory().await.unwrap();
        let loc = "https://example.com/robots.txt";
        let two_days_ago = (chrono::Utc::now() - chrono::Duration::days(2)).to_rfc3339();

        store.put_policy_at(loc, "User-agent: *\nDisallow: /", &two_days_ago).await.unwrap();

        let cached = store.get_policy(loc).await.unwrap().unwrap();
        assert_eq!(cached.fetched_at, two_days_ago);
        assert!(cached.age().unwrap().num_hours() >= 47);
    }

    #[tokio::test]
    async fn test_age_is_small_for_fresh_put() {
        let store = Store::open_in_memory().await.unwrap();
        let loc = "https://example.com/robots.txt";

        store.put_policy(loc, "").await.unwrap();

        let cached = store.get_policy(loc).await.unwrap().unwrap();
        let age = cached.age().unwrap();
        assert!(age.num_seconds() < 60);
    }
}

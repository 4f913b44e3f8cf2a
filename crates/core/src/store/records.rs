//! Fetch record CRUD operations.
//!
//! One row per resource URL, holding the last observed entity tag, status,
//! and the identity signals extracted from the page. Rows are replaced in
//! full on every terminal fetch; this module never deletes them.

use super::connection::Store;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// The persisted outcome of the last terminal fetch of one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRecord {
    pub url: String,
    /// Entity tag the server returned with this fetch, if any.
    pub etag: Option<String>,
    pub status_code: i32,
    /// RFC 3339 timestamp of the fetch.
    pub fetched_at: String,
    pub title: Option<String>,
    pub canonical_url_header: Option<String>,
    pub canonical_url_html: Option<String>,
    pub og_url: Option<String>,
    pub og_title: Option<String>,
    pub description: Option<String>,
}

impl Store {
    /// Insert or update a fetch record.
    ///
    /// Uses UPSERT semantics keyed by URL: the previous row is overwritten
    /// in full, not merged field by field.
    pub async fn upsert_record(&self, record: &FetchRecord) -> Result<(), Error> {
        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO urls (
                        url, etag, status_code, fetched_at, title,
                        canonical_url_header, canonical_url_html,
                        og_url, og_title, description
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(url) DO UPDATE SET
                        etag = excluded.etag,
                        status_code = excluded.status_code,
                        fetched_at = excluded.fetched_at,
                        title = excluded.title,
                        canonical_url_header = excluded.canonical_url_header,
                        canonical_url_html = excluded.canonical_url_html,
                        og_url = excluded.og_url,
                        og_title = excluded.og_title,
                        description = excluded.description",
                    params![
                        &record.url,
                        &record.etag,
                        &record.status_code,
                        &record.fetched_at,
                        &record.title,
                        &record.canonical_url_header,
                        &record.canonical_url_html,
                        &record.og_url,
                        &record.og_title,
                        &record.description,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a fetch record by URL.
    ///
    /// Returns None if the URL has never been persisted.
    pub async fn get_record(&self, url: &str) -> Result<Option<FetchRecord>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<FetchRecord>, Error> {
                let result = conn.query_row(
                    "SELECT url, etag, status_code, fetched_at, title,
                            canonical_url_header, canonical_url_html,
                            og_url, og_title, description
                     FROM urls WHERE url = ?1",
                    params![url],
                    |row| {
                        Ok(FetchRecord {
                            url: row.get(0)?,
                            etag: row.get(1)?,
                            status_code: row.get(2)?,
                            fetched_at: row.get(3)?,
                            title: row.get(4)?,
                            canonical_url_header: row.get(5)?,
                            canonical_url_html: row.get(6)?,
                            og_url: row.get(7)?,
                            og_title: row.get(8)?,
                            description: row.get(9)?,
                        })
                    },
                );

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Point lookup of the last-seen entity tag for a URL.
    pub async fn etag_for(&self, url: &str) -> Result<Option<String>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT etag FROM urls WHERE url = ?1", params![url], |row| {
                    row.get::<_, Option<String>>(0)
                });

                match result {
                    Ok(etag) => Ok(etag),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}

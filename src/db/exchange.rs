//! Exchange repository for the append-only conversation memory

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::{Error, Result};

/// A persisted exchange: one user input and the response it produced
#[derive(Debug, Clone)]
pub struct ExchangeRecord {
    pub id: i64,
    pub user_input: String,
    pub bot_response: String,
    pub timestamp: DateTime<Utc>,
}

/// Exchange repository for database operations
#[derive(Clone)]
pub struct ExchangeRepo {
    pool: DbPool,
}

impl ExchangeRepo {
    /// Create a new exchange repository
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Recall the response of a previously stored exchange
    ///
    /// Returns the `bot_response` of the first row (in insertion order)
    /// whose `user_input` contains `query` as a case-insensitive
    /// substring, or `None` if nothing matches. Substring containment is
    /// deliberate fuzzy recall: an utterance that merely mentions a
    /// previously seen phrase replays the old answer verbatim.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn recall(&self, query: &str) -> Result<Option<String>> {
        // instr(x, '') is 1 in SQLite; an empty query must never match
        if query.trim().is_empty() {
            return Ok(None);
        }

        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let result = conn.query_row(
            "SELECT bot_response FROM exchanges
             WHERE instr(lower(user_input), lower(?1)) > 0
             ORDER BY id ASC LIMIT 1",
            [query],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(response) => Ok(Some(response)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Append a new exchange
    ///
    /// The row is committed before this returns; a crash afterwards never
    /// loses it.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn append(&self, user_input: &str, bot_response: &str) -> Result<ExchangeRecord> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let now = Utc::now();
        conn.execute(
            "INSERT INTO exchanges (user_input, bot_response, timestamp) VALUES (?1, ?2, ?3)",
            rusqlite::params![user_input, bot_response, now.to_rfc3339()],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, "exchange stored");

        Ok(ExchangeRecord {
            id,
            user_input: user_input.to_string(),
            bot_response: bot_response.to_string(),
            timestamp: now,
        })
    }

    /// Most recent exchanges, newest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn recent(&self, limit: usize) -> Result<Vec<ExchangeRecord>> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, user_input, bot_response, timestamp FROM exchanges
             ORDER BY id DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map([limit], |row| {
                Ok(ExchangeRecord {
                    id: row.get(0)?,
                    user_input: row.get(1)?,
                    bot_response: row.get(2)?,
                    timestamp: parse_datetime(&row.get::<_, String>(3)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Total number of stored exchanges
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn count(&self) -> Result<i64> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;
        let count = conn.query_row("SELECT COUNT(*) FROM exchanges", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Parse an RFC 3339 timestamp, falling back to the epoch on corruption
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn repo() -> ExchangeRepo {
        ExchangeRepo::new(db::init_memory().unwrap())
    }

    #[test]
    fn test_append_assigns_monotonic_ids() {
        let repo = repo();

        let ids: Vec<i64> = (0..5)
            .map(|i| {
                repo.append(&format!("input {i}"), &format!("response {i}"))
                    .unwrap()
                    .id
            })
            .collect();

        for pair in ids.windows(2) {
            assert!(pair[1] > pair[0], "ids must strictly increase");
        }
        assert_eq!(repo.count().unwrap(), 5);
    }

    #[test]
    fn test_recall_substring_containment() {
        let repo = repo();
        repo.append("what time is it", "The current time is 01:00 PM.")
            .unwrap();

        // Stored input contains the query
        assert_eq!(
            repo.recall("time").unwrap().as_deref(),
            Some("The current time is 01:00 PM.")
        );
        // But not the other way around
        assert!(repo.recall("what time is it in london").unwrap().is_none());
    }

    #[test]
    fn test_recall_is_case_insensitive() {
        let repo = repo();
        repo.append("i love pizza", "Great choice!").unwrap();

        assert_eq!(repo.recall("PIZZA").unwrap().as_deref(), Some("Great choice!"));
    }

    #[test]
    fn test_recall_prefers_first_insertion() {
        let repo = repo();
        repo.append("tell me about rust", "first answer").unwrap();
        repo.append("more about rust please", "second answer").unwrap();

        // Deterministic: first match in insertion order wins
        assert_eq!(repo.recall("rust").unwrap().as_deref(), Some("first answer"));
    }

    #[test]
    fn test_recall_empty_query_never_matches() {
        let repo = repo();
        repo.append("hello", "Hi there! How can I help you?").unwrap();

        assert!(repo.recall("").unwrap().is_none());
        assert!(repo.recall("   ").unwrap().is_none());
    }

    #[test]
    fn test_recall_miss() {
        let repo = repo();
        assert!(repo.recall("anything").unwrap().is_none());
    }

    #[test]
    fn test_recent_newest_first() {
        let repo = repo();
        repo.append("one", "1").unwrap();
        repo.append("two", "2").unwrap();
        repo.append("three", "3").unwrap();

        let recent = repo.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].user_input, "three");
        assert_eq!(recent[1].user_input, "two");
    }
}

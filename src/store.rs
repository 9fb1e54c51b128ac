//! Device-local part stores for order reassembly.
//!
//! The reassembler only sees the [`PartStore`] trait — a get/set key-value
//! surface over the list of parts received for one order key. `MemoryStore`
//! scopes reassembly to the process lifetime; `SqliteStore` survives page
//! reloads the way the original receiving device's local storage does, and
//! records when each part arrived so hosts can prune stale orders.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use rusqlite::{params, Connection};
use tracing::info;

use crate::error::StoreError;
use crate::model::OrderChunk;

/// Key-value storage for received order parts, keyed by the rendered
/// reassembly key. `set` replaces the whole list for a key.
pub trait PartStore {
    fn get(&self, key: &str) -> Result<Option<Vec<OrderChunk>>, StoreError>;
    fn set(&self, key: &str, parts: &[OrderChunk]) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Session-scoped store; state is gone when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Vec<OrderChunk>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PartStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<OrderChunk>>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.get(key).cloned())
    }

    fn set(&self, key: &str, parts: &[OrderChunk]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        inner.insert(key.to_string(), parts.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SQLite store
// ---------------------------------------------------------------------------

/// Durable store backed by a local SQLite database, one row per
/// `(order_key, part)` with the chunk serialized as JSON.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        info!(path = %path.display(), "order part store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory variant, used in tests and for hosts that only want
    /// process-lifetime durability with the same code path.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn configure(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;
             CREATE TABLE IF NOT EXISTS order_parts (
                 order_key   TEXT    NOT NULL,
                 part        INTEGER,
                 chunk       TEXT    NOT NULL,
                 received_at TEXT    NOT NULL,
                 PRIMARY KEY (order_key, part)
             );",
        )?;
        Ok(())
    }

    /// Delete parts received more than `max_age` ago. Returns how many rows
    /// were pruned. Incomplete orders whose parts all expire simply require
    /// a full rescan.
    pub fn evict_older_than(&self, max_age: Duration) -> Result<usize, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let cutoff = (Utc::now() - max_age).to_rfc3339();
        let removed = conn.execute(
            "DELETE FROM order_parts WHERE received_at < ?1",
            params![cutoff],
        )?;
        if removed > 0 {
            info!(removed, "evicted stale order parts");
        }
        Ok(removed)
    }
}

impl PartStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<OrderChunk>>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn
            .prepare("SELECT chunk FROM order_parts WHERE order_key = ?1 ORDER BY part ASC")?;

        let rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;

        let mut parts = Vec::new();
        for row in rows {
            let json = row?;
            let chunk: OrderChunk = serde_json::from_str(&json)
                .map_err(|e| StoreError::Corrupt(format!("part for {key}: {e}")))?;
            parts.push(chunk);
        }

        if parts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parts))
        }
    }

    fn set(&self, key: &str, parts: &[OrderChunk]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        tx.execute("DELETE FROM order_parts WHERE order_key = ?1", params![key])?;
        for chunk in parts {
            let json = serde_json::to_string(chunk)
                .map_err(|e| StoreError::Corrupt(format!("serialize part: {e}")))?;
            // Whole-order chunks have no part index; keep that as NULL
            // rather than borrowing part 1's slot.
            tx.execute(
                "INSERT INTO order_parts (order_key, part, chunk, received_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![key, chunk.part, json, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineItem;

    fn part(index: u32, total_parts: u32) -> OrderChunk {
        OrderChunk {
            items: vec![LineItem {
                id: format!("id-{index}"),
                title: format!("Dish {index}"),
                unit_price: 500,
                quantity: 1,
            }],
            table: "9".into(),
            total: 1500,
            part: Some(index),
            total_parts: Some(total_parts),
        }
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert!(store.get("order_9_1500").unwrap().is_none());

        let parts = vec![part(1, 3), part(2, 3)];
        store.set("order_9_1500", &parts).unwrap();
        assert_eq!(store.get("order_9_1500").unwrap().unwrap(), parts);
    }

    #[test]
    fn sqlite_store_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get("order_9_1500").unwrap().is_none());

        let parts = vec![part(1, 3), part(3, 3)];
        store.set("order_9_1500", &parts).unwrap();
        assert_eq!(store.get("order_9_1500").unwrap().unwrap(), parts);
    }

    #[test]
    fn sqlite_set_replaces_previous_parts() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("k", &[part(1, 2)]).unwrap();
        store.set("k", &[part(1, 2), part(2, 2)]).unwrap();

        let stored = store.get("k").unwrap().unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn sqlite_get_returns_parts_in_part_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("k", &[part(3, 3), part(1, 3), part(2, 3)]).unwrap();

        let stored = store.get("k").unwrap().unwrap();
        let order: Vec<u32> = stored.iter().filter_map(|c| c.part).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn sqlite_store_keeps_whole_order_chunks_distinct_from_part_one() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut whole_a = part(1, 1);
        whole_a.part = None;
        whole_a.total_parts = None;
        let mut whole_b = whole_a.clone();
        whole_b.items[0].id = "other".into();

        // Two whole-order chunks under one key must not collide with each
        // other, nor with a real part 1.
        store
            .set("k", &[whole_a.clone(), whole_b.clone(), part(1, 2)])
            .unwrap();

        let stored = store.get("k").unwrap().unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(
            stored.iter().filter(|c| c.part.is_none()).count(),
            2,
            "whole-order chunks must come back with no part index"
        );
        assert_eq!(stored.iter().filter(|c| c.part == Some(1)).count(), 1);
    }

    #[test]
    fn eviction_prunes_only_stale_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("fresh", &[part(1, 2)]).unwrap();

        // Nothing is older than a day yet.
        assert_eq!(store.evict_older_than(Duration::days(1)).unwrap(), 0);
        assert!(store.get("fresh").unwrap().is_some());

        // A zero-age cutoff treats everything already stored as stale.
        assert_eq!(store.evict_older_than(Duration::zero()).unwrap(), 1);
        assert!(store.get("fresh").unwrap().is_none());
    }
}

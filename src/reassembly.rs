//! Part reassembler: accumulates scanned chunks until an order is whole.
//!
//! Chunks of one split order are grouped by `(table, total)` — the tuple
//! every part of the same order carries unchanged. Scans may arrive in any
//! order, partially, or repeatedly: re-scanning a part overwrites its slot
//! so a bad read can be corrected without duplicating items. Parts scanned
//! onto a different device land in that device's own store and never
//! complete here; that is a documented limitation, not a race.

use tracing::{debug, info};

use crate::codec;
use crate::error::DecodeError;
use crate::model::{OrderChunk, SharedOrder};
use crate::store::PartStore;

/// Groups chunks belonging to the same logical order across scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReassemblyKey {
    pub table: String,
    pub total: u64,
}

impl ReassemblyKey {
    pub fn for_chunk(chunk: &OrderChunk) -> Self {
        Self {
            table: chunk.table.clone(),
            total: chunk.total,
        }
    }

    /// Rendered storage key, `order_<table>_<total>`.
    pub fn storage_key(&self) -> String {
        format!("order_{}_{}", self.table, self.total)
    }
}

/// Outcome of feeding one chunk to the reassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassemblyStatus {
    /// Every part is present; the merged order is ready to display.
    Complete(SharedOrder),
    /// A normal waiting state, not an error: `received` of `total_parts`
    /// distinct parts are held so far.
    Incomplete { received: u32, total_parts: u32 },
}

/// Accumulates parts in an injected [`PartStore`] and merges them once all
/// are present.
pub struct Reassembler<S: PartStore> {
    store: S,
}

impl<S: PartStore> Reassembler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store, for host-driven maintenance (eviction).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decode a scanned token and feed it in. Convenience for the receiving
    /// page, which always goes token -> status in one step.
    pub fn accept_token(&self, token: &str) -> Result<ReassemblyStatus, DecodeError> {
        self.accept(codec::decode_token(token)?)
    }

    /// Feed one decoded chunk in.
    ///
    /// Whole-order chunks complete immediately and never touch the store.
    /// Part chunks are validated against what is already held for their key
    /// before anything is written: an out-of-range part index or a
    /// conflicting total-part count is a data-integrity fault and leaves the
    /// stored state untouched.
    pub fn accept(&self, chunk: OrderChunk) -> Result<ReassemblyStatus, DecodeError> {
        if chunk.is_whole_order() {
            return Ok(ReassemblyStatus::Complete(SharedOrder {
                items: chunk.items,
                table: chunk.table,
                total: chunk.total,
            }));
        }

        let (part, total_parts) = match (chunk.part, chunk.total_parts) {
            (Some(p), Some(tp)) => (p, tp),
            _ => {
                return Err(DecodeError::InconsistentParts(
                    "split chunk is missing its part index".to_string(),
                ))
            }
        };
        if part < 1 || part > total_parts {
            return Err(DecodeError::InconsistentParts(format!(
                "part {part} is outside 1..{total_parts}"
            )));
        }

        let key = ReassemblyKey::for_chunk(&chunk).storage_key();
        let mut parts = self.store.get(&key)?.unwrap_or_default();

        if let Some(conflicting) = parts
            .iter()
            .find(|stored| stored.total_parts != Some(total_parts))
        {
            return Err(DecodeError::InconsistentParts(format!(
                "total part count changed from {:?} to {total_parts}",
                conflicting.total_parts
            )));
        }

        // Insert, or overwrite the slot on a rescan of the same part.
        match parts.iter_mut().find(|stored| stored.part == Some(part)) {
            Some(slot) => *slot = chunk,
            None => parts.push(chunk),
        }
        self.store.set(&key, &parts)?;

        let received = parts.len() as u32;
        if received < total_parts {
            debug!(key = %key, received, total_parts, "order part stored, waiting for more");
            return Ok(ReassemblyStatus::Incomplete {
                received,
                total_parts,
            });
        }

        parts.sort_by_key(|stored| stored.part);
        let table = parts[0].table.clone();
        let total = parts[0].total;
        let items = parts.into_iter().flat_map(|stored| stored.items).collect();

        info!(key = %key, total_parts, "order reassembled from scanned parts");
        Ok(ReassemblyStatus::Complete(SharedOrder {
            items,
            table,
            total,
        }))
    }
}

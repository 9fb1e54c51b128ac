//! Chunk splitter: size-driven partitioning of an order into QR-sized parts.
//!
//! The threshold is a policy knob, not a correctness requirement — it trades
//! token size against the number of codes a waiter has to scan. Observed
//! deployments ran it anywhere from 3 to 5 items per chunk.

use tracing::debug;

use crate::model::{LineItem, OrderChunk};

/// Partition a normalized order into shareable chunks.
///
/// At most `max_items_per_chunk` items land in each chunk (a zero threshold
/// is treated as 1). Orders at or under the threshold come back as a single
/// whole-order chunk with no part fields. Split chunks all carry the same
/// `table` and grand `total`, and concatenating their items in part order
/// reproduces the input list exactly.
pub fn split_order(
    items: Vec<LineItem>,
    table: &str,
    total: u64,
    max_items_per_chunk: usize,
) -> Vec<OrderChunk> {
    let threshold = max_items_per_chunk.max(1);

    if items.len() <= threshold {
        return vec![OrderChunk {
            items,
            table: table.to_string(),
            total,
            part: None,
            total_parts: None,
        }];
    }

    let group_count = items.len().div_ceil(threshold);
    let chunks: Vec<OrderChunk> = items
        .chunks(threshold)
        .enumerate()
        .map(|(index, group)| OrderChunk {
            items: group.to_vec(),
            table: table.to_string(),
            total,
            part: Some(index as u32 + 1),
            total_parts: Some(group_count as u32),
        })
        .collect();

    debug!(
        items = chunks.iter().map(|c| c.items.len()).sum::<usize>(),
        parts = chunks.len(),
        threshold,
        "order split into parts"
    );
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<LineItem> {
        (0..n)
            .map(|i| LineItem {
                id: format!("id-{i}"),
                title: format!("Dish {i}"),
                unit_price: 100 * (i as u64 + 1),
                quantity: 1,
            })
            .collect()
    }

    #[test]
    fn at_or_under_threshold_stays_whole() {
        for n in [1, 2, 3] {
            let chunks = split_order(items(n), "5", 900, 3);
            assert_eq!(chunks.len(), 1);
            assert!(chunks[0].part.is_none());
            assert!(chunks[0].total_parts.is_none());
            assert_eq!(chunks[0].items.len(), n);
        }
    }

    #[test]
    fn one_over_threshold_splits_in_two() {
        let chunks = split_order(items(4), "5", 1000, 3);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].items.len(), 3);
        assert_eq!(chunks[1].items.len(), 1);
        assert_eq!(chunks[0].part, Some(1));
        assert_eq!(chunks[1].part, Some(2));
        assert_eq!(chunks[0].total_parts, Some(2));
        assert_eq!(chunks[1].total_parts, Some(2));
    }

    #[test]
    fn chunk_count_is_ceiling_of_items_over_threshold() {
        let chunks = split_order(items(10), "5", 4200, 4);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn every_part_carries_the_grand_total_and_table() {
        let chunks = split_order(items(7), "12", 2800, 3);
        for chunk in &chunks {
            assert_eq!(chunk.table, "12");
            assert_eq!(chunk.total, 2800);
        }
    }

    #[test]
    fn concatenation_in_part_order_reproduces_the_input() {
        let original = items(11);
        let chunks = split_order(original.clone(), "2", 6600, 4);

        let mut sorted = chunks.clone();
        sorted.sort_by_key(|c| c.part);
        let rebuilt: Vec<LineItem> = sorted.into_iter().flat_map(|c| c.items).collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn zero_threshold_is_clamped() {
        let chunks = split_order(items(2), "1", 300, 0);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].items.len(), 1);
    }
}

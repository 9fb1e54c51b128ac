//! Order data model and normalization.
//!
//! The cart side holds rich menu items (bilingual titles, images, tags); the
//! share payload only carries what a waiter needs on a receipt. `normalize`
//! projects the cart down to that minimal form, resolving each title to a
//! single display language at encode time — once encoded, the language of a
//! QR code is fixed.

use serde::{Deserialize, Serialize};

/// Display language for resolved item titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Ru,
    Kk,
}

/// A menu item as the cart holds it. Presentation fields (description,
/// image, tag) never reach the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub title_rus: String,
    pub title_kaz: String,
    /// Unit price in whole tenge (the currency has no decimal subunit).
    pub price: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl MenuItem {
    /// Resolve the display title for `language`, falling back to the other
    /// language when the chosen one is blank rather than rendering an
    /// empty receipt row.
    pub fn title(&self, language: Language) -> &str {
        let (chosen, fallback) = match language {
            Language::Ru => (&self.title_rus, &self.title_kaz),
            Language::Kk => (&self.title_kaz, &self.title_rus),
        };
        if chosen.trim().is_empty() {
            fallback
        } else {
            chosen
        }
    }
}

/// One cart row: an item plus how many of it.
#[derive(Debug, Clone)]
pub struct CartEntry {
    pub item: MenuItem,
    pub quantity: u32,
}

// ---------------------------------------------------------------------------
// Wire model
// ---------------------------------------------------------------------------

/// A normalized receipt line. Wire keys are minimized to single letters
/// because QR capacity is the binding constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "i")]
    pub id: String,
    #[serde(rename = "t")]
    pub title: String,
    /// Unit price in whole tenge.
    #[serde(rename = "p")]
    pub unit_price: u64,
    #[serde(rename = "q")]
    pub quantity: u32,
}

/// One shareable payload: either a whole order, or one part of a split one.
///
/// `total` is the grand total of the entire order. Every chunk of a split
/// order carries the same `table` and `total`; only `items` and `part`
/// differ. When `total_parts` is absent or 1, the chunk is the whole order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChunk {
    #[serde(rename = "i")]
    pub items: Vec<LineItem>,
    #[serde(rename = "t")]
    pub table: String,
    #[serde(rename = "s")]
    pub total: u64,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub part: Option<u32>,
    #[serde(rename = "tp", default, skip_serializing_if = "Option::is_none")]
    pub total_parts: Option<u32>,
}

impl OrderChunk {
    /// Whether this chunk carries the complete order on its own.
    pub fn is_whole_order(&self) -> bool {
        match self.total_parts {
            None => true,
            Some(tp) => tp <= 1,
        }
    }
}

/// A fully reassembled order, ready for receipt rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedOrder {
    pub items: Vec<LineItem>,
    pub table: String,
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Grand total of a cart: `sum(price * quantity)` over all entries.
pub fn cart_total(cart: &[CartEntry]) -> u64 {
    cart.iter()
        .map(|entry| entry.item.price * u64::from(entry.quantity))
        .sum()
}

/// Project a cart down to a whole-order [`OrderChunk`].
///
/// Pure function: the result owns all its data (later cart mutation cannot
/// corrupt an already-encoded payload) and preserves the cart's iteration
/// order. Empty carts produce an empty `items` list; refusing to encode
/// those is the caller's job (see `share::build_locators`).
pub fn normalize(cart: &[CartEntry], table: &str, total: u64, language: Language) -> OrderChunk {
    let items = cart
        .iter()
        .map(|entry| LineItem {
            id: entry.item.id.clone(),
            title: entry.item.title(language).to_string(),
            unit_price: entry.item.price,
            quantity: entry.quantity,
        })
        .collect();

    OrderChunk {
        items,
        table: table.to_string(),
        total,
        part: None,
        total_parts: None,
    }
}

//! Locator assembly: cart in, one shareable URL per QR code out.
//!
//! `build_locators` is the encode-side entry point, running the whole
//! guard -> normalize -> split -> compress -> URL pipeline. Each locator is
//! handed independently to QR rendering; when there is more than one, the
//! hosting UI pages through them in part order and shows `(part, total)`.

use tracing::info;

use crate::codec;
use crate::error::EncodeError;
use crate::model::{cart_total, normalize, CartEntry, Language};
use crate::split::split_order;

/// Encode-side policy knobs. Thresholds and QR sizing are tunable per
/// deployment, not wire contracts.
#[derive(Debug, Clone)]
pub struct ShareConfig {
    /// Base URL of the receiving page, without trailing slash.
    pub base_url: String,
    /// Path of the receiving page under `base_url`.
    pub path: String,
    /// Items per chunk before an order is split across several codes.
    pub max_items_per_chunk: usize,
    /// Token-length breakpoints for QR rendering, ascending by
    /// `max_token_len`. The last step is the catch-all for longer tokens.
    pub qr_size_steps: Vec<QrSizeStep>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            path: "shared-order".to_string(),
            max_items_per_chunk: 4,
            qr_size_steps: vec![
                QrSizeStep {
                    max_token_len: 220,
                    module_size: 6,
                    error_correction: ErrorCorrection::Medium,
                },
                QrSizeStep {
                    max_token_len: 440,
                    module_size: 8,
                    error_correction: ErrorCorrection::Low,
                },
                QrSizeStep {
                    max_token_len: usize::MAX,
                    module_size: 10,
                    error_correction: ErrorCorrection::Low,
                },
            ],
        }
    }
}

/// QR error-correction level, lowest to highest redundancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCorrection {
    Low,
    Medium,
    Quartile,
    High,
}

/// One breakpoint in the token-length -> rendering mapping.
#[derive(Debug, Clone)]
pub struct QrSizeStep {
    pub max_token_len: usize,
    pub module_size: u32,
    pub error_correction: ErrorCorrection,
}

/// Rendering advice for one token. Longer tokens get larger modules and
/// lower error correction so the code stays scannable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrRenderHint {
    pub module_size: u32,
    pub error_correction: ErrorCorrection,
}

/// One shareable URL plus what the rendering layer needs to know about it.
#[derive(Debug, Clone)]
pub struct SharedLocator {
    pub url: String,
    pub token_len: usize,
    pub part: Option<u32>,
    pub total_parts: Option<u32>,
    pub render: QrRenderHint,
}

/// Build the full set of share locators for a cart.
///
/// Refuses empty carts and blank table numbers — the UI disables sharing in
/// those states rather than rendering a broken code. Locator order equals
/// part order.
pub fn build_locators(
    cart: &[CartEntry],
    table: &str,
    language: Language,
    config: &ShareConfig,
) -> Result<Vec<SharedLocator>, EncodeError> {
    if cart.is_empty() || table.trim().is_empty() {
        return Err(EncodeError::EmptyOrder);
    }

    let total = cart_total(cart);
    let whole = normalize(cart, table, total, language);
    let chunks = split_order(whole.items, table, total, config.max_items_per_chunk);

    let base = config.base_url.trim_end_matches('/');
    let path = config.path.trim_matches('/');

    let mut locators = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let token = codec::encode_chunk(chunk)?;
        locators.push(SharedLocator {
            url: format!("{base}/{path}?data={}", percent_encode(&token)),
            token_len: token.len(),
            part: chunk.part,
            total_parts: chunk.total_parts,
            render: render_hint(token.len(), &config.qr_size_steps),
        });
    }

    info!(
        table,
        total,
        parts = locators.len(),
        "share locators built"
    );
    Ok(locators)
}

/// Pick the rendering hint for a token of `token_len` characters. Steps are
/// tried in order; the last step catches anything longer.
pub fn render_hint(token_len: usize, steps: &[QrSizeStep]) -> QrRenderHint {
    let step = steps
        .iter()
        .find(|step| token_len <= step.max_token_len)
        .or_else(|| steps.last());

    match step {
        Some(step) => QrRenderHint {
            module_size: step.module_size,
            error_correction: step.error_correction,
        },
        // No steps configured at all; a mid-size default beats panicking.
        None => QrRenderHint {
            module_size: 8,
            error_correction: ErrorCorrection::Low,
        },
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set, so the
/// base64 token (`+`, `/`, `=`) survives as a query value.
fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for b in input.bytes() {
        let is_unreserved =
            b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' || b == b'~';
        if is_unreserved {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MenuItem;

    fn cart(n: usize) -> Vec<CartEntry> {
        (0..n)
            .map(|i| CartEntry {
                item: MenuItem {
                    id: format!("id-{i}"),
                    title_rus: format!("Блюдо {i}"),
                    title_kaz: format!("Тағам {i}"),
                    price: 1200,
                    description: Some("rich".into()),
                    image: Some("/img.png".into()),
                    tag: None,
                },
                quantity: 1,
            })
            .collect()
    }

    fn config() -> ShareConfig {
        ShareConfig {
            base_url: "https://menu.example.kz".to_string(),
            ..ShareConfig::default()
        }
    }

    #[test]
    fn empty_cart_refuses_to_share() {
        assert!(matches!(
            build_locators(&[], "12", Language::Ru, &config()),
            Err(EncodeError::EmptyOrder)
        ));
    }

    #[test]
    fn blank_table_refuses_to_share() {
        assert!(matches!(
            build_locators(&cart(2), "   ", Language::Ru, &config()),
            Err(EncodeError::EmptyOrder)
        ));
    }

    #[test]
    fn small_order_yields_one_locator() {
        let locators = build_locators(&cart(3), "12", Language::Ru, &config()).unwrap();
        assert_eq!(locators.len(), 1);
        assert!(locators[0].part.is_none());
        assert!(locators[0]
            .url
            .starts_with("https://menu.example.kz/shared-order?data="));
    }

    #[test]
    fn large_order_yields_locators_in_part_order() {
        let locators = build_locators(&cart(9), "12", Language::Ru, &config()).unwrap();
        assert_eq!(locators.len(), 3);
        for (index, locator) in locators.iter().enumerate() {
            assert_eq!(locator.part, Some(index as u32 + 1));
            assert_eq!(locator.total_parts, Some(3));
        }
    }

    #[test]
    fn locator_query_value_is_url_safe() {
        let locators = build_locators(&cart(6), "12", Language::Ru, &config()).unwrap();
        for locator in locators {
            let (_, query) = locator.url.split_once("?data=").unwrap();
            assert!(!query.contains('+'));
            assert!(!query.contains('/'));
            assert!(!query.contains('='));
        }
    }

    #[test]
    fn locator_round_trips_through_the_decoder() {
        let locators = build_locators(&cart(2), "7", Language::Kk, &config()).unwrap();
        let (_, query) = locators[0].url.split_once("?data=").unwrap();

        // Undo percent-encoding the way a query parser would.
        let mut token = Vec::new();
        let bytes = query.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                token.push(u8::from_str_radix(hex, 16).unwrap());
                i += 3;
            } else {
                token.push(bytes[i]);
                i += 1;
            }
        }
        let token = String::from_utf8(token).unwrap();

        let chunk = crate::codec::decode_token(&token).unwrap();
        assert_eq!(chunk.table, "7");
        assert_eq!(chunk.total, 2400);
        assert_eq!(chunk.items[0].title, "Тағам 0");
    }

    #[test]
    fn render_hint_follows_breakpoints() {
        let steps = config().qr_size_steps;
        assert_eq!(render_hint(100, &steps).module_size, 6);
        assert_eq!(
            render_hint(100, &steps).error_correction,
            ErrorCorrection::Medium
        );
        assert_eq!(render_hint(300, &steps).module_size, 8);
        assert_eq!(render_hint(5000, &steps).module_size, 10);
    }

    #[test]
    fn percent_encoding_covers_base64_specials() {
        assert_eq!(percent_encode("a+b/c="), "a%2Bb%2Fc%3D");
        assert_eq!(percent_encode("AZaz09-_.~"), "AZaz09-_.~");
    }
}

//! Order-sharing payload codec.
//!
//! Takes an in-memory cart (line items, quantities, table number) and turns
//! it into compact, URL-safe tokens for QR codes; the receiving device
//! decodes each scanned token back into order parts and reassembles them —
//! including orders too large for one code, split across several and scanned
//! in any order.
//!
//! Encode side:
//!
//! ```
//! use order_share::{build_locators, Language, ShareConfig};
//! # use order_share::{CartEntry, MenuItem};
//! # let cart = vec![CartEntry {
//! #     item: MenuItem {
//! #         id: "a".into(),
//! #         title_rus: "Суп".into(),
//! #         title_kaz: "Сорпа".into(),
//! #         price: 1500,
//! #         description: None,
//! #         image: None,
//! #         tag: None,
//! #     },
//! #     quantity: 2,
//! # }];
//! let config = ShareConfig {
//!     base_url: "https://menu.example.kz".into(),
//!     ..ShareConfig::default()
//! };
//! let locators = build_locators(&cart, "12", Language::Ru, &config)?;
//! // one QR code per locator
//! # Ok::<(), order_share::EncodeError>(())
//! ```
//!
//! Decode side, per scan:
//!
//! ```no_run
//! use order_share::{MemoryStore, Reassembler, ReassemblyStatus};
//! let reassembler = Reassembler::new(MemoryStore::new());
//! # let token = String::new();
//! match reassembler.accept_token(&token)? {
//!     ReassemblyStatus::Complete(order) => { /* render the receipt */ }
//!     ReassemblyStatus::Incomplete { received, total_parts } => {
//!         // prompt the user to scan the remaining codes
//!     }
//! }
//! # Ok::<(), order_share::DecodeError>(())
//! ```

mod codec;
mod error;
mod model;
mod reassembly;
mod share;
mod split;
mod store;

pub use codec::{decode_token, encode_chunk};
pub use error::{DecodeError, EncodeError, StoreError};
pub use model::{
    cart_total, normalize, CartEntry, Language, LineItem, MenuItem, OrderChunk, SharedOrder,
};
pub use reassembly::{Reassembler, ReassemblyKey, ReassemblyStatus};
pub use share::{
    build_locators, render_hint, ErrorCorrection, QrRenderHint, QrSizeStep, ShareConfig,
    SharedLocator,
};
pub use split::split_order;
pub use store::{MemoryStore, PartStore, SqliteStore};

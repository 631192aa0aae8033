//! # patricia-map
//!
//! An ordered map over variable-length bit-string keys, stored as a PATRICIA
//! trie.
//!
//! Keys are any type implementing [`BitKey`]: byte strings, `str`, unsigned
//! and signed integers, `char`, bool slices and the owned [`BitString`]. A
//! lookup inspects one bit per branch point on the way down and compares the
//! full key once, so its cost tracks key length, not map size.
//!
//! Beyond the usual ordered-map surface the trie answers:
//!
//! - longest-prefix-match ([`PatriciaTrie::prefix_entry`])
//! - XOR-metric nearest neighbor ([`PatriciaTrie::nearest_entry`])
//! - prefix ranges ([`PatriciaTrie::prefixed`], [`PatriciaTrie::least_prefixed`])
//! - bounded views over a key range ([`PatriciaTrie::range`])
//!
//! ## Example
//!
//! ```rust
//! use patricia_map::{BitString, PatriciaTrie};
//!
//! let mut routes: PatriciaTrie<BitString, &str> = PatriciaTrie::new();
//! routes.insert("1010".parse().unwrap(), "wide");
//! routes.insert("101011".parse().unwrap(), "narrow");
//!
//! let addr: BitString = "10101101".parse().unwrap();
//! assert_eq!(routes.prefix_entry(&addr).map(|(_, v)| *v), Some("narrow"));
//!
//! let other: BitString = "10100000".parse().unwrap();
//! assert_eq!(routes.prefix_entry(&other).map(|(_, v)| *v), Some("wide"));
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

pub mod bits;
mod codec;
pub mod error;
pub mod iter;
mod node;
pub mod sync;
mod trie;
pub mod view;

pub use bits::{BitKey, BitString};
pub use error::{Error, Result};
pub use iter::{Cursor, IntoIter, Iter, Keys, Range, Values};
pub use sync::SharedTrie;
pub use trie::PatriciaTrie;
pub use view::{View, ViewMut};

/// Configuration for a [`PatriciaTrie`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial capacity hint for the node arena
    pub initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
        }
    }
}

#[cfg(test)]
mod proptests;

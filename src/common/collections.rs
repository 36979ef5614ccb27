//! Hash collections used throughout the crate.
//!
//! Keys are small integer ids, so the Fx hasher is used instead of SipHash.

pub use std::collections::BTreeMap;

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;

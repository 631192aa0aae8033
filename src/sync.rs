//! A lock-wrapped trie for sharing between threads.

use std::borrow::Borrow;

use parking_lot::RwLock;

use crate::bits::BitKey;
use crate::trie::PatriciaTrie;
use crate::Config;

/// A trie behind a reader/writer lock.
///
/// Lookups take the read lock and hand back owned copies, so no guard
/// escapes a call. Use [`read`](Self::read) or [`write`](Self::write) to run
/// several operations under one acquisition.
pub struct SharedTrie<K, V> {
    inner: RwLock<PatriciaTrie<K, V>>,
}

impl<K: BitKey, V> SharedTrie<K, V> {
    /// Create an empty shared trie with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty shared trie with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: RwLock::new(PatriciaTrie::with_config(config)),
        }
    }

    /// Insert a key-value pair.
    ///
    /// Returns the previous value if the key already existed.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    /// Get a copy of the value for a key.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
        V: Clone,
    {
        self.inner.read().get(key).cloned()
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.inner.write().remove(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.inner.read().contains_key(key)
    }

    /// Longest stored prefix of `key`, copied out.
    pub fn prefix_entry<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Clone,
        Q: BitKey + ?Sized,
        V: Clone,
    {
        self.inner
            .read()
            .prefix_entry(key)
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Closest stored key by XOR distance, copied out.
    pub fn nearest_entry<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Clone,
        Q: BitKey + ?Sized,
        V: Clone,
    {
        self.inner
            .read()
            .nearest_entry(key)
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Every entry prefixed by `prefix`, in key order.
    pub fn prefixed(&self, prefix: K, inclusive: bool) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let inner = self.inner.read();
        inner
            .prefixed(prefix, inclusive)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K, V> SharedTrie<K, V> {
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Run `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&PatriciaTrie<K, V>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut PatriciaTrie<K, V>) -> R) -> R {
        f(&mut self.inner.write())
    }

    pub fn into_inner(self) -> PatriciaTrie<K, V> {
        self.inner.into_inner()
    }
}

impl<K: BitKey, V> Default for SharedTrie<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> From<PatriciaTrie<K, V>> for SharedTrie<K, V> {
    fn from(trie: PatriciaTrie<K, V>) -> Self {
        Self {
            inner: RwLock::new(trie),
        }
    }
}

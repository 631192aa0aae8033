//! The PATRICIA trie engine.
//!
//! Every operation starts with a single descent ([`PatriciaTrie::find_nearest`])
//! that follows only the branch points of the query, then classifies the
//! query against the key it reached ([`Probe`]). Insertion picks a splice
//! from that classification; ordered and prefix queries pick a neighbor.
//! None of this recurses, and the cost of each operation is bounded by the
//! key length rather than the number of entries.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::RangeBounds;

use tracing::{debug, trace};

use crate::bits::BitKey;
use crate::error::Result;
use crate::iter::{Cursor, IntoIter, Iter, Keys, Values};
use crate::node::{Back, NodeId, NodeStore, Role};
use crate::view::{Bounds, View, ViewMut};
use crate::Config;

const ROOT: NodeId = NodeId::ROOT;

/// How a query relates to the stored key reached by the nearest descent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The descent stopped at the unset root.
    Vacant,
    Exact,
    /// The query is a strict prefix of the stored key.
    Shorter { next_bit: bool },
    /// The stored key is a strict prefix of the query; carries its length.
    Longer(usize),
    /// First differing bit, below both lengths.
    Diverges(usize),
}

/// An ordered map over bit-string keys.
///
/// Besides the usual ordered-map surface this answers longest-prefix-match
/// ([`prefix_entry`](Self::prefix_entry)), XOR-nearest
/// ([`nearest_entry`](Self::nearest_entry)) and prefix-range queries.
#[derive(Clone)]
pub struct PatriciaTrie<K, V> {
    pub(crate) nodes: NodeStore<K, V>,
    len: usize,
    version: u64,
    config: Config,
}

impl<K, V> PatriciaTrie<K, V> {
    /// Create an empty trie with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty trie with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            nodes: NodeStore::with_capacity(config.initial_capacity),
            len: 0,
            version: 0,
            config,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Structural modification stamp checked by cursors.
    #[inline]
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        let freed = self.nodes.destroy_links(ROOT);
        self.nodes.reset();
        self.len = 0;
        self.bump();
        debug!(freed, "trie cleared");
    }

    /// Adopt an entry count after nodes were linked in bulk.
    pub(crate) fn restore_len(&mut self, len: usize) {
        self.len = len;
        self.bump();
    }

    #[inline]
    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[inline]
    fn trace_splice(&self, case: &'static str, index: usize) {
        trace!(case, index, len = self.len, "splice");
    }

    pub(crate) fn first_node(&self) -> Option<NodeId> {
        if self.nodes.is_live(ROOT) {
            return Some(ROOT);
        }
        self.nodes.successor(ROOT)
    }

    pub(crate) fn last_node(&self) -> Option<NodeId> {
        Some(self.nodes.apex(ROOT)).filter(|&id| self.nodes.is_live(id))
    }

    /// Unlinks a live node and hands back its entry.
    pub(crate) fn delete_entry(&mut self, id: NodeId) -> Option<(K, V)> {
        if !self.nodes.is_live(id) {
            return None;
        }
        let entry = if id == ROOT {
            let root = &mut self.nodes[ROOT];
            root.role = Role::RootUnset;
            root.entry.take()
        } else {
            self.trace_splice("detach", self.nodes[id].role.index());
            self.nodes.detach(id);
            self.nodes.free(id)
        };
        self.len -= 1;
        self.bump();
        entry
    }

    pub fn first_entry(&self) -> Option<(&K, &V)> {
        self.first_node().and_then(|id| self.nodes.entry(id))
    }

    pub fn last_entry(&self) -> Option<(&K, &V)> {
        self.last_node().and_then(|id| self.nodes.entry(id))
    }

    pub fn first_key(&self) -> Option<&K> {
        self.first_entry().map(|(k, _)| k)
    }

    pub fn last_key(&self) -> Option<&K> {
        self.last_entry().map(|(k, _)| k)
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let id = self.first_node()?;
        self.delete_entry(id)
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let id = self.last_node()?;
        self.delete_entry(id)
    }

    /// Iterate entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Detached ascending cursor over the whole trie.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self, self.first_node(), None, false)
    }

    /// Detached descending cursor over the whole trie.
    pub fn cursor_rev(&self) -> Cursor {
        Cursor::new(self, self.last_node(), None, true)
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.nodes.entries().any(|(_, v)| v == value)
    }
}

// =============================================================================
// Descent and insertion
// =============================================================================

impl<K: BitKey, V> PatriciaTrie<K, V> {
    /// Follows the query's bits at every branch point below `track` and
    /// returns the last node entered.
    pub(crate) fn find_nearest<Q>(&self, mut track: NodeId, key: &Q, length: usize) -> NodeId
    where
        Q: BitKey + ?Sized,
    {
        let mut next = self.nodes[track].children;
        while let Some(cur) = next {
            let node = &self.nodes[cur];
            let index = node.role.index();
            if length <= index {
                break;
            }
            let bit = key.bit(index);
            match node.role {
                Role::EdgeZero(_) if bit => break,
                Role::EdgeOne(_) if !bit => {
                    next = node.sibling;
                    continue;
                }
                Role::Branch(_) if !bit => {
                    next = node.sibling;
                    continue;
                }
                _ => {}
            }
            track = cur;
            next = node.children;
        }
        track
    }

    pub(crate) fn probe<Q>(&self, track: NodeId, key: &Q, length: usize) -> Probe
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let Some(other) = self.nodes.key(track) else {
            return Probe::Vacant;
        };
        let other: &Q = other.borrow();
        match key.contrast(other) {
            None => Probe::Exact,
            Some(i) if i == length => Probe::Shorter {
                next_bit: other.bit(length),
            },
            Some(i) if i == other.bit_len() => Probe::Longer(i),
            Some(i) => Probe::Diverges(i),
        }
    }

    /// Insert a key-value pair, returning the previous value of an equal key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let length = key.bit_len();
        if length == 0 {
            let root = &mut self.nodes[ROOT];
            if let Some((_, old)) = root.entry.as_mut() {
                return Some(mem::replace(old, value));
            }
            root.entry = Some((key, value));
            root.role = Role::RootEmpty;
        } else {
            let track = self.find_nearest(ROOT, &key, length);
            match self.probe(track, &key, length) {
                Probe::Exact => {
                    return self.nodes[track]
                        .entry
                        .as_mut()
                        .map(|(_, old)| mem::replace(old, value));
                }
                Probe::Vacant => self.attach_extension(ROOT, 0, key, value),
                Probe::Longer(index) => self.attach_extension(track, index, key, value),
                Probe::Shorter { next_bit } => {
                    self.splice_above(track, length, next_bit, key, value)
                }
                Probe::Diverges(index) => self.splice_branch(track, index, key, value),
            }
        }
        self.len += 1;
        self.bump();
        None
    }

    /// The owner's key is a strict prefix of `key`: add `key` as an edge.
    fn attach_extension(&mut self, owner: NodeId, index: usize, key: K, value: V) {
        let one = key.bit(index);
        let entry = self.nodes.alloc(key, value);
        let tail = self.nodes[owner]
            .children
            .map(|head| self.nodes.last_linked(head));
        match tail.map(|t| (t, self.nodes[t].role)) {
            None => {
                self.nodes[entry].role = Role::edge(index, one);
                self.nodes.enlist(owner, entry);
            }
            Some((tail, Role::EdgeZero(_))) => {
                self.nodes[entry].role = Role::EdgeOne(index as u32);
                self.nodes.prepend(tail, entry);
            }
            Some((tail, Role::EdgeOne(_))) => {
                self.nodes[entry].role = Role::EdgeZero(index as u32);
                self.nodes.append(tail, entry);
            }
            Some((tail, _)) => {
                self.nodes[entry].role = Role::edge(index, one);
                self.nodes.append(tail, entry);
            }
        }
        self.trace_splice("extension", index);
    }

    /// `key` is a strict prefix of `track`'s key: take its place and hang
    /// `track` below as an edge.
    fn splice_above(&mut self, track: NodeId, length: usize, next_bit: bool, key: K, value: V) {
        let entry = self.nodes.alloc(key, value);
        self.nodes.replace(track, entry);
        self.nodes[track].role = Role::edge(length, next_bit);
        let upto = self.nodes.find_marked_insertion_node(track, length);
        self.nodes.adopt(entry, track, upto);
        self.trace_splice("prefix", length);
    }

    /// `key` leaves `track`'s key at `index`.
    fn splice_branch(&mut self, track: NodeId, index: usize, key: K, value: V) {
        let one = key.bit(index);
        let track = self.nodes.backwards_retrace(track, index);
        let upto = self.nodes.find_insertion_node(track, index);
        let entry = self.nodes.alloc(key, value);
        if one {
            self.nodes[entry].role = Role::Branch(index as u32);
            match upto {
                Some(prev) => self.nodes.append(prev, entry),
                None => self.nodes.enlist(track, entry),
            }
            self.trace_splice("branch", index);
        } else {
            self.nodes.replace(track, entry);
            self.nodes[track].role = Role::Branch(index as u32);
            self.nodes.adopt(entry, track, upto);
            self.trace_splice("branch-above", index);
        }
    }

    // =========================================================================
    // Exact lookups
    // =========================================================================

    pub(crate) fn find_entry<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let length = key.bit_len();
        if length == 0 {
            return Some(ROOT).filter(|&id| self.nodes.is_live(id));
        }
        let e = self.find_nearest(ROOT, key, length);
        if e == ROOT {
            return None;
        }
        let other: &Q = self.nodes.key(e)?.borrow();
        match key.contrast(other) {
            None => Some(e),
            Some(_) => None,
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.find_entry(key).and_then(|id| self.nodes.entry(id))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let id = self.find_entry(key)?;
        self.nodes[id].entry.as_mut().map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.find_entry(key).is_some()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let id = self.find_entry(key)?;
        self.delete_entry(id)
    }

    // =========================================================================
    // Ordered neighbors
    // =========================================================================

    /// Greatest node below `key`, or at it when `inclusive`.
    pub(crate) fn head_of<Q>(&self, key: &Q, inclusive: bool) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let length = key.bit_len();
        let mut track = self.find_nearest(ROOT, key, length);
        match self.probe(track, key, length) {
            Probe::Vacant => {
                if length == 0 {
                    return None;
                }
                // A lone 0-edge at the root sits entirely below a 1-led query.
                return self.nodes[ROOT]
                    .children
                    .filter(|&head| self.nodes[head].role.is_zero_edge())
                    .map(|head| self.nodes.apex(head));
            }
            Probe::Exact if inclusive => return Some(track),
            Probe::Exact | Probe::Shorter { .. } => {}
            Probe::Longer(_) => {
                let tail = self.nodes[track]
                    .children
                    .map(|h| self.nodes.last_linked(h));
                return match tail {
                    Some(tail) if self.nodes[tail].role.is_zero_edge() => {
                        Some(self.nodes.apex(tail))
                    }
                    _ => Some(track),
                };
            }
            Probe::Diverges(index) => {
                track = self.nodes.backwards_retrace(track, index);
                if key.bit(index) {
                    let next = match self.nodes.find_insertion_node(track, index) {
                        Some(prev) => self.nodes[prev].sibling,
                        None => self.nodes[track].children,
                    };
                    return Some(next.map_or(track, |n| self.nodes.apex(n)));
                }
            }
        }
        self.nodes
            .predecessor(track)
            .filter(|&id| self.nodes.is_live(id))
    }

    pub(crate) fn floor_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.head_of(key, true)
    }

    pub(crate) fn lower_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.head_of(key, false)
    }

    pub(crate) fn ceiling_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        match self.head_of(key, true) {
            Some(id) if self.key_eq(id, key) => Some(id),
            Some(id) => self.nodes.successor(id),
            None => self.first_node(),
        }
    }

    pub(crate) fn higher_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        match self.head_of(key, true) {
            Some(id) => self.nodes.successor(id),
            None => self.first_node(),
        }
    }

    fn key_eq<Q>(&self, id: NodeId, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.nodes
            .key(id)
            .is_some_and(|k| k.borrow().contrast(key).is_none())
    }

    /// Orders two live nodes by key.
    pub(crate) fn cmp_nodes(&self, a: NodeId, b: NodeId) -> Ordering {
        match (self.nodes.key(a), self.nodes.key(b)) {
            (Some(x), Some(y)) => x.compare(y),
            _ => Ordering::Equal,
        }
    }

    pub fn lower_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.lower_node(key).and_then(|id| self.nodes.entry(id))
    }

    pub fn floor_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.floor_node(key).and_then(|id| self.nodes.entry(id))
    }

    pub fn ceiling_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.ceiling_node(key).and_then(|id| self.nodes.entry(id))
    }

    pub fn higher_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.higher_node(key).and_then(|id| self.nodes.entry(id))
    }

    pub fn lower_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.lower_entry(key).map(|(k, _)| k)
    }

    pub fn floor_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.floor_entry(key).map(|(k, _)| k)
    }

    pub fn ceiling_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.ceiling_entry(key).map(|(k, _)| k)
    }

    pub fn higher_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.higher_entry(key).map(|(k, _)| k)
    }

    // =========================================================================
    // Prefix queries
    // =========================================================================

    /// Node holding the longest stored key that inclusively prefixes `key`.
    pub(crate) fn prefix_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let length = key.bit_len();
        let mut track = self.find_nearest(ROOT, key, length);
        let index = match self.probe(track, key, length) {
            Probe::Vacant => return None,
            Probe::Exact | Probe::Longer(_) => return Some(track),
            Probe::Shorter { .. } => length,
            Probe::Diverges(i) => i,
        };
        // Leaving an edge at or below the mismatch lands on a key that is a
        // prefix of the query.
        loop {
            let role = self.nodes[track].role;
            track = self.nodes.parent(track)?;
            if role.is_edge() && role.index() <= index {
                break;
            }
        }
        Some(track).filter(|&id| self.nodes.is_live(id))
    }

    /// Node minimizing the XOR distance to `key`, found by one descent.
    pub(crate) fn nearest_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let root_set = self.nodes.is_live(ROOT);
        let Some(head) = self.nodes[ROOT].children else {
            return root_set.then_some(ROOT);
        };
        let length = key.bit_len();
        if length == 0 {
            return if root_set {
                Some(ROOT)
            } else {
                self.first_node()
            };
        }

        let (mut one, mut zero) = (None, None);
        let mut cur = Some(head);
        while let Some(c) = cur {
            match self.nodes[c].role {
                Role::EdgeOne(_) => one = Some(c),
                Role::EdgeZero(_) => zero = Some(c),
                _ => {}
            }
            cur = self.nodes[c].sibling;
        }
        let (agree, other) = if key.bit(0) { (one, zero) } else { (zero, one) };
        let start = match (agree, other) {
            (Some(edge), _) => edge,
            // The empty key differs from the query only past its length.
            (None, _) if root_set => return Some(ROOT),
            (None, Some(edge)) => edge,
            (None, None) => return None,
        };
        Some(self.find_nearest(start, key, length))
    }

    /// Smallest node whose key is prefixed by `prefix`.
    pub(crate) fn least_prefixed_node<Q>(&self, prefix: &Q, inclusive: bool) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let length = prefix.bit_len();
        if length == 0 {
            if inclusive && self.nodes.is_live(ROOT) {
                return Some(ROOT);
            }
            return self.nodes[ROOT]
                .children
                .map(|h| self.nodes.next_or_node(h));
        }
        let e = self.find_nearest(ROOT, prefix, length);
        if e == ROOT {
            return None;
        }
        match self.probe(e, prefix, length) {
            Probe::Exact if inclusive => Some(e),
            Probe::Exact => self.nodes[e]
                .children
                .map(|h| self.nodes.last_linked(h))
                .filter(|&tail| self.nodes[tail].role.is_edge()),
            Probe::Shorter { .. } => Some(e),
            _ => None,
        }
    }

    /// Greatest node whose key is prefixed by `prefix`.
    pub(crate) fn last_prefixed_node<Q>(&self, prefix: &Q, inclusive: bool) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let length = prefix.bit_len();
        if length == 0 {
            return match self.nodes[ROOT].children {
                Some(head) => Some(self.nodes.apex(head)),
                None => (inclusive && self.nodes.is_live(ROOT)).then_some(ROOT),
            };
        }
        let e = self.find_nearest(ROOT, prefix, length);
        if e == ROOT {
            return None;
        }
        match self.probe(e, prefix, length) {
            Probe::Exact => {
                let tail = self.nodes[e].children.map(|h| self.nodes.last_linked(h));
                match tail {
                    Some(tail) if self.nodes[tail].role.is_edge() => {
                        // A 1-edge in front of the 0-edge holds the larger half.
                        let front = match self.nodes[tail].back {
                            Back::Prev(p) if self.nodes[p].role.is_edge() => p,
                            _ => tail,
                        };
                        Some(self.nodes.apex(front))
                    }
                    _ => inclusive.then_some(e),
                }
            }
            Probe::Shorter { .. } => {
                let mut cur = self.nodes[e].children;
                while let Some(c) = cur {
                    if self.nodes[c].role.index() >= length {
                        return Some(self.nodes.apex(c));
                    }
                    cur = self.nodes[c].sibling;
                }
                Some(e)
            }
            _ => None,
        }
    }

    /// First node above every key inclusively prefixed by `key`.
    pub(crate) fn next_prefix_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        match self.last_prefixed_node(key, true) {
            Some(last) => self.nodes.successor(last),
            None => self.higher_node(key),
        }
    }

    /// Entry with the longest key that is a prefix of (or equal to) `key`.
    pub fn prefix_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.prefix_node(key).and_then(|id| self.nodes.entry(id))
    }

    pub fn prefix_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.prefix_entry(key).map(|(k, _)| k)
    }

    /// Entry closest to `key` by XOR distance.
    ///
    /// Exact for key sets of one fixed width. With keys of mixed lengths the
    /// descent still follows the query bit at every branch point.
    pub fn nearest_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.nearest_node(key).and_then(|id| self.nodes.entry(id))
    }

    pub fn nearest_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.nearest_entry(key).map(|(k, _)| k)
    }

    /// First entry above `key` that `key` does not prefix.
    pub fn next_prefix_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.next_prefix_node(key)
            .and_then(|id| self.nodes.entry(id))
    }

    pub fn next_prefix_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.next_prefix_entry(key).map(|(k, _)| k)
    }

    pub fn least_prefixed<Q>(&self, prefix: &Q, inclusive: bool) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.least_prefixed_node(prefix, inclusive)
            .and_then(|id| self.nodes.entry(id))
    }

    pub fn last_prefixed<Q>(&self, prefix: &Q, inclusive: bool) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.last_prefixed_node(prefix, inclusive)
            .and_then(|id| self.nodes.entry(id))
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Read-only view over the keys in `range`, ascending.
    pub fn range<R>(&self, range: R) -> Result<View<'_, K, V>>
    where
        K: Clone,
        R: RangeBounds<K>,
    {
        Ok(View::new(self, Bounds::from_range(&range)?, false))
    }

    /// Read-only view over the keys prefixed by `prefix`.
    pub fn prefixed(&self, prefix: K, inclusive: bool) -> View<'_, K, V>
    where
        K: Clone,
    {
        View::new(self, Bounds::prefixed(prefix, inclusive), false)
    }

    /// The whole trie in descending order.
    pub fn descending(&self) -> View<'_, K, V> {
        View::new(self, Bounds::unbounded(), true)
    }

    pub fn range_mut<R>(&mut self, range: R) -> Result<ViewMut<'_, K, V>>
    where
        K: Clone,
        R: RangeBounds<K>,
    {
        let bounds = Bounds::from_range(&range)?;
        Ok(ViewMut::new(self, bounds, false))
    }

    pub fn prefixed_mut(&mut self, prefix: K, inclusive: bool) -> ViewMut<'_, K, V>
    where
        K: Clone,
    {
        ViewMut::new(self, Bounds::prefixed(prefix, inclusive), false)
    }

    pub fn descending_mut(&mut self) -> ViewMut<'_, K, V> {
        ViewMut::new(self, Bounds::unbounded(), true)
    }
}

// =============================================================================
// Debugging
// =============================================================================

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::RootUnset => f.write_str("root"),
            Role::RootEmpty => f.write_str("root(empty)"),
            Role::Branch(i) => write!(f, "branch({i})"),
            Role::EdgeOne(i) => write!(f, "edge1({i})"),
            Role::EdgeZero(i) => write!(f, "edge0({i})"),
        }
    }
}

impl<K: fmt::Debug, V> PatriciaTrie<K, V> {
    /// Renders the node graph, one node per line in key order, indented by
    /// depth.
    pub fn tree_string(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let mut stack = vec![(ROOT, 0usize)];
        let mut chain = Vec::new();
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            let _ = write!(out, "{:width$}{}", "", node.role, width = depth * 2);
            if let Some((k, _)) = &node.entry {
                let _ = write!(out, " {k:?}");
            }
            out.push('\n');

            chain.clear();
            let mut cur = node.children;
            while let Some(c) = cur {
                chain.push(c);
                cur = self.nodes[c].sibling;
            }
            // The chain tail comes first in key order.
            stack.extend(chain.iter().map(|&c| (c, depth + 1)));
        }
        out
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<K, V> Default for PatriciaTrie<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PatriciaTrie<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for PatriciaTrie<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for PatriciaTrie<K, V> {}

impl<K: BitKey, V> Extend<(K, V)> for PatriciaTrie<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: BitKey, V> FromIterator<(K, V)> for PatriciaTrie<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}

impl<'a, K, V> IntoIterator for &'a PatriciaTrie<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for PatriciaTrie<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

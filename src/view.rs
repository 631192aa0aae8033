//! Bounded and prefix-restricted views over a [`PatriciaTrie`].
//!
//! A view is the backing trie plus a [`Bounds`] descriptor and a direction.
//! Every navigable operation is computed in absolute key order by clamping
//! the query into the bounds, delegating to the trie and rejecting results
//! that fall outside. A descending view then swaps lower for higher, floor
//! for ceiling and first for last.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::ops::{Bound, RangeBounds};

use tracing::debug;

use crate::bits::BitKey;
use crate::error::{Error, Result};
use crate::iter::{Cursor, Range};
use crate::node::NodeId;
use crate::trie::PatriciaTrie;

/// Key bounds of a view.
///
/// Prefix views carry the prefix itself as their lower bound, so a key is
/// inside the view when it clears `lo`, does not pass `hi` and does not rise
/// above every key prefixed by `prefix`.
#[derive(Clone, Debug)]
pub(crate) struct Bounds<K> {
    lo: Bound<K>,
    hi: Bound<K>,
    prefix: Option<K>,
}

impl<K: BitKey> Bounds<K> {
    pub(crate) fn unbounded() -> Self {
        Self {
            lo: Bound::Unbounded,
            hi: Bound::Unbounded,
            prefix: None,
        }
    }

    pub(crate) fn prefixed(prefix: K, inclusive: bool) -> Self
    where
        K: Clone,
    {
        let lo = if inclusive {
            Bound::Included(prefix.clone())
        } else {
            Bound::Excluded(prefix.clone())
        };
        Self {
            lo,
            hi: Bound::Unbounded,
            prefix: Some(prefix),
        }
    }

    pub(crate) fn from_range<R: RangeBounds<K>>(range: &R) -> Result<Self>
    where
        K: Clone,
    {
        Self::unbounded().narrow(range.start_bound().cloned(), range.end_bound().cloned())
    }

    /// Bounds of a sub-range, which must lie inside these bounds.
    pub(crate) fn narrow(&self, lo: Bound<K>, hi: Bound<K>) -> Result<Self>
    where
        K: Clone,
    {
        if let (Some(l), Some(h)) = (bound_key(&lo), bound_key(&hi)) {
            if l.compare(h) == Ordering::Greater {
                return Err(Error::InvalidRange);
            }
        }
        self.check_inside(&lo)?;
        self.check_inside(&hi)?;
        Ok(Self {
            lo: match lo {
                Bound::Unbounded => self.lo.clone(),
                lo => lo,
            },
            hi: match hi {
                Bound::Unbounded => self.hi.clone(),
                hi => hi,
            },
            prefix: self.prefix.clone(),
        })
    }

    /// Bounds restricted to the keys prefixed by `prefix`.
    pub(crate) fn narrow_prefix(&self, prefix: K, inclusive: bool) -> Result<Self>
    where
        K: Clone,
    {
        if self.closed_too_low(&prefix) || self.closed_too_high(&prefix) {
            return Err(Error::ArgumentOutOfRange);
        }
        let own = Self::prefixed(prefix, inclusive);
        let lo = match (&self.lo, &own.lo) {
            (Bound::Included(a) | Bound::Excluded(a), Bound::Included(b) | Bound::Excluded(b)) => {
                match a.compare(b) {
                    Ordering::Greater => self.lo.clone(),
                    Ordering::Less => own.lo.clone(),
                    Ordering::Equal if matches!(self.lo, Bound::Excluded(_)) => self.lo.clone(),
                    Ordering::Equal => own.lo.clone(),
                }
            }
            _ => own.lo.clone(),
        };
        Ok(Self {
            lo,
            hi: self.hi.clone(),
            prefix: own.prefix,
        })
    }

    fn check_inside(&self, bound: &Bound<K>) -> Result<()> {
        let inside = match bound {
            Bound::Included(k) => self.contains(k),
            Bound::Excluded(k) => !self.closed_too_low(k) && !self.closed_too_high(k),
            Bound::Unbounded => true,
        };
        if inside {
            Ok(())
        } else {
            Err(Error::ArgumentOutOfRange)
        }
    }

    fn is_prefix(&self, key: &K) -> bool {
        self.prefix
            .as_ref()
            .is_some_and(|p| p.compare(key) == Ordering::Equal)
    }

    fn above_prefix<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let Some(p) = &self.prefix else {
            return false;
        };
        let p: &Q = p.borrow();
        match key.contrast(p) {
            Some(i) => i < p.bit_len() && i < key.bit_len() && key.bit(i),
            None => false,
        }
    }

    pub(crate) fn too_low<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        match &self.lo {
            Bound::Included(l) => key.compare(l.borrow()) == Ordering::Less,
            Bound::Excluded(l) => key.compare(l.borrow()) != Ordering::Greater,
            Bound::Unbounded => false,
        }
    }

    pub(crate) fn too_high<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        let past_hi = match &self.hi {
            Bound::Included(h) => key.compare(h.borrow()) == Ordering::Greater,
            Bound::Excluded(h) => key.compare(h.borrow()) != Ordering::Less,
            Bound::Unbounded => false,
        };
        past_hi || self.above_prefix(key)
    }

    fn closed_too_low(&self, key: &K) -> bool {
        bound_key(&self.lo).is_some_and(|l| key.compare(l) == Ordering::Less)
    }

    fn closed_too_high(&self, key: &K) -> bool {
        let past_hi = bound_key(&self.hi).is_some_and(|h| key.compare(h) == Ordering::Greater);
        past_hi || self.above_prefix(key)
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        !self.too_low(key) && !self.too_high(key)
    }

    fn node_too_low<V>(&self, trie: &PatriciaTrie<K, V>, id: NodeId) -> bool {
        trie.nodes.key(id).is_none_or(|k| self.too_low(k))
    }

    fn node_too_high<V>(&self, trie: &PatriciaTrie<K, V>, id: NodeId) -> bool {
        trie.nodes.key(id).is_none_or(|k| self.too_high(k))
    }

    fn holds<V>(&self, trie: &PatriciaTrie<K, V>, id: NodeId) -> bool {
        trie.nodes.key(id).is_some_and(|k| self.contains(k))
    }

    // =========================================================================
    // Absolute navigation
    // =========================================================================

    pub(crate) fn lowest<V>(&self, trie: &PatriciaTrie<K, V>) -> Option<NodeId> {
        let candidate = match &self.lo {
            Bound::Unbounded => trie.first_node(),
            Bound::Included(l) if self.is_prefix(l) => trie.least_prefixed_node(l, true),
            Bound::Excluded(l) if self.is_prefix(l) => trie.least_prefixed_node(l, false),
            Bound::Included(l) => trie.ceiling_node(l),
            Bound::Excluded(l) => trie.higher_node(l),
        };
        candidate.filter(|&id| !self.node_too_high(trie, id))
    }

    pub(crate) fn highest<V>(&self, trie: &PatriciaTrie<K, V>) -> Option<NodeId> {
        let mut candidate = match &self.hi {
            Bound::Unbounded => trie.last_node(),
            Bound::Included(h) => trie.floor_node(h),
            Bound::Excluded(h) => trie.lower_node(h),
        };
        if let Some(p) = &self.prefix {
            candidate = min_node(trie, candidate, trie.last_prefixed_node(p, true));
        }
        candidate.filter(|&id| !self.node_too_low(trie, id))
    }

    pub(crate) fn ceiling<V>(&self, trie: &PatriciaTrie<K, V>, key: &K) -> Option<NodeId> {
        if self.too_low(key) {
            return self.lowest(trie);
        }
        trie.ceiling_node(key)
            .filter(|&id| !self.node_too_high(trie, id))
    }

    pub(crate) fn higher<V>(&self, trie: &PatriciaTrie<K, V>, key: &K) -> Option<NodeId> {
        if self.too_low(key) {
            return self.lowest(trie);
        }
        trie.higher_node(key)
            .filter(|&id| !self.node_too_high(trie, id))
    }

    pub(crate) fn floor<V>(&self, trie: &PatriciaTrie<K, V>, key: &K) -> Option<NodeId> {
        if self.too_high(key) {
            return self.highest(trie);
        }
        trie.floor_node(key)
            .filter(|&id| !self.node_too_low(trie, id))
    }

    pub(crate) fn lower<V>(&self, trie: &PatriciaTrie<K, V>, key: &K) -> Option<NodeId> {
        if self.too_high(key) {
            return self.highest(trie);
        }
        trie.lower_node(key)
            .filter(|&id| !self.node_too_low(trie, id))
    }

    /// First node past the upper end.
    pub(crate) fn high_fence<V>(&self, trie: &PatriciaTrie<K, V>) -> Option<NodeId> {
        let past_hi = match &self.hi {
            Bound::Included(h) => trie.higher_node(h),
            Bound::Excluded(h) => trie.ceiling_node(h),
            Bound::Unbounded => None,
        };
        match &self.prefix {
            Some(p) => min_node_or(trie, past_hi, trie.next_prefix_node(p)),
            None => past_hi,
        }
    }

    /// First node past the lower end.
    pub(crate) fn low_fence<V>(&self, trie: &PatriciaTrie<K, V>) -> Option<NodeId> {
        match &self.lo {
            Bound::Included(l) => trie.lower_node(l),
            Bound::Excluded(l) => trie.floor_node(l),
            Bound::Unbounded => None,
        }
    }

    pub(crate) fn prefix_node<V>(&self, trie: &PatriciaTrie<K, V>, key: &K) -> Option<NodeId> {
        trie.prefix_node(key).filter(|&id| self.holds(trie, id))
    }

    pub(crate) fn nearest_node<V>(&self, trie: &PatriciaTrie<K, V>, key: &K) -> Option<NodeId> {
        let id = trie.nearest_node(key)?;
        if self.node_too_low(trie, id) {
            self.lowest(trie)
        } else if self.node_too_high(trie, id) {
            self.highest(trie)
        } else {
            Some(id)
        }
    }

    pub(crate) fn next_prefix_node<V>(&self, trie: &PatriciaTrie<K, V>, key: &K) -> Option<NodeId> {
        let id = trie.next_prefix_node(key)?;
        if self.node_too_low(trie, id) {
            self.lowest(trie)
        } else {
            Some(id).filter(|&id| !self.node_too_high(trie, id))
        }
    }

    /// Prefixed keys and the view are both contiguous runs of keys, so the
    /// answer is the start or end of their overlap.
    fn prefixed_overlap<V>(
        &self,
        trie: &PatriciaTrie<K, V>,
        prefix: &K,
        inclusive: bool,
    ) -> Option<(NodeId, NodeId)> {
        let least = trie.least_prefixed_node(prefix, inclusive)?;
        let last = trie.last_prefixed_node(prefix, inclusive)?;
        let lowest = self.lowest(trie)?;
        let highest = self.highest(trie)?;
        let start = max_node(trie, least, lowest);
        let end = match trie.cmp_nodes(last, highest) {
            Ordering::Greater => highest,
            _ => last,
        };
        (trie.cmp_nodes(start, end) != Ordering::Greater).then_some((start, end))
    }

    pub(crate) fn least_prefixed_node<V>(
        &self,
        trie: &PatriciaTrie<K, V>,
        prefix: &K,
        inclusive: bool,
    ) -> Option<NodeId> {
        self.prefixed_overlap(trie, prefix, inclusive)
            .map(|(start, _)| start)
    }

    pub(crate) fn last_prefixed_node<V>(
        &self,
        trie: &PatriciaTrie<K, V>,
        prefix: &K,
        inclusive: bool,
    ) -> Option<NodeId> {
        self.prefixed_overlap(trie, prefix, inclusive)
            .map(|(_, end)| end)
    }
}

fn bound_key<K>(bound: &Bound<K>) -> Option<&K> {
    match bound {
        Bound::Included(k) | Bound::Excluded(k) => Some(k),
        Bound::Unbounded => None,
    }
}

fn max_node<K: BitKey, V>(trie: &PatriciaTrie<K, V>, a: NodeId, b: NodeId) -> NodeId {
    match trie.cmp_nodes(a, b) {
        Ordering::Less => b,
        _ => a,
    }
}

/// Smaller of two candidates; a missing one rules out both.
fn min_node<K: BitKey, V>(
    trie: &PatriciaTrie<K, V>,
    a: Option<NodeId>,
    b: Option<NodeId>,
) -> Option<NodeId> {
    match (a, b) {
        (Some(a), Some(b)) => Some(match trie.cmp_nodes(a, b) {
            Ordering::Greater => b,
            _ => a,
        }),
        _ => None,
    }
}

/// Smaller of two fences; a missing fence is past the end.
fn min_node_or<K: BitKey, V>(
    trie: &PatriciaTrie<K, V>,
    a: Option<NodeId>,
    b: Option<NodeId>,
) -> Option<NodeId> {
    match (a, b) {
        (Some(_), Some(_)) => min_node(trie, a, b),
        (x, None) | (None, x) => x,
    }
}

// =============================================================================
// Read-only view
// =============================================================================

/// A bounded, possibly descending window onto a trie.
///
/// Prefix-family queries ([`prefix_entry`](Self::prefix_entry),
/// [`least_prefixed`](Self::least_prefixed) and friends) answer in absolute
/// key order regardless of the view's direction.
pub struct View<'a, K, V> {
    trie: &'a PatriciaTrie<K, V>,
    bounds: Bounds<K>,
    descending: bool,
}

impl<'a, K: BitKey, V> View<'a, K, V> {
    pub(crate) fn new(trie: &'a PatriciaTrie<K, V>, bounds: Bounds<K>, descending: bool) -> Self {
        Self {
            trie,
            bounds,
            descending,
        }
    }

    fn entry(&self, id: Option<NodeId>) -> Option<(&'a K, &'a V)> {
        id.and_then(|id| self.trie.nodes.entry(id))
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// Whether `key` lies inside the view.
    pub fn in_range<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.bounds.contains(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&'a V>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        if !self.bounds.contains(key) {
            return None;
        }
        self.trie.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Number of entries in the view. Walks the view.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.lowest(self.trie).is_none()
    }

    pub fn first_entry(&self) -> Option<(&'a K, &'a V)> {
        self.entry(if self.descending {
            self.bounds.highest(self.trie)
        } else {
            self.bounds.lowest(self.trie)
        })
    }

    pub fn last_entry(&self) -> Option<(&'a K, &'a V)> {
        self.entry(if self.descending {
            self.bounds.lowest(self.trie)
        } else {
            self.bounds.highest(self.trie)
        })
    }

    pub fn first_key(&self) -> Option<&'a K> {
        self.first_entry().map(|(k, _)| k)
    }

    pub fn last_key(&self) -> Option<&'a K> {
        self.last_entry().map(|(k, _)| k)
    }

    pub fn lower_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(if self.descending {
            self.bounds.higher(self.trie, key)
        } else {
            self.bounds.lower(self.trie, key)
        })
    }

    pub fn floor_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(if self.descending {
            self.bounds.ceiling(self.trie, key)
        } else {
            self.bounds.floor(self.trie, key)
        })
    }

    pub fn ceiling_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(if self.descending {
            self.bounds.floor(self.trie, key)
        } else {
            self.bounds.ceiling(self.trie, key)
        })
    }

    pub fn higher_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(if self.descending {
            self.bounds.lower(self.trie, key)
        } else {
            self.bounds.higher(self.trie, key)
        })
    }

    pub fn lower_key(&self, key: &K) -> Option<&'a K> {
        self.lower_entry(key).map(|(k, _)| k)
    }

    pub fn floor_key(&self, key: &K) -> Option<&'a K> {
        self.floor_entry(key).map(|(k, _)| k)
    }

    pub fn ceiling_key(&self, key: &K) -> Option<&'a K> {
        self.ceiling_entry(key).map(|(k, _)| k)
    }

    pub fn higher_key(&self, key: &K) -> Option<&'a K> {
        self.higher_entry(key).map(|(k, _)| k)
    }

    pub fn prefix_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(self.bounds.prefix_node(self.trie, key))
    }

    pub fn nearest_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(self.bounds.nearest_node(self.trie, key))
    }

    pub fn next_prefix_entry(&self, key: &K) -> Option<(&'a K, &'a V)> {
        self.entry(self.bounds.next_prefix_node(self.trie, key))
    }

    pub fn least_prefixed(&self, prefix: &K, inclusive: bool) -> Option<(&'a K, &'a V)> {
        let trie = self.trie;
        self.entry(self.bounds.least_prefixed_node(trie, prefix, inclusive))
    }

    pub fn last_prefixed(&self, prefix: &K, inclusive: bool) -> Option<(&'a K, &'a V)> {
        let trie = self.trie;
        self.entry(self.bounds.last_prefixed_node(trie, prefix, inclusive))
    }

    /// Entries in view order.
    pub fn iter(&self) -> Range<'a, K, V> {
        Range::new(
            self.trie,
            self.bounds.lowest(self.trie),
            self.bounds.highest(self.trie),
            self.descending,
        )
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &'a K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &'a V> {
        self.iter().map(|(_, v)| v)
    }

    /// Detached fail-fast cursor in view order, stopping at the view's fence.
    pub fn cursor(&self) -> Cursor {
        if self.descending {
            Cursor::new(
                self.trie,
                self.bounds.highest(self.trie),
                self.bounds.low_fence(self.trie),
                true,
            )
        } else {
            Cursor::new(
                self.trie,
                self.bounds.lowest(self.trie),
                self.bounds.high_fence(self.trie),
                false,
            )
        }
    }

    /// Sub-view over `range`, given in key order even for descending views.
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Result<View<'a, K, V>>
    where
        K: Clone,
    {
        let bounds = self
            .bounds
            .narrow(range.start_bound().cloned(), range.end_bound().cloned())?;
        Ok(View::new(self.trie, bounds, self.descending))
    }

    pub fn prefixed(&self, prefix: K, inclusive: bool) -> Result<View<'a, K, V>>
    where
        K: Clone,
    {
        let bounds = self.bounds.narrow_prefix(prefix, inclusive)?;
        Ok(View::new(self.trie, bounds, self.descending))
    }

    /// The same window in the opposite direction.
    pub fn descending(&self) -> View<'a, K, V>
    where
        K: Clone,
    {
        View::new(self.trie, self.bounds.clone(), !self.descending)
    }
}

impl<'a, K: BitKey, V> IntoIterator for &View<'a, K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Range<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Mutable view
// =============================================================================

/// A bounded window that can insert into and remove from its trie.
pub struct ViewMut<'a, K, V> {
    trie: &'a mut PatriciaTrie<K, V>,
    bounds: Bounds<K>,
    descending: bool,
}

impl<'a, K: BitKey, V> ViewMut<'a, K, V> {
    pub(crate) fn new(
        trie: &'a mut PatriciaTrie<K, V>,
        bounds: Bounds<K>,
        descending: bool,
    ) -> Self {
        Self {
            trie,
            bounds,
            descending,
        }
    }

    fn first_node(&self) -> Option<NodeId> {
        if self.descending {
            self.bounds.highest(self.trie)
        } else {
            self.bounds.lowest(self.trie)
        }
    }

    fn last_node(&self) -> Option<NodeId> {
        if self.descending {
            self.bounds.lowest(self.trie)
        } else {
            self.bounds.highest(self.trie)
        }
    }

    /// Read-only view of the same window.
    pub fn as_view(&self) -> View<'_, K, V>
    where
        K: Clone,
    {
        View::new(self.trie, self.bounds.clone(), self.descending)
    }

    pub fn in_range<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.bounds.contains(key)
    }

    /// Insert into the backing trie. Keys outside the view are rejected
    /// without touching the trie.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        if !self.bounds.contains(&key) {
            return Err(Error::ArgumentOutOfRange);
        }
        Ok(self.trie.insert(key, value))
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        if !self.bounds.contains(key) {
            return None;
        }
        self.trie.remove(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        if !self.bounds.contains(key) {
            return None;
        }
        self.trie.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        if !self.bounds.contains(key) {
            return None;
        }
        self.trie.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: BitKey + ?Sized,
    {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.first_node().is_none()
    }

    pub fn first_entry(&self) -> Option<(&K, &V)> {
        self.first_node().and_then(|id| self.trie.nodes.entry(id))
    }

    pub fn last_entry(&self) -> Option<(&K, &V)> {
        self.last_node().and_then(|id| self.trie.nodes.entry(id))
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let id = self.first_node()?;
        self.trie.delete_entry(id)
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let id = self.last_node()?;
        self.trie.delete_entry(id)
    }

    /// Remove every entry inside the view, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let fence = self.bounds.high_fence(self.trie);
        let mut cur = self.bounds.lowest(self.trie);
        let mut removed = 0;
        while let Some(id) = cur.filter(|&id| Some(id) != fence) {
            // The successor keeps its handle when `id` is detached.
            cur = self.trie.nodes.successor(id);
            self.trie.delete_entry(id);
            removed += 1;
        }
        debug!(removed, "view cleared");
        removed
    }

    pub fn iter(&self) -> Range<'_, K, V> {
        Range::new(
            self.trie,
            self.bounds.lowest(self.trie),
            self.bounds.highest(self.trie),
            self.descending,
        )
    }

    pub fn range_mut<R: RangeBounds<K>>(&mut self, range: R) -> Result<ViewMut<'_, K, V>>
    where
        K: Clone,
    {
        let bounds = self
            .bounds
            .narrow(range.start_bound().cloned(), range.end_bound().cloned())?;
        Ok(ViewMut::new(self.trie, bounds, self.descending))
    }

    pub fn prefixed_mut(&mut self, prefix: K, inclusive: bool) -> Result<ViewMut<'_, K, V>>
    where
        K: Clone,
    {
        let bounds = self.bounds.narrow_prefix(prefix, inclusive)?;
        Ok(ViewMut::new(self.trie, bounds, self.descending))
    }

    pub fn descending_mut(&mut self) -> ViewMut<'_, K, V>
    where
        K: Clone,
    {
        ViewMut::new(self.trie, self.bounds.clone(), !self.descending)
    }
}

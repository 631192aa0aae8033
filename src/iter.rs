//! Iteration over a [`PatriciaTrie`].
//!
//! The borrowing iterators step through successor and predecessor links.
//! [`Cursor`] holds no borrow at all and re-validates the trie's version on
//! every step instead.

use std::iter::FusedIterator;

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::trie::PatriciaTrie;

// =============================================================================
// Whole-trie iterators
// =============================================================================

/// Entries in ascending key order. Reversible.
pub struct Iter<'a, K, V> {
    trie: &'a PatriciaTrie<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(trie: &'a PatriciaTrie<K, V>) -> Self {
        Self {
            trie,
            front: trie.first_node(),
            back: trie.last_node(),
            remaining: trie.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            trie: self.trie,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = self.trie.nodes.successor(id);
        self.trie.nodes.entry(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = self.trie.nodes.predecessor(id);
        self.trie.nodes.entry(id)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// Owning iterator; drains the trie from either end.
pub struct IntoIter<K, V> {
    trie: PatriciaTrie<K, V>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(trie: PatriciaTrie<K, V>) -> Self {
        Self { trie }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.trie.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.trie.len(), Some(self.trie.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.trie.pop_last()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

// =============================================================================
// Bounded iteration
// =============================================================================

/// Entries of a view, between its lowest and highest node inclusive.
pub struct Range<'a, K, V> {
    trie: &'a PatriciaTrie<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    done: bool,
    descending: bool,
}

impl<'a, K, V> Range<'a, K, V> {
    pub(crate) fn new(
        trie: &'a PatriciaTrie<K, V>,
        lowest: Option<NodeId>,
        highest: Option<NodeId>,
        descending: bool,
    ) -> Self {
        Self {
            trie,
            front: lowest,
            back: highest,
            done: lowest.is_none() || highest.is_none(),
            descending,
        }
    }

    fn step_up(&mut self) -> Option<(&'a K, &'a V)> {
        if self.done {
            return None;
        }
        let id = self.front?;
        if Some(id) == self.back {
            self.done = true;
        } else {
            self.front = self.trie.nodes.successor(id);
        }
        self.trie.nodes.entry(id)
    }

    fn step_down(&mut self) -> Option<(&'a K, &'a V)> {
        if self.done {
            return None;
        }
        let id = self.back?;
        if Some(id) == self.front {
            self.done = true;
        } else {
            self.back = self.trie.nodes.predecessor(id);
        }
        self.trie.nodes.entry(id)
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.descending {
            self.step_down()
        } else {
            self.step_up()
        }
    }
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.descending {
            self.step_up()
        } else {
            self.step_down()
        }
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

// =============================================================================
// Cursor
// =============================================================================

/// A detached, fail-fast position in a trie.
///
/// A cursor borrows nothing, so the trie may be mutated between steps. Any
/// structural change not made through [`Cursor::remove`] is reported as
/// [`Error::ConcurrentModification`] by the next call.
///
/// ```
/// use patricia_map::PatriciaTrie;
///
/// let mut trie: PatriciaTrie<u8, ()> = (0..10).map(|k| (k, ())).collect();
/// let mut cursor = trie.cursor();
/// while let Some((&k, _)) = cursor.next(&trie).unwrap() {
///     if k % 2 == 1 {
///         cursor.remove(&mut trie).unwrap();
///     }
/// }
/// assert_eq!(trie.keys().copied().collect::<Vec<_>>(), [0, 2, 4, 6, 8]);
/// ```
#[derive(Clone, Debug)]
pub struct Cursor {
    next: Option<NodeId>,
    fence: Option<NodeId>,
    last: Option<NodeId>,
    version: u64,
    descending: bool,
    exhausted: bool,
}

impl Cursor {
    pub(crate) fn new<K, V>(
        trie: &PatriciaTrie<K, V>,
        start: Option<NodeId>,
        fence: Option<NodeId>,
        descending: bool,
    ) -> Self {
        Self {
            next: start,
            fence,
            last: None,
            version: trie.version(),
            descending,
            exhausted: false,
        }
    }

    fn check<K, V>(&self, trie: &PatriciaTrie<K, V>) -> Result<()> {
        if trie.version() != self.version {
            return Err(Error::ConcurrentModification);
        }
        Ok(())
    }

    /// Step to the next entry. `Ok(None)` marks the end, once.
    pub fn next<'t, K, V>(
        &mut self,
        trie: &'t PatriciaTrie<K, V>,
    ) -> Result<Option<(&'t K, &'t V)>> {
        self.check(trie)?;
        if self.exhausted {
            return Err(Error::IteratorState("cursor already exhausted"));
        }
        let current = self
            .next
            .filter(|&id| Some(id) != self.fence && trie.nodes.is_live(id));
        let Some(id) = current else {
            self.exhausted = true;
            self.last = None;
            return Ok(None);
        };
        self.next = if self.descending {
            trie.nodes.predecessor(id)
        } else {
            trie.nodes.successor(id)
        };
        self.last = Some(id);
        Ok(trie.nodes.entry(id))
    }

    /// Remove the entry returned by the last [`next`](Self::next).
    pub fn remove<K, V>(&mut self, trie: &mut PatriciaTrie<K, V>) -> Result<(K, V)> {
        self.check(trie)?;
        let id = self
            .last
            .take()
            .ok_or(Error::IteratorState("remove without a preceding next"))?;
        let entry = trie
            .delete_entry(id)
            .ok_or(Error::IteratorState("entry no longer present"))?;
        self.version = trie.version();
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use crate::{BitString, Error, PatriciaTrie};

    fn numbers(n: u32) -> PatriciaTrie<u32, u32> {
        (0..n).map(|i| (i * 3, i)).collect()
    }

    #[test]
    fn test_iter_both_ends() {
        let t = numbers(10);
        let mut it = t.iter();
        assert_eq!(it.len(), 10);
        assert_eq!(it.next(), Some((&0, &0)));
        assert_eq!(it.next_back(), Some((&27, &9)));
        assert_eq!(it.len(), 8);
        let middle: Vec<u32> = it.map(|(k, _)| *k).collect();
        assert_eq!(middle, [3, 6, 9, 12, 15, 18, 21, 24]);
    }

    #[test]
    fn test_iter_meets_in_middle() {
        let t = numbers(3);
        let mut it = t.keys();
        assert_eq!(it.next(), Some(&0));
        assert_eq!(it.next_back(), Some(&6));
        assert_eq!(it.next(), Some(&3));
        assert_eq!(it.next_back(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_values_and_into_iter() {
        let t = numbers(4);
        assert_eq!(t.values().rev().copied().collect::<Vec<_>>(), [3, 2, 1, 0]);
        let drained: Vec<(u32, u32)> = t.into_iter().collect();
        assert_eq!(drained, [(0, 0), (3, 1), (6, 2), (9, 3)]);
    }

    #[test]
    fn test_iter_with_empty_key() {
        let t: PatriciaTrie<BitString, ()> = ["", "1", "0"]
            .iter()
            .map(|s| (s.parse().unwrap(), ()))
            .collect();
        let keys: Vec<String> = t.keys().rev().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["1", "0", ""]);
    }

    #[test]
    fn test_cursor_fail_fast() {
        let mut t = numbers(5);
        let mut c = t.cursor();
        assert_eq!(c.next(&t).unwrap(), Some((&0, &0)));
        t.insert(100, 100);
        assert!(matches!(c.next(&t), Err(Error::ConcurrentModification)));

        let mut c = t.cursor();
        t.remove(&3);
        assert!(matches!(c.next(&t), Err(Error::ConcurrentModification)));

        // Overwrites are not structural.
        let mut c = t.cursor();
        t.insert(0, 42);
        assert_eq!(c.next(&t).unwrap(), Some((&0, &42)));
    }

    #[test]
    fn test_cursor_exhaustion() {
        let t = numbers(2);
        let mut c = t.cursor();
        assert!(c.next(&t).unwrap().is_some());
        assert!(c.next(&t).unwrap().is_some());
        assert_eq!(c.next(&t).unwrap(), None);
        assert!(matches!(c.next(&t), Err(Error::IteratorState(_))));
    }

    #[test]
    fn test_cursor_remove() {
        let mut t = numbers(6);
        let mut c = t.cursor();
        assert!(matches!(c.remove(&mut t), Err(Error::IteratorState(_))));

        while let Some((&k, _)) = c.next(&t).unwrap() {
            if k % 2 == 0 {
                assert_eq!(c.remove(&mut t).unwrap().0, k);
            }
        }
        assert_eq!(t.keys().copied().collect::<Vec<_>>(), [3, 9, 15]);
        assert!(matches!(c.remove(&mut t), Err(Error::IteratorState(_))));
    }

    #[test]
    fn test_cursor_rev_remove_all() {
        let mut t: PatriciaTrie<BitString, ()> = ["", "0", "01", "011", "1", "10"]
            .iter()
            .map(|s| (s.parse().unwrap(), ()))
            .collect();
        let mut c = t.cursor_rev();
        let mut seen = Vec::new();
        while let Some((k, _)) = c.next(&t).unwrap() {
            seen.push(k.to_string());
            c.remove(&mut t).unwrap();
        }
        assert_eq!(seen, ["10", "1", "011", "01", "0", ""]);
        assert!(t.is_empty());
    }

    #[test]
    fn test_cursor_remove_twice() {
        let mut t = numbers(2);
        let mut c = t.cursor();
        c.next(&t).unwrap();
        c.remove(&mut t).unwrap();
        assert!(matches!(c.remove(&mut t), Err(Error::IteratorState(_))));
        assert_eq!(c.next(&t).unwrap(), Some((&3, &1)));
    }
}

//! Node storage and the link-splice primitives the trie is built from.
//!
//! Nodes live in a slab addressed by [`NodeId`]. Slot `0` is the root
//! sentinel; it is never freed. Every other live slot holds exactly one
//! entry. A sibling chain is ordered by ascending bit index, so the head of a
//! chain holds the greatest subtree and its tail the smallest, and every node
//! is the minimum of its own subtree.
//!
//! ```text
//! --=
//!   0
//!   0------=1
//!   1       0
//!   0--=1   0-------=1
//!   0   0   0        0----=1
//!           +-=--=   0     0
//!             1  0   +-=   0
//!             0  1     0
//!             0  0     1
//! ```
//!
//! Branch children always carry a 1-bit at their index and appear in the
//! middle of their owner's key. Edge children sit at the owner's key length:
//! at most a 1-edge followed by a 0-edge, always at the chain tail.

use std::ops::{Index, IndexMut};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    #[inline]
    fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Structural role of a node inside its owner's chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    /// Root sentinel without an entry.
    RootUnset,
    /// Root sentinel holding the empty key.
    RootEmpty,
    /// Middle child: 1-bit at this index, where the owner has a 0-bit.
    Branch(u32),
    /// Extension of the owner's key whose next bit is 1.
    EdgeOne(u32),
    /// Extension of the owner's key whose next bit is 0.
    EdgeZero(u32),
}

impl Role {
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Role::RootUnset | Role::RootEmpty => 0,
            Role::Branch(i) | Role::EdgeOne(i) | Role::EdgeZero(i) => i as usize,
        }
    }

    #[inline]
    pub(crate) fn is_edge(self) -> bool {
        matches!(self, Role::EdgeOne(_) | Role::EdgeZero(_))
    }

    #[inline]
    pub(crate) fn is_zero_edge(self) -> bool {
        matches!(self, Role::EdgeZero(_))
    }

    #[inline]
    pub(crate) fn edge(index: usize, one: bool) -> Role {
        if one {
            Role::EdgeOne(index as u32)
        } else {
            Role::EdgeZero(index as u32)
        }
    }

    /// Demotes an edge to a branch at the same index.
    #[inline]
    fn to_branch(self) -> Role {
        match self {
            Role::EdgeOne(i) | Role::EdgeZero(i) => Role::Branch(i),
            other => other,
        }
    }
}

/// Non-owning back link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Back {
    /// Root, or a node that is not linked anywhere.
    Detached,
    /// Head of the owner's chain.
    Parent(NodeId),
    /// Follows this node in the same chain.
    Prev(NodeId),
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) entry: Option<(K, V)>,
    pub(crate) role: Role,
    pub(crate) children: Option<NodeId>,
    pub(crate) sibling: Option<NodeId>,
    pub(crate) back: Back,
}

impl<K, V> Node<K, V> {
    fn vacant(role: Role) -> Self {
        Self {
            entry: None,
            role,
            children: None,
            sibling: None,
            back: Back::Detached,
        }
    }
}

// =============================================================================
// Slab
// =============================================================================

#[derive(Clone, Debug)]
pub(crate) struct NodeStore<K, V> {
    nodes: Vec<Node<K, V>>,
    free_list: Vec<u32>,
}

impl<K, V> NodeStore<K, V> {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        let mut nodes = Vec::with_capacity(cap.saturating_add(1));
        nodes.push(Node::vacant(Role::RootUnset));
        Self {
            nodes,
            free_list: Vec::new(),
        }
    }

    /// Allocates an unlinked node. The caller assigns its role.
    pub(crate) fn alloc(&mut self, key: K, value: V) -> NodeId {
        let mut node = Node::vacant(Role::Branch(0));
        node.entry = Some((key, value));
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx as usize] = node;
            NodeId(idx)
        } else {
            let idx = self.nodes.len() as u32;
            self.nodes.push(node);
            NodeId(idx)
        }
    }

    /// Releases an unlinked node and hands back its entry.
    pub(crate) fn free(&mut self, id: NodeId) -> Option<(K, V)> {
        debug_assert_ne!(id, NodeId::ROOT);
        let node = &mut self.nodes[id.slot()];
        let entry = node.entry.take();
        *node = Node::vacant(Role::RootUnset);
        self.free_list.push(id.0);
        entry
    }

    /// Drops every node but a fresh root.
    pub(crate) fn reset(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = Node::vacant(Role::RootUnset);
        self.free_list.clear();
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.nodes.get(id.slot())
    }

    #[inline]
    pub(crate) fn key(&self, id: NodeId) -> Option<&K> {
        self[id].entry.as_ref().map(|(k, _)| k)
    }

    #[inline]
    pub(crate) fn entry(&self, id: NodeId) -> Option<(&K, &V)> {
        self[id].entry.as_ref().map(|(k, v)| (k, v))
    }

    #[inline]
    pub(crate) fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.entry.is_some())
    }

    /// Number of slots, live or free, including the root.
    #[cfg(test)]
    pub(crate) fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates every live entry in slot order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.nodes
            .iter()
            .filter_map(|n| n.entry.as_ref().map(|(k, v)| (k, v)))
    }
}

impl<K, V> Index<NodeId> for NodeStore<K, V> {
    type Output = Node<K, V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id.slot()]
    }
}

impl<K, V> IndexMut<NodeId> for NodeStore<K, V> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.nodes[id.slot()]
    }
}

// =============================================================================
// Navigation
// =============================================================================

impl<K, V> NodeStore<K, V> {
    /// Tail of the chain starting at `id`.
    #[inline]
    pub(crate) fn last_linked(&self, mut id: NodeId) -> NodeId {
        while let Some(next) = self[id].sibling {
            id = next;
        }
        id
    }

    #[inline]
    pub(crate) fn next_or_node(&self, id: NodeId) -> NodeId {
        self[id].sibling.unwrap_or(id)
    }

    /// Greatest node of the subtree rooted at `id`.
    #[inline]
    pub(crate) fn apex(&self, mut id: NodeId) -> NodeId {
        while let Some(head) = self[id].children {
            id = head;
        }
        id
    }

    /// First true parent of `id`, skipping over previous siblings.
    pub(crate) fn parent(&self, mut id: NodeId) -> Option<NodeId> {
        loop {
            match self[id].back {
                Back::Parent(p) => return Some(p),
                Back::Prev(p) => id = p,
                Back::Detached => return None,
            }
        }
    }

    /// Next node in key order. `None` past the greatest node.
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        match self[id].children {
            Some(head) => Some(self.last_linked(head)),
            None => self.higher_successor(id),
        }
    }

    /// Next node in key order outside the subtree of `id`.
    pub(crate) fn higher_successor(&self, mut id: NodeId) -> Option<NodeId> {
        loop {
            match self[id].back {
                Back::Parent(p) => id = p,
                Back::Prev(p) => return Some(p),
                Back::Detached => return None,
            }
        }
    }

    /// Previous node in key order. The root sentinel precedes every entry,
    /// and `None` is returned only before the root.
    pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        match self[id].sibling {
            Some(next) => Some(self.apex(next)),
            None => self.parent(id),
        }
    }

    /// Climbs out of chains until reaching a node whose index is below
    /// `index`.
    pub(crate) fn backwards_retrace(&self, mut track: NodeId, index: usize) -> NodeId {
        if self[track].role.index() > index {
            loop {
                match self.parent(track) {
                    Some(p) => track = p,
                    None => break,
                }
                if self[track].role.index() < index {
                    break;
                }
            }
        }
        track
    }

    /// Last child of `owner` whose index is at most `index`.
    pub(crate) fn find_insertion_node(&self, owner: NodeId, index: usize) -> Option<NodeId> {
        let mut ins = None;
        let mut cur = self[owner].children;
        while let Some(c) = cur {
            if self[c].role.index() > index {
                break;
            }
            ins = Some(c);
            cur = self[c].sibling;
        }
        ins
    }

    /// Like [`find_insertion_node`](Self::find_insertion_node), but a child
    /// sitting exactly at `index` becomes a 1-edge and is returned.
    pub(crate) fn find_marked_insertion_node(
        &mut self,
        owner: NodeId,
        index: usize,
    ) -> Option<NodeId> {
        let mut ins = None;
        let mut cur = self[owner].children;
        while let Some(c) = cur {
            let at = self[c].role.index();
            if at >= index {
                if at == index {
                    self[c].role = Role::EdgeOne(index as u32);
                    return Some(c);
                }
                break;
            }
            ins = Some(c);
            cur = self[c].sibling;
        }
        ins
    }
}

// =============================================================================
// Splicing
// =============================================================================

impl<K, V> NodeStore<K, V> {
    /// Points whatever `back` names at `to`.
    #[inline]
    fn redirect(&mut self, back: Back, to: Option<NodeId>) {
        match back {
            Back::Parent(p) => self[p].children = to,
            Back::Prev(p) => self[p].sibling = to,
            Back::Detached => {}
        }
    }

    /// Inserts `node` as the head of `dest`'s children.
    pub(crate) fn enlist(&mut self, dest: NodeId, node: NodeId) {
        let next = self[dest].children;
        self[node].back = Back::Parent(dest);
        self[dest].children = Some(node);
        if let Some(next) = next {
            self[node].sibling = Some(next);
            self[next].back = Back::Prev(node);
        }
    }

    /// Inserts `node` right after `dest`.
    pub(crate) fn append(&mut self, dest: NodeId, node: NodeId) {
        let next = self[dest].sibling;
        self[node].back = Back::Prev(dest);
        self[dest].sibling = Some(node);
        if let Some(next) = next {
            self[node].sibling = Some(next);
            self[next].back = Back::Prev(node);
        }
    }

    /// Inserts `node` right before `dest`.
    pub(crate) fn prepend(&mut self, dest: NodeId, node: NodeId) {
        let back = self[dest].back;
        self[node].back = back;
        self.redirect(back, Some(node));
        self[node].sibling = Some(dest);
        self[dest].back = Back::Prev(node);
    }

    /// Puts `repl` where `node` is. `repl` takes over the role, back link and
    /// sibling of `node`; children are left alone.
    pub(crate) fn replace(&mut self, node: NodeId, repl: NodeId) {
        let back = self[node].back;
        self[repl].role = self[node].role;
        self[repl].back = back;
        self.redirect(back, Some(repl));
        if let Some(next) = self[node].sibling.take() {
            self[repl].sibling = Some(next);
            self[next].back = Back::Prev(repl);
        }
    }

    /// Moves `track`, which was just replaced by `entry`, under `entry`.
    ///
    /// Children of `track` up to and including `upto` are covered by `entry`
    /// and move to it; `track` is appended after them and keeps the rest.
    /// With no `upto`, `track` becomes the only child of `entry`.
    pub(crate) fn adopt(&mut self, entry: NodeId, track: NodeId, upto: Option<NodeId>) {
        match upto {
            Some(upto) => {
                let head = self[track].children;
                self[entry].children = head;
                if let Some(head) = head {
                    self[head].back = Back::Parent(entry);
                }
                let rest = self[upto].sibling;
                self[upto].sibling = Some(track);
                self[track].back = Back::Prev(upto);
                self[track].children = rest;
                if let Some(rest) = rest {
                    self[rest].back = Back::Parent(track);
                }
            }
            None => {
                self[entry].children = Some(track);
                self[track].back = Back::Parent(entry);
            }
        }
    }

    /// Unlinks `id` from the graph, re-homing its children.
    ///
    /// The tail of the children chain (the successor of `id`) takes over the
    /// position of `id`, and the rest of the chain is placed in front of the
    /// tail's own children.
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(head) = self[id].children {
            let mut last = head;
            if let Some(second) = self[head].sibling {
                let mut prev = head;
                last = second;
                while let Some(next) = self[last].sibling {
                    prev = last;
                    last = next;
                }
                let linked = self[last].children;
                // A 1-edge in front of the 0-edge tail becomes its branch.
                self[prev].role = self[prev].role.to_branch();
                self[last].children = Some(head);
                self[head].back = Back::Parent(last);
                self[prev].sibling = linked;
                if let Some(linked) = linked {
                    self[linked].back = Back::Prev(prev);
                }
            }
            self.replace(id, last);
        } else {
            let next = self[id].sibling.take();
            let back = self[id].back;
            self.redirect(back, next);
            if let Some(next) = next {
                self[next].back = back;
            }
        }
        let node = &mut self[id];
        node.back = Back::Detached;
        node.children = None;
        node.sibling = None;
    }

    /// Frees every node below `id` without recursion and returns how many
    /// were released. `id` itself stays allocated, now without children.
    pub(crate) fn destroy_links(&mut self, id: NodeId) -> usize {
        let mut walk = Walk::new(self[id].children.take());
        let mut freed = 0;
        while let Some(visit) = walk.advance(self) {
            self.free(visit.id);
            freed += 1;
        }
        freed
    }
}

// =============================================================================
// Unordered walk
// =============================================================================

/// A node reached by [`Walk`], with the links it had when visited.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Visit {
    pub(crate) id: NodeId,
    pub(crate) has_sibling: bool,
    pub(crate) has_children: bool,
}

/// Iterative walk over a subtree: siblings first, children resumed from a
/// pending stack once a chain runs out.
///
/// Child heads are remembered when a node is visited, so callers may free
/// each visited node before advancing.
pub(crate) struct Walk {
    next: Option<NodeId>,
    pending: Vec<NodeId>,
}

impl Walk {
    pub(crate) fn new(start: Option<NodeId>) -> Self {
        Self {
            next: start,
            pending: Vec::new(),
        }
    }

    pub(crate) fn advance<K, V>(&mut self, store: &NodeStore<K, V>) -> Option<Visit> {
        let id = self.next?;
        let node = &store[id];
        self.next = match (node.sibling, node.children) {
            (Some(sibling), children) => {
                if let Some(children) = children {
                    self.pending.push(children);
                }
                Some(sibling)
            }
            (None, Some(children)) => Some(children),
            (None, None) => self.pending.pop(),
        };
        Some(Visit {
            id,
            has_sibling: node.sibling.is_some(),
            has_children: node.children.is_some(),
        })
    }
}

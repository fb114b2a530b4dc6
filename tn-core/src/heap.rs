//! Addressable priority queues with decrease-key.
//!
//! Every search in the engine goes through [`AddressableHeap`], so the backing structure can be
//! swapped without touching the algorithms. Items are dense `usize` handles (vertex ids).

use std::cmp::Reverse;
use std::collections::HashMap;

use priority_queue::PriorityQueue;
use serde::{
    Deserialize,
    Serialize,
};

/// A min-priority queue whose entries can have their key lowered in place.
pub trait AddressableHeap<P: Ord + Copy>: Send {
    /// Inserts `item` with `priority`. If `item` is already queued this behaves like
    /// [`decrease_key`](Self::decrease_key).
    fn push(&mut self, item: usize, priority: P);

    /// Returns the minimum entry without removing it.
    fn peek_min(&self) -> Option<(usize, P)>;

    /// Removes and returns the minimum entry.
    fn pop_min(&mut self) -> Option<(usize, P)>;

    /// Lowers the key of a queued item. Returns false if the item is absent or the new key is not
    /// smaller than the current one.
    fn decrease_key(&mut self, item: usize, priority: P) -> bool;

    /// True if `item` is currently queued.
    fn contains(&self, item: usize) -> bool;

    /// Number of queued items.
    fn len(&self) -> usize;

    /// True if nothing is queued.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    fn clear(&mut self);
}

/// Selects the [`AddressableHeap`] implementation used by searches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeapKind {
    /// [`PairingHeap`], amortized O(1) decrease-key.
    #[default]
    Pairing,
    /// Indexed binary heap from the `priority-queue` crate.
    Binary,
}

impl HeapKind {
    /// Creates an empty heap of this kind.
    #[must_use]
    pub fn build<P: Ord + Copy + Send + 'static>(self) -> Box<dyn AddressableHeap<P>> {
        match self {
            Self::Pairing => Box::new(PairingHeap::new()),
            Self::Binary => Box::new(PriorityQueue::<usize, Reverse<P>>::new()),
        }
    }
}

/// A node of the pairing heap arena.
#[derive(Clone, Debug)]
struct HeapNode<P> {
    /// The queued handle.
    item: usize,
    /// Current key.
    priority: P,
    /// Leftmost child.
    child: Option<usize>,
    /// Right sibling.
    next: Option<usize>,
    /// Parent if this is a leftmost child, left sibling otherwise.
    prev: Option<usize>,
}

/// Two-pass pairing heap stored in an arena of nodes addressed by index.
#[derive(Clone, Debug)]
pub struct PairingHeap<P> {
    /// Node arena; slots listed in `free` are unused.
    nodes: Vec<HeapNode<P>>,
    /// Recycled arena slots.
    free: Vec<usize>,
    /// Arena slot of the minimum.
    root: Option<usize>,
    /// Item handle to arena slot.
    slots: HashMap<usize, usize>,
}

impl<P: Ord + Copy> Default for PairingHeap<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Ord + Copy> PairingHeap<P> {
    /// Creates an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new(), free: Vec::new(), root: None, slots: HashMap::new() }
    }

    /// Allocates a detached node.
    fn alloc(&mut self, item: usize, priority: P) -> usize {
        let node = HeapNode { item, priority, child: None, next: None, prev: None };
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    /// Links two detached roots, returning the new root.
    fn meld(&mut self, a: usize, b: usize) -> usize {
        let (parent, child) = if self.nodes[b].priority < self.nodes[a].priority { (b, a) } else { (a, b) };
        let first = self.nodes[parent].child;
        self.nodes[child].next = first;
        if let Some(first) = first {
            self.nodes[first].prev = Some(child);
        }
        self.nodes[child].prev = Some(parent);
        self.nodes[parent].child = Some(child);
        parent
    }

    /// Melds a detached subtree into the root list.
    fn meld_root(&mut self, node: usize) {
        self.root = Some(match self.root {
            Some(root) => self.meld(root, node),
            None => node,
        });
    }

    /// Detaches `node` from its parent and siblings.
    fn cut(&mut self, node: usize) {
        let Some(prev) = self.nodes[node].prev else {
            return;
        };
        let next = self.nodes[node].next;
        if self.nodes[prev].child == Some(node) {
            self.nodes[prev].child = next;
        } else {
            self.nodes[prev].next = next;
        }
        if let Some(next) = next {
            self.nodes[next].prev = Some(prev);
        }
        self.nodes[node].prev = None;
        self.nodes[node].next = None;
    }

    /// Merges the children of a removed root with the standard two-pass scheme.
    fn merge_children(&mut self, first: Option<usize>) -> Option<usize> {
        let mut children = Vec::new();
        let mut cursor = first;
        while let Some(c) = cursor {
            cursor = self.nodes[c].next;
            self.nodes[c].prev = None;
            self.nodes[c].next = None;
            children.push(c);
        }

        let paired: Vec<usize> = children
            .chunks(2)
            .map(|pair| match *pair {
                [a, b] => self.meld(a, b),
                [a] => a,
                _ => unreachable!("chunks(2) yields one or two elements"),
            })
            .collect();

        paired.into_iter().rev().reduce(|acc, node| self.meld(node, acc))
    }
}

impl<P: Ord + Copy + Send> AddressableHeap<P> for PairingHeap<P> {
    fn push(&mut self, item: usize, priority: P) {
        if self.slots.contains_key(&item) {
            self.decrease_key(item, priority);
            return;
        }
        let slot = self.alloc(item, priority);
        self.slots.insert(item, slot);
        self.meld_root(slot);
    }

    fn peek_min(&self) -> Option<(usize, P)> {
        self.root.map(|r| (self.nodes[r].item, self.nodes[r].priority))
    }

    fn pop_min(&mut self) -> Option<(usize, P)> {
        let root = self.root?;
        let HeapNode { item, priority, child, .. } = self.nodes[root].clone();
        self.slots.remove(&item);
        self.free.push(root);
        self.root = self.merge_children(child);
        Some((item, priority))
    }

    fn decrease_key(&mut self, item: usize, priority: P) -> bool {
        let Some(&slot) = self.slots.get(&item) else {
            return false;
        };
        if priority >= self.nodes[slot].priority {
            return false;
        }
        self.nodes[slot].priority = priority;
        if self.root != Some(slot) {
            self.cut(slot);
            self.meld_root(slot);
        }
        true
    }

    fn contains(&self, item: usize) -> bool {
        self.slots.contains_key(&item)
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.slots.clear();
        self.root = None;
    }
}

impl<P: Ord + Copy + Send> AddressableHeap<P> for PriorityQueue<usize, Reverse<P>> {
    fn push(&mut self, item: usize, priority: P) {
        self.push_increase(item, Reverse(priority));
    }

    fn peek_min(&self) -> Option<(usize, P)> {
        self.peek().map(|(&item, &Reverse(priority))| (item, priority))
    }

    fn pop_min(&mut self) -> Option<(usize, P)> {
        self.pop().map(|(item, Reverse(priority))| (item, priority))
    }

    fn decrease_key(&mut self, item: usize, priority: P) -> bool {
        match self.get_priority(&item) {
            Some(&Reverse(current)) if priority < current => {
                self.change_priority(&item, Reverse(priority));
                true
            },
            _ => false,
        }
    }

    fn contains(&self, item: usize) -> bool {
        self.get(&item).is_some()
    }

    fn len(&self) -> usize {
        PriorityQueue::len(self)
    }

    fn clear(&mut self) {
        PriorityQueue::clear(self);
    }
}

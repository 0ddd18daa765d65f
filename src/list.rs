//! Arena-backed intrusive doubly linked list.
//!
//! This is the zero-(re)allocation ordered container described in the
//! design's component A. Real intrusive lists thread `prev`/`next` pointers
//! through the stored objects themselves; that requires the objects to be
//! pinned and borrowed rather than owned, which in safe Rust means raw
//! pointers and unsafe aliasing. This module instead takes the alternative
//! the design explicitly allows: a slab (`Vec<Node<T>>`) plus stable
//! `NodeId` indices standing in for the link pointers. Insertion and
//! removal are still O(1) (besides the occasional `Vec` growth when the
//! arena itself needs to grow, which is not a per-`run` operation), and
//! iteration is index-based rather than pointer-based.
//!
//! One consequence of choosing an owning arena over borrowed intrusive
//! pointers: `List<T>` owns the `T` values placed into it. A caller that
//! wants its task back (to inspect or drop it) gets it via [`List::erase`],
//! [`List::pop_front`] or [`List::pop_back`], all of which hand the value
//! back by move.
//!
//! Two sentinel nodes (`head`, `tail`) bound the list on both ends; real
//! values live strictly between them. This mirrors `ulink::List`'s
//! `mStartNode`/`mEndNode` pair.

use alloc::vec::Vec;

/// Stable handle to a node stored in a [`List`]. Indices are reused after
/// removal; the generation counter distinguishes a stale `NodeId` left over
/// from a removed node from the new occupant of its slot, which matters for
/// [`List::is_linked`] — a task's `run` may remove itself and a later
/// `add_task` call may immediately recycle its slot.
#[derive(Debug)]
pub struct NodeId(usize, u32);

// Manual impls: `#[derive(Clone, Copy, ...)]` would work identically here,
// spelled out because `NodeId` is a newtype and the derived bounds read
// oddly on a tuple struct with plain index/generation fields.
impl Clone for NodeId {
    fn clone(&self) -> Self {
        *self
    }
}
impl Copy for NodeId {}
impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}
impl Eq for NodeId {}

enum Slot<T> {
    /// A real value with links to its neighbors (`None` only at the
    /// sentinel boundary).
    Occupied {
        value: T,
        prev: Option<NodeId>,
        next: Option<NodeId>,
        generation: u32,
    },
    /// One of the two fixed sentinels. Holds no value.
    Sentinel {
        prev: Option<NodeId>,
        next: Option<NodeId>,
    },
    /// A freed slot, linked into the free list via `next_free`.
    Vacant {
        next_free: Option<usize>,
        generation: u32,
    },
}

/// Zero-reallocation (after warm-up) ordered container of `T`, bounded by
/// two sentinel nodes. See the module documentation for the ownership and
/// indexing model.
pub struct List<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    head: NodeId,
    tail: NodeId,
    len: usize,
}

impl<T> List<T> {
    /// Creates an empty list; `head` and `tail` are linked to each other.
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(2);
        slots.push(Slot::Sentinel {
            prev: None,
            next: Some(NodeId(1, 0)),
        });
        slots.push(Slot::Sentinel {
            prev: Some(NodeId(0, 0)),
            next: None,
        });
        List {
            slots,
            free_head: None,
            head: NodeId(0, 0),
            tail: NodeId(1, 0),
            len: 0,
        }
    }

    /// Number of real (non-sentinel) nodes. O(1): tracked incrementally,
    /// unlike `ulink::List::size`, which walks the chain.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `id` still refers to a live occupied node in this list, as
    /// opposed to a stale handle whose slot has since been freed (and
    /// possibly reused for an unrelated node).
    pub fn is_linked(&self, id: NodeId) -> bool {
        if id == self.head || id == self.tail {
            return true;
        }
        matches!(
            self.slots.get(id.0),
            Some(Slot::Occupied { generation, .. }) if *generation == id.1
        )
    }

    fn alloc(&mut self, value: T, prev: Option<NodeId>, next: Option<NodeId>) -> NodeId {
        match self.free_head {
            Some(idx) => {
                let (next_free, generation) = match &self.slots[idx] {
                    Slot::Vacant {
                        next_free,
                        generation,
                    } => (*next_free, *generation),
                    _ => unreachable!("free list points at a non-vacant slot"),
                };
                self.free_head = next_free;
                self.slots[idx] = Slot::Occupied {
                    value,
                    prev,
                    next,
                    generation,
                };
                NodeId(idx, generation)
            }
            None => {
                self.slots.push(Slot::Occupied {
                    value,
                    prev,
                    next,
                    generation: 0,
                });
                NodeId(self.slots.len() - 1, 0)
            }
        }
    }

    fn free(&mut self, id: NodeId) -> T {
        let generation = id.1.wrapping_add(1);
        let old = core::mem::replace(
            &mut self.slots[id.0],
            Slot::Vacant {
                next_free: self.free_head,
                generation,
            },
        );
        self.free_head = Some(id.0);
        match old {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("freeing a slot that was not occupied"),
        }
    }

    fn prev_of(&self, id: NodeId) -> Option<NodeId> {
        match &self.slots[id.0] {
            Slot::Occupied { prev, .. } | Slot::Sentinel { prev, .. } => *prev,
            Slot::Vacant { .. } => unreachable!("dangling NodeId"),
        }
    }

    fn next_of(&self, id: NodeId) -> Option<NodeId> {
        match &self.slots[id.0] {
            Slot::Occupied { next, .. } | Slot::Sentinel { next, .. } => *next,
            Slot::Vacant { .. } => unreachable!("dangling NodeId"),
        }
    }

    fn set_prev(&mut self, id: NodeId, prev: Option<NodeId>) {
        match &mut self.slots[id.0] {
            Slot::Occupied { prev: p, .. } | Slot::Sentinel { prev: p, .. } => *p = prev,
            Slot::Vacant { .. } => unreachable!("dangling NodeId"),
        }
    }

    fn set_next(&mut self, id: NodeId, next: Option<NodeId>) {
        match &mut self.slots[id.0] {
            Slot::Occupied { next: n, .. } | Slot::Sentinel { next: n, .. } => *n = next,
            Slot::Vacant { .. } => unreachable!("dangling NodeId"),
        }
    }

    /// Links `node` strictly between `before` and `after`, which must
    /// already be adjacent.
    fn link_between(&mut self, before: NodeId, node: NodeId, after: NodeId) {
        self.set_next(before, Some(node));
        self.set_prev(node, Some(before));
        self.set_next(node, Some(after));
        self.set_prev(after, Some(node));
    }

    /// Inserts `value` immediately after `pos`.
    pub fn insert_after(&mut self, pos: NodeId, value: T) -> NodeId {
        let after = self.next_of(pos).expect("pos has no successor");
        let id = self.alloc(value, Some(pos), Some(after));
        self.set_next(pos, Some(id));
        self.set_prev(after, Some(id));
        self.len += 1;
        id
    }

    /// Inserts `value` immediately before `pos`.
    pub fn insert_before(&mut self, pos: NodeId, value: T) -> NodeId {
        let before = self.prev_of(pos).expect("pos has no predecessor");
        let id = self.alloc(value, Some(before), Some(pos));
        self.set_next(before, Some(id));
        self.set_prev(pos, Some(id));
        self.len += 1;
        id
    }

    pub fn push_front(&mut self, value: T) -> NodeId {
        self.insert_after(self.head, value)
    }

    pub fn push_back(&mut self, value: T) -> NodeId {
        self.insert_before(self.tail, value)
    }

    /// Unlinks `id` from its current neighbors without freeing its slot or
    /// touching `len`. Leaves `id` dangling (no prev/next) until relinked.
    fn detach(&mut self, id: NodeId) {
        let prev = self.prev_of(id).expect("node has no predecessor");
        let next = self.next_of(id).expect("node has no successor");
        self.set_next(prev, Some(next));
        self.set_prev(next, Some(prev));
    }

    /// Removes `id` from the list and returns its value.
    ///
    /// # Panics
    /// Panics if `id` is the head or tail sentinel.
    pub fn erase(&mut self, id: NodeId) -> T {
        assert!(
            id != self.head && id != self.tail,
            "list: erase: cannot erase a sentinel node"
        );
        self.detach(id);
        self.len -= 1;
        self.free(id)
    }

    /// Moves the already-linked node `id` to sit immediately after `pos`,
    /// preserving `id`'s identity (its `NodeId` is unchanged). This is how
    /// [`crate::rank_list::RankSortedList`] repositions a node on rank
    /// change without reallocating its slot, which an intrusive list gets
    /// for free by construction.
    ///
    /// # Panics
    /// Panics if `id` is a sentinel.
    pub fn move_after(&mut self, id: NodeId, pos: NodeId) {
        assert!(
            id != self.head && id != self.tail,
            "list: move_after: cannot move a sentinel node"
        );
        if id == pos {
            return;
        }
        self.detach(id);
        let after = self.next_of(pos).expect("pos has no successor");
        self.link_between(pos, id, after);
    }

    /// Moves the already-linked node `id` to sit immediately before `pos`.
    ///
    /// # Panics
    /// Panics if `id` is a sentinel.
    pub fn move_before(&mut self, id: NodeId, pos: NodeId) {
        assert!(
            id != self.head && id != self.tail,
            "list: move_before: cannot move a sentinel node"
        );
        if id == pos {
            return;
        }
        self.detach(id);
        let before = self.prev_of(pos).expect("pos has no predecessor");
        self.link_between(before, id, pos);
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let first = self.next_of(self.head)?;
        if first == self.tail {
            return None;
        }
        Some(self.erase(first))
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let last = self.prev_of(self.tail)?;
        if last == self.head {
            return None;
        }
        Some(self.erase(last))
    }

    /// `NodeId` of the first real node, or `None` if empty.
    pub fn front_id(&self) -> Option<NodeId> {
        let first = self.next_of(self.head)?;
        (first != self.tail).then_some(first)
    }

    /// `NodeId` of the last real node, or `None` if empty.
    pub fn back_id(&self) -> Option<NodeId> {
        let last = self.prev_of(self.tail)?;
        (last != self.head).then_some(last)
    }

    pub fn front(&self) -> Option<&T> {
        self.front_id().map(|id| self.get(id))
    }

    pub fn back(&self) -> Option<&T> {
        self.back_id().map(|id| self.get(id))
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.front_id().map(move |id| self.get_mut(id))
    }

    pub fn get(&self, id: NodeId) -> &T {
        match &self.slots[id.0] {
            Slot::Occupied { value, .. } => value,
            _ => panic!("list: get: NodeId does not refer to an occupied node"),
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        match &mut self.slots[id.0] {
            Slot::Occupied { value, .. } => value,
            _ => panic!("list: get_mut: NodeId does not refer to an occupied node"),
        }
    }

    /// The `NodeId` following `id`, skipping past the tail back to `None`.
    /// Returns `None` once `id`'s successor is the tail sentinel.
    pub fn next_id(&self, id: NodeId) -> Option<NodeId> {
        let next = self.next_of(id)?;
        (next != self.tail).then_some(next)
    }

    /// The `NodeId` preceding `id`, or `None` once `id`'s predecessor is the
    /// head sentinel.
    pub fn prev_id(&self, id: NodeId) -> Option<NodeId> {
        let prev = self.prev_of(id)?;
        (prev != self.head).then_some(prev)
    }

    /// `NodeId` of the head sentinel, useful as an `insert_after` anchor
    /// for "push to the very front" callers that already hold a cursor.
    pub fn head_id(&self) -> NodeId {
        self.head
    }

    /// `NodeId` of the tail sentinel, useful as an `insert_before` anchor.
    pub fn tail_id(&self) -> NodeId {
        self.tail
    }

    /// Removes every real node, dropping their values. The two sentinels
    /// are kept and re-linked to each other.
    pub fn clear(&mut self) {
        let mut cur = self.next_of(self.head);
        while let Some(id) = cur {
            if id == self.tail {
                break;
            }
            let next = self.next_of(id);
            self.free(id);
            cur = next;
        }
        self.set_next(self.head, Some(self.tail));
        self.set_prev(self.tail, Some(self.head));
        self.len = 0;
    }

    /// Forward iterator over `(NodeId, &T)` pairs, head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cur: self.next_of(self.head),
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, T> {
    list: &'a List<T>,
    cur: Option<NodeId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cur?;
        if id == self.list.tail {
            self.cur = None;
            return None;
        }
        self.cur = self.list.next_of(id);
        Some((id, self.list.get(id)))
    }
}


//! Rank-sorted specialization of [`crate::list`] (component C).
//!
//! Wraps an arena-backed [`List`] and keeps it sorted by each element's
//! [`RankedTask::rank`], re-sorting only the one node that changed instead
//! of re-sorting the whole list. Grounded on `ucosm::ITask::updateRank` /
//! `ucosm::IScheduler::sortTask`'s walk-left/walk-right reposition.

use crate::list::{Iter, List, NodeId};
use crate::task::RankedTask;

/// A list of `T` maintained in non-decreasing rank order (invariant L2).
pub struct RankSortedList<T: RankedTask> {
    list: List<T>,
}

impl<T: RankedTask> RankSortedList<T> {
    pub fn new() -> Self {
        RankSortedList { list: List::new() }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &T {
        self.list.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        self.list.get_mut(id)
    }

    pub fn front_id(&self) -> Option<NodeId> {
        self.list.front_id()
    }

    pub fn back_id(&self) -> Option<NodeId> {
        self.list.back_id()
    }

    pub fn head_id(&self) -> NodeId {
        self.list.head_id()
    }

    pub fn tail_id(&self) -> NodeId {
        self.list.tail_id()
    }

    pub fn next_id(&self, id: NodeId) -> Option<NodeId> {
        self.list.next_id(id)
    }

    pub fn prev_id(&self, id: NodeId) -> Option<NodeId> {
        self.list.prev_id(id)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.list.iter()
    }

    pub fn clear(&mut self) {
        self.list.clear()
    }

    pub fn erase(&mut self, id: NodeId) -> T {
        self.list.erase(id)
    }

    /// Whether `id` still refers to a live node, as opposed to a stale
    /// handle whose slot has since been freed and possibly reused.
    pub fn is_linked(&self, id: NodeId) -> bool {
        self.list.is_linked(id)
    }

    /// Links `value` immediately after `pos`, bypassing rank order. Used by
    /// the scheduler frame to place a new task right after the cursor
    /// before assigning it an initial rank (spec.md §4.D); callers that
    /// need strict sort order on insertion should use [`Self::push_sorted`]
    /// instead.
    pub fn insert_after(&mut self, pos: NodeId, value: T) -> NodeId {
        self.list.insert_after(pos, value)
    }

    /// Moves the already-linked node `id` to the very front of the list,
    /// bypassing rank order. Used to wrap the cursor back around when it
    /// reaches the tail.
    pub fn move_to_front(&mut self, id: NodeId) {
        let head = self.list.head_id();
        self.list.move_after(id, head);
    }

    /// Moves the already-linked node `id` to sit immediately after `pos`,
    /// bypassing rank order. Used by the fair-share scheduler to park the
    /// cursor just past the task that ran, and by the periodic scheduler to
    /// force an overflowed task to the front.
    pub fn move_after(&mut self, id: NodeId, pos: NodeId) {
        self.list.move_after(id, pos);
    }

    /// Inserts `value` keeping the list sorted by rank (spec.md §4.C):
    /// pushed to the front if its rank is below the current minimum, to the
    /// back if above the current maximum, otherwise inserted and walked
    /// into place.
    pub fn push_sorted(&mut self, value: T) -> NodeId {
        if self.list.is_empty() {
            return self.list.push_back(value);
        }
        let front_rank = self.list.get(self.list.front_id().unwrap()).rank();
        if value.rank() < front_rank {
            return self.list.push_front(value);
        }
        let back_rank = self.list.get(self.list.back_id().unwrap()).rank();
        if value.rank() > back_rank {
            return self.list.push_back(value);
        }
        let id = self.list.push_back(value);
        self.reposition(id);
        id
    }

    /// Sets `id`'s rank and repositions it to restore sort order. Returns
    /// `true` iff the node's position in the list changed.
    pub fn set_rank(&mut self, id: NodeId, rank: u32) -> bool {
        self.list.get_mut(id).set_rank(rank);
        self.reposition(id)
    }

    /// Walks `id` outward from its current neighbors until sort order is
    /// restored. Returns `true` iff its position changed.
    pub fn reposition(&mut self, id: NodeId) -> bool {
        let r = self.list.get(id).rank();
        let prev = self.list.prev_id(id);
        let next = self.list.next_id(id);

        let needs_left = prev.is_some_and(|p| r < self.list.get(p).rank());
        if needs_left {
            let mut cur = prev;
            while let Some(c) = cur {
                if self.list.get(c).rank() <= r {
                    break;
                }
                cur = self.list.prev_id(c);
            }
            match cur {
                Some(c) => self.list.move_after(id, c),
                None => self.list.move_after(id, self.list.head_id()),
            }
            return true;
        }

        let needs_right = next.is_some_and(|n| r > self.list.get(n).rank());
        if needs_right {
            let mut cur = next;
            while let Some(c) = cur {
                if self.list.get(c).rank() >= r {
                    break;
                }
                cur = self.list.next_id(c);
            }
            match cur {
                Some(c) => self.list.move_before(id, c),
                None => self.list.move_before(id, self.list.tail_id()),
            }
            return true;
        }

        false
    }
}

impl<T: RankedTask> Default for RankSortedList<T> {
    fn default() -> Self {
        Self::new()
    }
}


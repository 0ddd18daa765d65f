//! Scheduler frame: state shared by every concrete scheduler policy
//! (component D).
//!
//! Grounded on `ucosm::IScheduler` almost one-to-one (cursor, idle hook,
//! current-task tracking, `add_task`/`remove_task`/`list`/`next_rank`), with
//! the common Rust-facing shape borrowed from
//! `martos::task_manager::TaskManagerTrait`.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::list::NodeId;
use crate::rank_list::RankSortedList;
use crate::task::{RankedTask, Task};

/// Common state threaded through every scheduler: the rank-sorted task
/// list, the cursor sentinel's position in it, the optional idle hook, and
/// which task (if any) is currently inside its `run` call.
pub struct SchedulerFrame<T: RankedTask> {
    tasks: RankSortedList<T>,
    cursor_id: NodeId,
    idle: Option<Box<dyn FnMut()>>,
    current: Option<NodeId>,
}

impl<T: RankedTask> SchedulerFrame<T> {
    /// Builds a frame whose list contains only `cursor`, placed at rank 0.
    pub fn new(cursor: T) -> Self {
        let mut tasks = RankSortedList::new();
        let cursor_id = tasks.push_sorted(cursor);
        SchedulerFrame {
            tasks,
            cursor_id,
            idle: None,
            current: None,
        }
    }

    pub fn cursor_id(&self) -> NodeId {
        self.cursor_id
    }

    pub fn tasks(&self) -> &RankSortedList<T> {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut RankSortedList<T> {
        &mut self.tasks
    }

    /// Runs `task`'s `init` hook, and on success links it immediately after
    /// the cursor and assigns `initial_rank`, repositioning it into sort
    /// order. Returns the new node's identity on success, or `None` if
    /// `init` refused the task (in which case it is never linked).
    ///
    /// In the borrowed-intrusive-pointer original, the caller already holds
    /// the task's address and a bare success/failure flag suffices; the
    /// owning-arena substitution here means the node's identity is itself
    /// the thing callers need back, so `add_task` returns it directly
    /// instead of a bare `bool`.
    pub fn add_task(&mut self, mut task: T, initial_rank: u32) -> Option<NodeId> {
        if !task.init() {
            return None;
        }
        let id = self.tasks.insert_after(self.cursor_id, task);
        self.tasks.set_rank(id, initial_rank);
        Some(id)
    }

    /// Unlinks `id` and runs its `deinit` hook.
    ///
    /// # Panics
    /// Panics if `id` is the cursor or does not refer to a currently linked
    /// task.
    pub fn remove_task(&mut self, id: NodeId) {
        assert!(
            id != self.cursor_id,
            "frame: remove_task: cannot remove the cursor"
        );
        let mut task = self.tasks.erase(id);
        task.deinit();
    }

    /// The node identity of the task currently inside its `run` call, or
    /// `None` outside of `run`.
    pub fn this_task(&self) -> Option<NodeId> {
        self.current
    }

    /// Number of real tasks, excluding the cursor.
    pub fn size(&self) -> usize {
        self.tasks.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Removes every real task (running `deinit` on each), keeping the
    /// cursor at its current rank.
    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self
            .tasks
            .iter()
            .map(|(id, _)| id)
            .filter(|&id| id != self.cursor_id)
            .collect();
        for id in ids {
            let mut task = self.tasks.erase(id);
            task.deinit();
        }
    }

    pub fn set_idle(&mut self, idle: impl FnMut() + 'static) {
        self.idle = Some(Box::new(idle));
    }

    fn call_idle(&mut self) {
        if let Some(idle) = &mut self.idle {
            idle();
        }
    }

    /// Writes every real task's name to `sink`, separated by `sep`.
    pub fn list(&self, sink: &mut dyn fmt::Write, sep: &str) -> fmt::Result {
        let mut first = true;
        for (id, task) in self.tasks.iter() {
            if id == self.cursor_id {
                continue;
            }
            if !first {
                sink.write_str(sep)?;
            }
            sink.write_str(task.name())?;
            first = false;
        }
        Ok(())
    }

    /// Rank of the task that would run next (the cursor's successor, after
    /// normalizing wrap), or 0 if there are no real tasks.
    pub fn next_rank(&self) -> u32 {
        match self.peek_candidate() {
            Some(id) => self.tasks.get(id).rank(),
            None => 0,
        }
    }

    /// The cursor's successor without mutating anything, or `None` if the
    /// list holds only the cursor.
    fn peek_candidate(&self) -> Option<NodeId> {
        match self.tasks.next_id(self.cursor_id) {
            Some(n) => Some(n),
            None => {
                let front = self.tasks.front_id()?;
                (front != self.cursor_id).then_some(front)
            }
        }
    }

    /// Normalizes cursor wrap (moves it to the front, rank 0, once it has
    /// no real successor) and returns the next candidate task to consider
    /// for execution, or `None` if there are no real tasks at all.
    pub fn next_candidate(&mut self) -> Option<NodeId> {
        if self.tasks.next_id(self.cursor_id).is_none() {
            if self.tasks.front_id() == Some(self.cursor_id) {
                return None;
            }
            self.tasks.set_rank(self.cursor_id, 0);
            self.tasks.move_to_front(self.cursor_id);
        }
        self.tasks.next_id(self.cursor_id)
    }

    /// Invokes the idle hook. Kept separate from `next_candidate` so
    /// schedulers can decide readiness (e.g. against a tick) before
    /// choosing to idle.
    pub fn idle(&mut self) {
        self.call_idle();
    }

    /// Marks `id` as the task currently inside `run`, invokes `body`, then
    /// clears the marker. `body` is expected to call `T::run` on the task
    /// at `id`.
    pub fn with_current<R>(&mut self, id: NodeId, body: impl FnOnce(&mut Self) -> R) -> R {
        self.current = Some(id);
        let result = body(self);
        self.current = None;
        result
    }

    /// Whether `id` is still linked (used after invoking a task's `run` to
    /// decide whether post-run rank bookkeeping is safe — the task may
    /// have removed itself, and a subsequent `add_task` could have already
    /// recycled its slot for an unrelated task).
    pub fn is_linked(&self, id: NodeId) -> bool {
        self.tasks.is_linked(id)
    }

    /// Call immediately after invoking `id`'s `run`, before touching its
    /// rank. Unifies every scheduler's mid-`run` removal handling
    /// (spec.md §9 Open Question: "safety of `remove_task` mid-`run`"):
    /// first check link state, only then decide whether rank bookkeeping is
    /// safe.
    ///
    /// Returns `true` iff `id` is still linked and did not ask to be
    /// removed, in which case the caller is expected to perform its
    /// policy-specific rank update next. Returns `false` if the task is
    /// gone — either it unlinked itself mid-`run`, or it flagged
    /// [`Task::wants_removal`] and has just been unlinked and `deinit`ed
    /// here — in both cases there is nothing left to update.
    pub fn postprocess_ran_task(&mut self, id: NodeId) -> bool {
        if !self.is_linked(id) {
            return false;
        }
        if self.tasks.get(id).wants_removal() {
            self.remove_task(id);
            return false;
        }
        true
    }
}


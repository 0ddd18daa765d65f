//! Fair-share (virtual-runtime) scheduler (component F).
//!
//! Grounded on `ucosm::CFSScheduler`: rank is cumulative weighted runtime,
//! and priority scales how fast a task's rank grows (lower priority numbers
//! are favored, exactly like a Completely Fair Scheduler's `nice` value).

use alloc::boxed::Box;
use core::fmt;

use crate::frame::SchedulerFrame;
use crate::list::NodeId;
use crate::task::{Cursor, FairShareTask};

/// Priorities are clamped to `0..=MAX_PRIORITY`; priority 0 counts runtime
/// 1x, `MAX_PRIORITY` counts it `1 << MAX_PRIORITY` = 65536x, so
/// lower-priority tasks accumulate virtual runtime faster and are
/// scheduled less often.
pub const MAX_PRIORITY: u8 = 16;

/// Runs the cursor's successor on every `run` call (no tick check), then
/// charges it virtual runtime proportional to measured duration and its
/// priority.
///
/// `C` is the clock: any `FnMut() -> u32`, read once before and once after
/// `run`, mirroring `ucosm::CFSScheduler`'s `get_tick_t` constructor
/// parameter (`Δ = mGetTick() - mGetTick()` around the task call) and this
/// crate's own [`crate::schedulers::PeriodicScheduler`], which takes its
/// tick source the same way instead of reading a process-wide or OS clock.
pub struct FairShareScheduler<C: FnMut() -> u32> {
    frame: SchedulerFrame<Box<dyn FairShareTask>>,
    clock: C,
}

impl<C: FnMut() -> u32> FairShareScheduler<C> {
    pub fn new(clock: C) -> Self {
        FairShareScheduler {
            frame: SchedulerFrame::new(Box::new(Cursor::new())),
            clock,
        }
    }

    /// Links `task` at the cursor's current virtual-runtime rank, matching
    /// the base `IScheduler::addTask` behavior `ucosm::CFSScheduler`
    /// inherits (`inTask.setRank(mCursorTask.getRank())`): a newly added
    /// task starts at today's watermark rather than at `0`, so it competes
    /// fairly with tasks that have already been running instead of
    /// monopolizing the cursor's successor slot until its rank catches up.
    pub fn add_task(&mut self, task: Box<dyn FairShareTask>) -> Option<NodeId> {
        let cursor_id = self.frame.cursor_id();
        let cursor_rank = self.frame.tasks().get(cursor_id).rank();
        self.frame.add_task(task, cursor_rank)
    }

    pub fn remove_task(&mut self, id: NodeId) {
        self.frame.remove_task(id);
    }

    pub fn size(&self) -> usize {
        self.frame.size()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn clear(&mut self) {
        self.frame.clear();
    }

    pub fn set_idle(&mut self, idle: impl FnMut() + 'static) {
        self.frame.set_idle(idle);
    }

    pub fn list(&self, sink: &mut dyn fmt::Write, sep: &str) -> fmt::Result {
        self.frame.list(sink, sep)
    }

    pub fn next_rank(&self) -> u32 {
        self.frame.next_rank()
    }

    pub fn this_task(&self) -> Option<NodeId> {
        self.frame.this_task()
    }

    /// Runs the cursor's successor, charging it virtual runtime. If the
    /// list holds only the cursor, calls the idle hook instead.
    pub fn run(&mut self) {
        let Some(candidate) = self.frame.next_candidate() else {
            self.frame.idle();
            return;
        };

        let start = (self.clock)();
        self.frame.with_current(candidate, |frame| {
            frame.tasks_mut().get_mut(candidate).run();
        });
        let delta = (self.clock)().wrapping_sub(start);

        if !self.frame.postprocess_ran_task(candidate) {
            // The task removed itself (or flagged removal) mid-run; nothing
            // left to charge or reposition.
            return;
        }

        let old_rank = self.frame.tasks().get(candidate).rank();
        let priority = self
            .frame
            .tasks()
            .get(candidate)
            .priority()
            .min(MAX_PRIORITY) as u32;
        let weighted = ((delta as u64) << priority).min(u32::MAX as u64) as u32;
        let new_rank = old_rank.wrapping_add(weighted);

        if new_rank == old_rank {
            // No measurable progress (e.g. a task that returned instantly):
            // leave the cursor where it is rather than advance it past a
            // task that may not actually have made way for others.
            return;
        }

        if new_rank < old_rank {
            self.frame.tasks_mut().get_mut(candidate).set_rank(new_rank);
            self.frame.tasks_mut().move_to_front(candidate);
        } else {
            self.frame.tasks_mut().set_rank(candidate, new_rank);
        }

        let cursor_id = self.frame.cursor_id();
        self.frame.tasks_mut().get_mut(cursor_id).set_rank(new_rank);
        self.frame.tasks_mut().move_after(cursor_id, candidate);
    }
}


//! Realtime (hardware-timer-driven) scheduler (component G).
//!
//! Grounded on `ucosm::RTScheduler` / `ucosm::IRTTimer`: the scheduler binds
//! one-to-one to an external one-shot timer, which calls back into `run`
//! from its own interrupt context each time it elapses. `run` always picks
//! the cursor's successor (there is no tick check, unlike the periodic
//! policy) and rearms the timer for exactly the next-due rank.

use alloc::boxed::Box;
use core::fmt;

use crate::frame::SchedulerFrame;
use crate::list::NodeId;
use crate::task::{Cursor, PeriodicTask};

/// Hardware one-shot timer the realtime scheduler drives but does not
/// implement (spec.md §1 lists this as an external collaborator). Grounded
/// on `ucosm::IRTTimer<task_t>`.
///
/// Implementations back this with a real hardware timer peripheral; `start`
/// arms it for the duration set by the last `set_duration` call, and on
/// elapsing it must call the bound scheduler's [`RealtimeScheduler::run`]
/// from interrupt context.
pub trait OneShotTimer {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn set_duration(&mut self, duration: u32);
    fn disable_interrupts(&mut self);
    fn enable_interrupts(&mut self);
}

/// Scoped interrupt-disable guard: disables on construction, re-enables on
/// every exit path including early `?` returns. Grounded on the
/// `InterruptGuard` RAII helper in `ucosm::RTScheduler::addTask`.
struct InterruptGuard<'a, Tm: OneShotTimer> {
    timer: &'a mut Tm,
}

impl<'a, Tm: OneShotTimer> InterruptGuard<'a, Tm> {
    fn new(timer: &'a mut Tm) -> Self {
        timer.disable_interrupts();
        InterruptGuard { timer }
    }
}

impl<'a, Tm: OneShotTimer> Drop for InterruptGuard<'a, Tm> {
    fn drop(&mut self) {
        self.timer.enable_interrupts();
    }
}

/// Drives one [`OneShotTimer`] to the next-due rank of whichever periodic
/// task is due next. Unlike the plain periodic scheduler, there is no idle
/// hook: when the list is empty the timer simply stops, and the next
/// `add_task` restarts it.
pub struct RealtimeScheduler<Tm: OneShotTimer> {
    frame: SchedulerFrame<Box<dyn PeriodicTask>>,
    timer: Option<Tm>,
}

impl<Tm: OneShotTimer> RealtimeScheduler<Tm> {
    pub fn new() -> Self {
        RealtimeScheduler {
            frame: SchedulerFrame::new(Box::new(Cursor::new())),
            timer: None,
        }
    }

    /// Binds `timer` to this scheduler. Fails (returns `false`, leaving
    /// `timer` unbound) if a timer is already bound — the one-to-one
    /// relationship `ucosm::IRTTimer::setTask` enforces on its side.
    pub fn set_timer(&mut self, timer: Tm) -> bool {
        if self.timer.is_some() {
            return false;
        }
        self.timer = Some(timer);
        true
    }

    /// Links `task` with its rank set to `cursor.rank + delay`, i.e. delays
    /// are relative to the scheduler's current execution position rather
    /// than to the task's own period. Fails if `task.period() == 0`, if no
    /// timer is bound yet, or if `task.init()` refuses the addition. List
    /// mutation is bracketed in the timer's interrupt-disable scope so a
    /// concurrent ISR firing never observes a half-linked node.
    pub fn add_task(&mut self, task: Box<dyn PeriodicTask>, delay: u32) -> Option<NodeId> {
        if task.period() == 0 || self.timer.is_none() {
            return None;
        }

        let mut guard = InterruptGuard::new(self.timer.as_mut().expect("checked above"));

        let cursor_id = self.frame.cursor_id();
        let cursor_rank = self.frame.tasks().get(cursor_id).rank();
        let id = self.frame.add_task(task, cursor_rank)?;
        if delay != 0 {
            self.frame
                .tasks_mut()
                .set_rank(id, cursor_rank.wrapping_add(delay));
        }

        if !guard.timer.is_running() {
            guard.timer.set_duration(0);
            guard.timer.start();
        }
        Some(id)
    }

    pub fn remove_task(&mut self, id: NodeId) {
        if let Some(timer) = self.timer.as_mut() {
            let _guard = InterruptGuard::new(timer);
            self.frame.remove_task(id);
        } else {
            self.frame.remove_task(id);
        }
    }

    pub fn size(&self) -> usize {
        self.frame.size()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
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

    pub fn timer(&self) -> Option<&Tm> {
        self.timer.as_ref()
    }

    /// Timer ISR entry point: runs the cursor's successor unconditionally,
    /// then rearms the timer for the next-due rank (or stops it if the list
    /// is now empty). Grounded on `ucosm::RTScheduler::run`.
    ///
    /// # Panics
    /// Panics if called before a timer is bound — the timer is the only
    /// caller of this method in the realtime policy's intended use, so an
    /// unbound call indicates a wiring bug rather than a runtime condition
    /// to recover from.
    pub fn run(&mut self) {
        let timer = self
            .timer
            .as_mut()
            .expect("realtime scheduler: run: no timer bound");

        let Some(candidate) = self.frame.next_candidate() else {
            timer.stop();
            return;
        };

        let task_rank = self.frame.tasks().get(candidate).rank();
        let task_period = self.frame.tasks().get(candidate).period();

        let cursor_id = self.frame.cursor_id();
        self.frame.tasks_mut().set_rank(cursor_id, task_rank);

        self.frame.with_current(candidate, |frame| {
            frame.tasks_mut().get_mut(candidate).run();
        });

        if self.frame.postprocess_ran_task(candidate) {
            let new_rank = task_rank.wrapping_add(task_period);
            if new_rank < task_rank {
                self.frame.tasks_mut().get_mut(candidate).set_rank(new_rank);
                self.frame.tasks_mut().move_to_front(candidate);
            } else {
                self.frame.tasks_mut().set_rank(candidate, new_rank);
            }
        }

        let timer = self.timer.as_mut().expect("bound above");
        if self.frame.is_empty() {
            timer.stop();
            return;
        }
        let next = self.frame.next_rank();
        timer.set_duration(next.wrapping_sub(task_rank));
    }
}

impl<Tm: OneShotTimer> Default for RealtimeScheduler<Tm> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tm: OneShotTimer> Drop for RealtimeScheduler<Tm> {
    /// Stops the bound timer, matching `ucosm::RTScheduler`'s destructor.
    fn drop(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.stop();
        }
    }
}

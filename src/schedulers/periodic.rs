//! Periodic (time-driven) scheduler (component E).
//!
//! Grounded on `ucosm::PeriodicScheduler`/`ucosm::IPeriodicTask`: rank is
//! the next-due tick, and the wrap-aware readiness check tolerates the tick
//! source overflowing its 32-bit range.

use alloc::boxed::Box;
use core::fmt;

use crate::frame::SchedulerFrame;
use crate::list::NodeId;
use crate::task::{Cursor, PeriodicTask};

/// Runs at most one task per [`PeriodicScheduler::run`] call, selecting
/// whichever due task sits closest past the cursor.
///
/// `F` is the tick source: any `FnMut() -> u32`, following the design note
/// that the tick function should be passed explicitly into each scheduler
/// rather than read from process-wide state.
pub struct PeriodicScheduler<F: FnMut() -> u32> {
    frame: SchedulerFrame<Box<dyn PeriodicTask>>,
    tick: F,
}

impl<F: FnMut() -> u32> PeriodicScheduler<F> {
    pub fn new(tick: F) -> Self {
        PeriodicScheduler {
            frame: SchedulerFrame::new(Box::new(Cursor::new())),
            tick,
        }
    }

    /// Links `task`, giving it an initial rank equal to the current tick
    /// (so it is eligible to run on the very next `run` call). Returns
    /// `None` if the task's `init` hook refused the addition.
    pub fn add_task(&mut self, task: Box<dyn PeriodicTask>) -> Option<NodeId> {
        let now = (self.tick)();
        self.frame.add_task(task, now)
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

    /// Selects and runs at most one due task. Calls the idle hook (if set)
    /// and returns without running anything if the cursor's successor is
    /// not yet due, or if the list holds only the cursor.
    pub fn run(&mut self) {
        let Some(candidate) = self.frame.next_candidate() else {
            self.frame.idle();
            return;
        };

        let cursor_id = self.frame.cursor_id();
        let cursor_rank = self.frame.tasks().get(cursor_id).rank();
        let n_rank = self.frame.tasks().get(candidate).rank();
        let t = (self.tick)();

        // Wrap-aware: T - cursor.rank >= N.rank - cursor.rank, under
        // unsigned arithmetic, so this stays correct across tick overflow.
        let ready = t.wrapping_sub(cursor_rank) >= n_rank.wrapping_sub(cursor_rank);
        if !ready {
            self.frame.idle();
            return;
        }

        self.frame.tasks_mut().set_rank(cursor_id, n_rank);
        self.frame.with_current(candidate, |frame| {
            frame.tasks_mut().get_mut(candidate).run();
        });

        if self.frame.postprocess_ran_task(candidate) {
            let period = self.frame.tasks().get(candidate).period();
            let new_rank = t.wrapping_add(period);
            if new_rank < t {
                // Overflow: the next-due tick wrapped past zero. Force the
                // task to the front regardless of where a plain numeric
                // comparison would have walked it, so the next wrap-aware
                // readiness check finds it ahead of everything else.
                self.frame.tasks_mut().get_mut(candidate).set_rank(new_rank);
                self.frame.tasks_mut().move_to_front(candidate);
            } else {
                self.frame.tasks_mut().set_rank(candidate, new_rank);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted {
        rank: u32,
        period: u32,
        runs: Rc<Cell<u32>>,
    }

    impl Task for Counted {
        fn run(&mut self) {
            self.runs.set(self.runs.get() + 1);
        }
    }
    impl crate::task::RankedTask for Counted {
        fn rank(&self) -> u32 {
            self.rank
        }
        fn set_rank(&mut self, rank: u32) {
            self.rank = rank;
        }
    }
    impl PeriodicTask for Counted {
        fn period(&self) -> u32 {
            self.period
        }
        fn set_period(&mut self, p: u32) {
            self.period = p;
        }
    }

    #[test]
    fn round_robin_fairness_over_1000_ticks() {
        let tick = Rc::new(Cell::new(0u32));
        let t = tick.clone();
        let mut sched = PeriodicScheduler::new(move || t.get());

        let runs_a = Rc::new(Cell::new(0u32));
        let runs_b = Rc::new(Cell::new(0u32));
        sched.add_task(Box::new(Counted {
            rank: 0,
            period: 100,
            runs: runs_a.clone(),
        }));
        sched.add_task(Box::new(Counted {
            rank: 0,
            period: 100,
            runs: runs_b.clone(),
        }));

        for _ in 0..1000 {
            tick.set(tick.get() + 1);
            sched.run();
        }

        assert!((9..=11).contains(&runs_a.get()), "a ran {}", runs_a.get());
        assert!((9..=11).contains(&runs_b.get()), "b ran {}", runs_b.get());
    }

    #[test]
    fn delay_ordering_runs_earliest_deadline_first() {
        let tick = Rc::new(Cell::new(0u32));
        let t = tick.clone();
        let mut sched = PeriodicScheduler::new(move || t.get());

        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        struct Tagged {
            tag: &'static str,
            rank: u32,
            order: Rc<std::cell::RefCell<Vec<&'static str>>>,
        }
        impl Task for Tagged {
            fn run(&mut self) {
                self.order.borrow_mut().push(self.tag);
            }
        }
        impl crate::task::RankedTask for Tagged {
            fn rank(&self) -> u32 {
                self.rank
            }
            fn set_rank(&mut self, r: u32) {
                self.rank = r;
            }
        }
        impl PeriodicTask for Tagged {
            fn period(&self) -> u32 {
                // Large enough that none of these refire within the
                // 10-tick window this test runs for.
                1_000
            }
            fn set_period(&mut self, _: u32) {}
        }

        // Delays 5, 2, 8 from tick 0 map to explicit ranks, since this test
        // exercises ordering directly rather than a delay-relative API.
        let five = Box::new(Tagged {
            tag: "delay-5",
            rank: 0,
            order: order.clone(),
        });
        let two = Box::new(Tagged {
            tag: "delay-2",
            rank: 0,
            order: order.clone(),
        });
        let eight = Box::new(Tagged {
            tag: "delay-8",
            rank: 0,
            order: order.clone(),
        });
        let id5 = sched.add_task(five).unwrap();
        let id2 = sched.add_task(two).unwrap();
        let id8 = sched.add_task(eight).unwrap();
        sched.frame.tasks_mut().set_rank(id5, 5);
        sched.frame.tasks_mut().set_rank(id2, 2);
        sched.frame.tasks_mut().set_rank(id8, 8);

        for _ in 0..10 {
            tick.set(tick.get() + 1);
            sched.run();
        }

        assert_eq!(*order.borrow(), vec!["delay-2", "delay-5", "delay-8"]);
    }
}

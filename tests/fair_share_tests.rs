use rankos::{FairShareScheduler, FairShareTask, RankedTask, Task};
use std::cell::Cell;
use std::rc::Rc;

// The clock is simulated rather than read from the OS: each task advances a
// shared tick counter by a fixed amount in its own `run`, and the
// scheduler's injected clock reads that same counter. This keeps the
// fairness ratio exact instead of dependent on real wall-clock jitter.
struct Spin {
    rank: u32,
    priority: u8,
    runs: Rc<Cell<u32>>,
    busy_ticks: u32,
    clock: Rc<Cell<u32>>,
}

impl Task for Spin {
    fn run(&mut self) {
        self.clock.set(self.clock.get() + self.busy_ticks);
        self.runs.set(self.runs.get() + 1);
    }
}
impl RankedTask for Spin {
    fn rank(&self) -> u32 {
        self.rank
    }
    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}
impl FairShareTask for Spin {
    fn priority(&self) -> u8 {
        self.priority
    }
}

#[test]
fn higher_priority_number_runs_less_often() {
    let clock = Rc::new(Cell::new(0u32));
    let c = clock.clone();
    let mut sched = FairShareScheduler::new(move || c.get());
    let runs_hi = Rc::new(Cell::new(0u32));
    let runs_lo = Rc::new(Cell::new(0u32));
    sched.add_task(Box::new(Spin {
        rank: 0,
        priority: 0,
        runs: runs_hi.clone(),
        busy_ticks: 50,
        clock: clock.clone(),
    }));
    sched.add_task(Box::new(Spin {
        rank: 0,
        priority: 2,
        runs: runs_lo.clone(),
        busy_ticks: 50,
        clock: clock.clone(),
    }));

    for _ in 0..1_000 {
        sched.run();
    }

    // Priority 0 counts ticks 1x, priority 2 counts them 4x, so the two
    // tasks' virtual runtimes stay in lockstep only if the priority-0 task
    // runs roughly 4x as often as the priority-2 one (spec.md §8 scenario
    // 3: "measured ratio within ±10%").
    let ratio = runs_hi.get() as f64 / runs_lo.get() as f64;
    assert!(
        (3.5..=4.5).contains(&ratio),
        "expected ~4x ratio, got {} (hi={}, lo={})",
        ratio,
        runs_hi.get(),
        runs_lo.get()
    );
}

#[test]
fn add_task_does_not_starve_existing_tasks() {
    let clock = Rc::new(Cell::new(0u32));
    let c = clock.clone();
    let mut sched = FairShareScheduler::new(move || c.get());
    let runs_first = Rc::new(Cell::new(0u32));

    // Run one long-lived task for a while so its (and the cursor's) rank
    // climbs well above zero.
    sched.add_task(Box::new(Spin {
        rank: 0,
        priority: 0,
        runs: runs_first.clone(),
        busy_ticks: 100,
        clock: clock.clone(),
    }));
    for _ in 0..20 {
        sched.run();
    }
    assert_eq!(runs_first.get(), 20);

    // A newly added task seeded at the cursor's watermark competes on equal
    // footing with the existing one; seeded at 0 instead, it would
    // monopolize every subsequent `run` until its rank caught up (tens of
    // calls away at this point), starving `first` completely.
    let runs_second = Rc::new(Cell::new(0u32));
    sched.add_task(Box::new(Spin {
        rank: 0,
        priority: 0,
        runs: runs_second.clone(),
        busy_ticks: 100,
        clock: clock.clone(),
    }));
    for _ in 0..5 {
        sched.run();
    }
    assert!(runs_first.get() > 20, "existing task must keep making progress");
    assert!(runs_second.get() > 0);
}

#[test]
fn self_removal_mid_run_skips_rank_update() {
    struct SelfRemoving {
        rank: u32,
    }
    impl Task for SelfRemoving {
        fn run(&mut self) {}
    }
    impl RankedTask for SelfRemoving {
        fn rank(&self) -> u32 {
            self.rank
        }
        fn set_rank(&mut self, rank: u32) {
            self.rank = rank;
        }
    }
    impl FairShareTask for SelfRemoving {
        fn priority(&self) -> u8 {
            0
        }
    }

    let mut sched = FairShareScheduler::new(|| 0);
    let id = sched.add_task(Box::new(SelfRemoving { rank: 0 })).unwrap();
    sched.remove_task(id);
    assert!(sched.is_empty());
    // run() on an empty list must not panic; it calls the idle hook.
    sched.run();
}

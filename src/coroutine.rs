//! Coroutine/thread task: true stack-preserving suspension (component I).
//!
//! Grounded on `ucosm::IThread`/`ucosm::ThreadScheduler`, which save a live
//! stack across a yield by `setjmp`/`longjmp` plus a manual `memcpy` of the
//! in-use stack window into a per-task buffer. Stable Rust has no safe
//! `setjmp`/`longjmp` equivalent, so this module takes the alternative
//! spec.md §9 explicitly sanctions for an implementation lacking that
//! primitive: "allocate a dedicated stack per coroutine and use a proper
//! context switch." Each [`CoroutineTask`] runs its body on a dedicated OS
//! thread with a bounded rendezvous channel pair; the OS scheduler, not a
//! `memcpy`, is what preserves the live stack across a yield — the
//! `start`/`end`/`usage` stack-window bookkeeping in the original has no
//! counterpart here because there is nothing to copy.
//!
//! Because [`CoroutineTask`] ends up with the same rank/period shape as
//! [`crate::task::PeriodicTask`] and the same cursor-successor-plus-
//! readiness-check selection spec.md §4.I describes (identical in spirit to
//! §4.E's), it is scheduled by the existing
//! [`crate::schedulers::PeriodicScheduler`] rather than a second,
//! near-duplicate scheduler type — a Rust-side simplification of
//! `ucosm::ThreadScheduler`, which only exists as its own struct because
//! `IThread` isn't literally an `IPeriodicTask` in the C++ type hierarchy.

extern crate std;

use std::boxed::Box;
use std::panic;
use std::string::ToString;
use std::sync::mpsc;
use std::sync::Once;
use std::thread::{self, JoinHandle};

use crate::task::{PeriodicTask, RankedTask, Task};

/// Default dedicated-thread stack size, matching the original's default
/// 1 KiB private stack buffer (spec.md §6 Configuration).
pub const DEFAULT_STACK: usize = 1024;

/// Marker payload for a deliberate cancellation unwind, distinguished from
/// a genuine panic in the coroutine body so [`CoroutineTask::drop`] can
/// reclaim a suspended thread without that unwind looking like a crash.
struct Cancelled;

static QUIET_CANCEL_HOOK: Once = Once::new();

/// Installs a panic hook (once, process-wide) that swallows the
/// cancellation unwind's default "thread panicked" message but forwards
/// every other panic to the previously installed hook unchanged.
fn install_quiet_cancel_hook() {
    QUIET_CANCEL_HOOK.call_once(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if info.payload().downcast_ref::<Cancelled>().is_some() {
                return;
            }
            default_hook(info);
        }));
    });
}

enum ToScheduler {
    /// The coroutine suspended itself for `ticks` ticks.
    Suspended(u32),
    /// The coroutine body returned normally.
    Finished,
}

enum ToCoroutine {
    Resume,
    Cancel,
}

/// Handle a coroutine body uses to suspend itself. Passed by reference into
/// the closure given to [`CoroutineTask::new`].
pub struct CoroutineHandle {
    to_scheduler: mpsc::Sender<ToScheduler>,
    from_scheduler: mpsc::Receiver<ToCoroutine>,
}

impl CoroutineHandle {
    /// Suspends the calling coroutine, to be resumed no earlier than
    /// `ticks` ticks from now. Grounded on `ThreadScheduler::sleepFor`:
    /// blocks the dedicated thread until the scheduler's `run` decides to
    /// resume it, with every local variable on this thread's stack intact
    /// across the call.
    pub fn sleep_for(&self, ticks: u32) {
        if self.to_scheduler.send(ToScheduler::Suspended(ticks)).is_err() {
            panic::panic_any(Cancelled);
        }
        match self.from_scheduler.recv() {
            Ok(ToCoroutine::Resume) => {}
            _ => panic::panic_any(Cancelled),
        }
    }

    /// `sleep_for(1)`: suspends for exactly one tick. Grounded on
    /// `ThreadScheduler::yield`, which sleeps for one tick rather than
    /// zero (unlike the resumable task's `YIELD`, which is `WAIT(0)`).
    pub fn yield_now(&self) {
        self.sleep_for(1);
    }
}

/// A task whose body runs on a dedicated OS thread and can suspend
/// mid-expression via [`CoroutineHandle::sleep_for`]/[`CoroutineHandle::yield_now`],
/// with its full call stack preserved across the suspension. `STACK` sizes
/// the dedicated thread's stack in bytes (spec.md §6 Configuration; default
/// [`DEFAULT_STACK`]).
pub struct CoroutineTask<const STACK: usize = DEFAULT_STACK> {
    rank: u32,
    period: u32,
    name: &'static str,
    body: Option<Box<dyn FnOnce(&CoroutineHandle) + Send>>,
    thread: Option<JoinHandle<()>>,
    to_coroutine: Option<mpsc::Sender<ToCoroutine>>,
    from_coroutine: Option<mpsc::Receiver<ToScheduler>>,
    finished: bool,
}

impl<const STACK: usize> CoroutineTask<STACK> {
    pub fn new(name: &'static str, body: impl FnOnce(&CoroutineHandle) + Send + 'static) -> Self {
        CoroutineTask {
            rank: 0,
            period: 0,
            name,
            body: Some(Box::new(body)),
            thread: None,
            to_coroutine: None,
            from_coroutine: None,
            finished: false,
        }
    }

    /// Whether the body has returned (normally or via a caught
    /// cancellation) and the task is ready to be dropped from its
    /// scheduler.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn start(&mut self) {
        install_quiet_cancel_hook();
        let (to_coro_tx, to_coro_rx) = mpsc::channel();
        let (to_sched_tx, to_sched_rx) = mpsc::channel();
        let body = self
            .body
            .take()
            .expect("coroutine task: start: body already consumed");
        let handle = CoroutineHandle {
            to_scheduler: to_sched_tx.clone(),
            from_scheduler: to_coro_rx,
        };

        let join = thread::Builder::new()
            .name(self.name.to_string())
            .stack_size(STACK)
            .spawn(move || match panic::catch_unwind(panic::AssertUnwindSafe(|| body(&handle))) {
                Ok(()) => {
                    let _ = to_sched_tx.send(ToScheduler::Finished);
                }
                Err(payload) => {
                    if payload.downcast_ref::<Cancelled>().is_none() {
                        panic::resume_unwind(payload);
                    }
                }
            })
            .expect("coroutine task: start: failed to spawn dedicated thread");

        self.thread = Some(join);
        self.to_coroutine = Some(to_coro_tx);
        self.from_coroutine = Some(to_sched_rx);
    }
}

impl<const STACK: usize> Task for CoroutineTask<STACK> {
    /// First call spawns the dedicated thread and runs the body from its
    /// top; every later call resumes it past its last
    /// `sleep_for`/`yield_now`. Either way, blocks until the coroutine next
    /// suspends or returns, recording its requested period (or flagging it
    /// finished) for the caller.
    fn run(&mut self) {
        if self.thread.is_none() {
            self.start();
        } else {
            let _ = self
                .to_coroutine
                .as_ref()
                .expect("thread started implies channel set")
                .send(ToCoroutine::Resume);
        }

        match self
            .from_coroutine
            .as_ref()
            .expect("thread started implies channel set")
            .recv()
        {
            Ok(ToScheduler::Suspended(ticks)) => {
                self.period = ticks;
            }
            Ok(ToScheduler::Finished) | Err(_) => {
                self.finished = true;
                self.period = 0;
            }
        }
    }

    fn name(&self) -> &str {
        self.name
    }

    fn wants_removal(&self) -> bool {
        self.finished
    }
}

impl<const STACK: usize> RankedTask for CoroutineTask<STACK> {
    fn rank(&self) -> u32 {
        self.rank
    }
    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}

impl<const STACK: usize> PeriodicTask for CoroutineTask<STACK> {
    fn period(&self) -> u32 {
        self.period
    }
    fn set_period(&mut self, period: u32) {
        self.period = period;
    }
}

impl<const STACK: usize> Drop for CoroutineTask<STACK> {
    /// Reclaims a thread suspended mid-body: a finished thread has already
    /// exited on its own, but one still waiting inside `sleep_for` is
    /// cancelled via [`Cancelled`] so it unwinds instead of leaking.
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            if !self.finished {
                if let Some(tx) = self.to_coroutine.take() {
                    let _ = tx.send(ToCoroutine::Cancel);
                }
            }
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulers::PeriodicScheduler;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Scenario 5 (spec.md §8): a coroutine sets a local, yields, and must
    /// see the same value on resume even after other coroutines ran in
    /// between and mutated their own locals.
    #[test]
    fn locals_survive_a_yield_across_other_coroutines_running() {
        let observed: Arc<Mutex<Option<i32>>> = Arc::new(Mutex::new(None));
        let obs = observed.clone();

        let tick = Rc::new(std::cell::Cell::new(0u32));
        let t = tick.clone();
        let mut sched = PeriodicScheduler::new(move || t.get());

        let target: CoroutineTask = CoroutineTask::new("target", move |h: &CoroutineHandle| {
            let x = 42;
            h.yield_now();
            *obs.lock().unwrap() = Some(x);
        });
        sched.add_task(Box::new(target));

        // Three other coroutines that each carry their own distinct local
        // and yield once, interleaved with the target via round-robin.
        for i in 0..3 {
            let other: CoroutineTask = CoroutineTask::new("other", move |h: &CoroutineHandle| {
                let local = i * 1000;
                h.yield_now();
                assert_eq!(local, i * 1000);
            });
            sched.add_task(Box::new(other));
        }

        // Four tasks, one tick each: every task gets its first run (and
        // yields), then a second pass resumes each past its yield point.
        for _ in 0..8 {
            tick.set(tick.get() + 1);
            sched.run();
            // Coroutine threads rendezvous synchronously inside `run`, so
            // no extra wait is needed between scheduler ticks.
        }

        assert_eq!(*observed.lock().unwrap(), Some(42));
    }

    #[test]
    fn finished_coroutine_flags_itself_for_removal() {
        let tick = Rc::new(std::cell::Cell::new(0u32));
        let t = tick.clone();
        let mut sched = PeriodicScheduler::new(move || t.get());

        let ran = Arc::new(Mutex::new(false));
        let r = ran.clone();
        let task: CoroutineTask = CoroutineTask::new("quick", move |_h| {
            *r.lock().unwrap() = true;
        });
        sched.add_task(Box::new(task));

        sched.run();
        assert!(*ran.lock().unwrap());
        assert!(sched.is_empty());
    }

    #[test]
    fn sleep_for_defers_resume_until_requested_ticks_elapse() {
        let tick = Rc::new(std::cell::Cell::new(0u32));
        let t = tick.clone();
        let mut sched = PeriodicScheduler::new(move || t.get());

        let resumed_at = Arc::new(Mutex::new(None));
        let r = resumed_at.clone();
        let target: CoroutineTask = CoroutineTask::new("sleeper", move |h: &CoroutineHandle| {
            h.sleep_for(50);
            // No independent clock inside the coroutine thread; the
            // scheduler's own tick source is the source of truth, checked
            // from the test after this closure returns.
            *r.lock().unwrap() = Some(());
        });
        sched.add_task(Box::new(target));

        sched.run(); // first run: reaches sleep_for(50), suspends
        assert!(resumed_at.lock().unwrap().is_none());

        for _ in 0..49 {
            tick.set(tick.get() + 1);
            sched.run();
        }
        assert!(
            resumed_at.lock().unwrap().is_none(),
            "must not resume before the requested 50 ticks elapse"
        );

        tick.set(tick.get() + 1);
        sched.run();
        assert!(resumed_at.lock().unwrap().is_some());
    }

    #[test]
    fn dropping_a_suspended_coroutine_reclaims_its_thread() {
        // A cancellation-triggered panic is expected on the dedicated
        // thread; the quiet-cancel hook installed by the task itself keeps
        // this from printing, but give the thread a moment to actually
        // unwind before the test process exits.
        let entered = Arc::new((Mutex::new(false), std::sync::Condvar::new()));
        let e = entered.clone();
        let task: CoroutineTask = CoroutineTask::new("stuck", move |h: &CoroutineHandle| {
            {
                let (lock, cvar) = &*e;
                *lock.lock().unwrap() = true;
                cvar.notify_all();
            }
            h.sleep_for(u32::MAX);
        });

        let mut owned = Some(task);
        let tick = Rc::new(std::cell::Cell::new(0u32));
        let t = tick.clone();
        let mut sched = PeriodicScheduler::new(move || t.get());
        sched.add_task(Box::new(owned.take().unwrap()));
        sched.run();

        let (lock, cvar) = &*entered;
        let guard = lock.lock().unwrap();
        let _ = cvar.wait_timeout_while(guard, Duration::from_secs(1), |started| !*started);
        // Dropping the scheduler drops the still-suspended CoroutineTask,
        // which must join its thread rather than hang the test process.
        drop(sched);
    }
}

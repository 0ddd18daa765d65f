//! Resumable task: macro/state-based re-entry on top of a periodic task
//! (component H).
//!
//! Grounded on `ucosm::IResumableTask` and its `UCOSM_START`/`UCOSM_WAIT`/
//! `UCOSM_YIELD`/`UCOSM_WAIT_UNTIL`/`UCOSM_RESTART`/`UCOSM_END` macros. The
//! original builds a `switch` on the continuation line where each macro
//! closes the previous `case` with a `return` and opens the next one,
//! relying on C's case-label fallthrough purely as a textual convenience —
//! every entered case always ends in a `return` before reaching the next
//! label, so no case body ever actually falls into another at runtime.
//! That means the whole thing is already, behaviorally, a plain dispatch
//! on an integer state with exactly one arm executing per call — which is
//! just a Rust `match`. `resumable_start!` below takes the arms as a
//! `pattern => block` list and wraps them in that `match`, and the step
//! macros (`wait_ticks!`, `yield_now!`, `wait_until!`, `restart_task!`,
//! `end_task!`) are plain balanced-token helper macros, not an attempt to
//! reproduce C's unbalanced-brace trick (which `macro_rules!` cannot
//! express; per spec §9's design note, a macro-neutral structured
//! rendering is exactly what a non-C-preprocessor implementation should
//! use instead).

use crate::task::PeriodicTask;

/// Sentinel continuation line for a task that has never started (or has
/// just `RESTART`ed/`END`ed).
pub const INITIAL_LINE: i32 = -1;

/// Capability a resumable task's carrier type provides: a place to store
/// the continuation line, and a way to flag itself for removal when `END`
/// runs or the line is found corrupted. `request_removal` is mutually
/// exclusive with the normal post-run rank update — after `run` returns,
/// the caller is expected to check [`crate::task::Task::wants_removal`],
/// not this trait directly, matching every other scheduler's uniform
/// "check `wants_removal` before touching rank" handling (spec.md §9 Open
/// Question: "safety of `remove_task` mid-`run`").
pub trait Resumable: PeriodicTask {
    fn line(&self) -> i32;
    fn set_line(&mut self, line: i32);
    fn request_removal(&mut self);
}

/// Plain-data continuation state a resumable task embeds as a field and
/// delegates [`Resumable`]'s methods to, rather than hand-rolling the line
/// and removal-flag bookkeeping on every task type.
#[derive(Debug, Clone, Copy)]
pub struct ResumableState {
    line: i32,
    removal_requested: bool,
}

impl ResumableState {
    pub fn new() -> Self {
        ResumableState {
            line: INITIAL_LINE,
            removal_requested: false,
        }
    }

    pub fn line(&self) -> i32 {
        self.line
    }

    pub fn set_line(&mut self, line: i32) {
        self.line = line;
    }

    pub fn request_removal(&mut self) {
        self.removal_requested = true;
    }

    /// Read by the implementing task's `Task::wants_removal`.
    pub fn removal_requested(&self) -> bool {
        self.removal_requested
    }
}

impl Default for ResumableState {
    fn default() -> Self {
        Self::new()
    }
}

/// Opens a resumable task's `run` body: dispatches on the stored
/// continuation line to exactly one of the given `pattern => { body }`
/// arms. Must be the only statement in `run`, immediately wrapping the
/// task's full set of continuation points. Grounded on `UCOSM_START`.
///
/// Before entering the matched arm, the task's period is reset to `0`.
/// This mirrors `UCOSM_WAIT`'s expansion, which closes the previous case
/// with `setPeriod(tick)` and opens the next one with `setPeriod(0)` as its
/// first statement: a resumed arm's "natural" scheduling interval is "run
/// again next tick" unless it explicitly calls `wait_ticks!`/`yield_now!`/
/// `wait_until!` again (spec.md §4.H: "The next scheduler dispatch will
/// enter at this point with period cleared to 0").
///
/// Invariant R1 (spec.md §4.H safety): if the stored line matches none of
/// the given patterns, the task flags itself for removal via
/// [`Resumable::request_removal`] instead of dispatching indeterminately.
/// Always include an arm for [`INITIAL_LINE`] — there is no implicit one.
#[macro_export]
macro_rules! resumable_start {
    ($self:expr, { $($state:pat => $body:block),+ $(,)? }) => {
        match $crate::resumable::Resumable::line($self) {
            $($state => {
                $crate::task::PeriodicTask::set_period($self, 0);
                $body
            }),+,
            _ => {
                $crate::resumable::Resumable::set_line($self, $crate::resumable::INITIAL_LINE);
                $crate::resumable::Resumable::request_removal($self);
                return;
            }
        }
    };
}

/// Suspends the task for `ticks`, to be resumed at the arm labelled
/// `line`. Grounded on `UCOSM_WAIT`: sets the task's period so the
/// enclosing periodic scheduler reschedules it `ticks` ticks from now,
/// records the resume point, and returns out of `run`.
#[macro_export]
macro_rules! wait_ticks {
    ($self:expr, $ticks:expr, $line:expr) => {{
        $crate::task::PeriodicTask::set_period($self, $ticks);
        $crate::resumable::Resumable::set_line($self, $line);
        return;
    }};
}

/// `WAIT(0)`: yields for exactly one scheduler pass. Grounded on
/// `UCOSM_YIELD`.
#[macro_export]
macro_rules! yield_now {
    ($self:expr, $line:expr) => {
        $crate::wait_ticks!($self, 0, $line)
    };
}

/// Re-tests `cond` every call; while false, re-suspends for `check` ticks
/// at the same `line` so the same test runs again next time. Once `cond`
/// holds, execution falls through to whatever follows in the same arm.
/// Grounded on `UCOSM_WAIT_UNTIL`.
#[macro_export]
macro_rules! wait_until {
    ($self:expr, $cond:expr, $check:expr, $line:expr) => {
        if !($cond) {
            $crate::wait_ticks!($self, $check, $line);
        }
    };
}

/// Resets the continuation line to [`INITIAL_LINE`] and returns, without
/// removing the task — the next `run` call re-enters at the top. Grounded
/// on `UCOSM_RESTART`.
#[macro_export]
macro_rules! restart_task {
    ($self:expr) => {{
        $crate::resumable::Resumable::set_line($self, $crate::resumable::INITIAL_LINE);
        return;
    }};
}

/// Resets the continuation line, flags the task for removal, and returns.
/// Grounded on `UCOSM_END`.
#[macro_export]
macro_rules! end_task {
    ($self:expr) => {{
        $crate::resumable::Resumable::set_line($self, $crate::resumable::INITIAL_LINE);
        $crate::resumable::Resumable::request_removal($self);
        return;
    }};
}

//! `rankos`: a family of cooperative, single-threaded task schedulers
//! sharing one rank-sorted task substrate.
//!
//! Four scheduler policies are built on the same [`frame::SchedulerFrame`] +
//! [`rank_list::RankSortedList`] core (components A-D):
//!
//! - [`schedulers::PeriodicScheduler`] — rank is the next-due tick.
//! - [`schedulers::FairShareScheduler`] — rank is cumulative weighted
//!   virtual runtime.
//! - [`schedulers::RealtimeScheduler`] — drives an external one-shot
//!   hardware timer to the next-due rank.
//!
//! Two constructs turn an ordinary task into a suspendable one:
//! [`resumable`] (label-based re-entry, no live stack) and [`coroutine`]
//! (true stack-preserving suspension). [`ipc`] holds the lock-free
//! primitives used to pass data between tasks under the realtime variant.
//!
//! Like the teacher crate, this crate is `#![no_std]` plus `alloc`: the
//! task-ordering core (components A-H) and the IPC primitives (component J)
//! never need an allocating OS underneath them. The one exception is the
//! [`coroutine`] module (component I), which suspends a task by running its
//! body on a dedicated OS thread — that needs a real host and is only
//! compiled in with the default `std` feature (see that module's docs).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[cfg(feature = "std")]
pub mod coroutine;
pub mod frame;
pub mod ipc;
pub mod list;
pub mod rank_list;
pub mod resumable;
pub mod schedulers;
pub mod task;

pub use frame::SchedulerFrame;
pub use schedulers::{FairShareScheduler, OneShotTimer, PeriodicScheduler, RealtimeScheduler};
pub use task::{Cursor, FairShareTask, PeriodicTask, RankedTask, Task};

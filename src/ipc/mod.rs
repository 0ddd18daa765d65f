//! RT IPC primitives (component J).
//!
//! These three types are the only inter-task communication constructs this
//! crate considers safe to call from both a scheduler's normal `run`
//! context and the realtime scheduler's interrupt context (§5 "Shared
//! resources"): a lock-free SPSC ring queue, a versioned shared variable,
//! and an event-flags word. None of them allocate, block, or take a lock;
//! all of them are built on plain atomics.
//!
//! [`versioned::VersionedVar`] and [`event_flags::EventFlags`] use
//! `portable-atomic` rather than `core::sync::atomic` so that the
//! versioned variable's payload type is not restricted to the handful of
//! widths `core` gives native atomics for, and so both types keep working
//! on targets whose native atomics are narrower than 32 bits (`portable-atomic`
//! falls back to a critical-section emulation there). [`spsc::SpscQueue`]
//! only ever needs `usize` head/tail indices, which `core::sync::atomic`
//! already covers on every realistic host, so it stays on `core`.

pub mod event_flags;
pub mod spsc;
pub mod versioned;

pub use event_flags::EventFlags;
pub use spsc::SpscQueue;
pub use versioned::VersionedVar;

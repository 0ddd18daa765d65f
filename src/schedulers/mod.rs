//! The three scheduler policies (components E, F, G), all built on
//! [`crate::frame::SchedulerFrame`] and [`crate::rank_list::RankSortedList`].

pub mod fair_share;
pub mod periodic;
pub mod realtime;

pub use fair_share::FairShareScheduler;
pub use periodic::PeriodicScheduler;
pub use realtime::{OneShotTimer, RealtimeScheduler};

//! Timer synchronization: availability state, polling and status line

pub mod scheduler;
pub mod service;
pub mod status_line;

pub use scheduler::PeriodicTask;
pub use service::TimerSynchronizer;
pub use status_line::{truncate_title, StatusLineView};

//! Commands - frontend to backend bridge

mod reports;
mod status;
mod timer;

pub use reports::*;
pub use status::*;
pub use timer::*;

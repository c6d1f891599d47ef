//! Session activity logging and tracing subscriber setup

mod logger;
mod subscriber;
pub mod types;

pub use logger::ActivityLogger;
pub use subscriber::init_logger;
pub use types::{ActivityLog, ActivityStatus, ActivityType};

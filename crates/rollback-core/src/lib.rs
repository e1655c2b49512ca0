pub mod clock;
pub mod config;
pub mod error;
pub mod observation;
pub mod remediation;
pub mod tracker;

pub use config::{RevertMode, RollbackConfig};
pub use error::{Result, RollbackError};
pub use observation::{Deployment, Observation};
pub use tracker::DebounceTracker;

//! Plan execution engine

pub mod engine;
pub mod error;
pub mod executor;

pub use engine::{DeployEngine, DeployEvent, EventHandler};
pub use error::DeployError;
pub use executor::{ActionExecutor, ActionOutcome, UNKNOWN_IP};

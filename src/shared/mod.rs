pub mod errors;
pub mod polling;
pub mod shutdown;

pub use errors::{AppError, BackendError, ConfigError};
pub use polling::{poll_until, PollConfig, PollOutcome};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

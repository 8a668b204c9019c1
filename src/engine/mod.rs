//! The execution engine: process instances, run status, runtime errors,
//! and the notification layer.

mod error;
mod instance;
mod status;
mod subscribers;

pub use error::ProcessError;
pub use instance::ProcessInstance;
pub use status::RunStatus;
pub use subscribers::EventHandler;

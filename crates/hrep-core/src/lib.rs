pub mod config;
pub mod logging;

pub mod client;
pub mod error;
pub mod guard;
pub mod probe;
pub mod range;
pub mod replicate;
pub mod request;
pub mod source;
pub mod upload;

pub use error::{Phase, ReplicateError, Result};
pub use replicate::{Outcome, Replicator};
pub use request::{Endpoint, TransferRequest};

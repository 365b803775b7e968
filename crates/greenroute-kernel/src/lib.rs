//! GreenRoute kernel.
//!
//! Domain types shared by every layer (routes, vehicles, environmental
//! signals), the single [`error::EngineError`] taxonomy, and the contracts
//! through which the engine talks to its external collaborators: the remote
//! signal store, the document store used to stage training data, and the
//! route / signal providers.

// error module
pub mod error;

// domain types
pub mod types;
pub use types::*;

// collaborator contracts
pub mod provider;
pub mod storage;

// config module
#[cfg(feature = "config")]
pub mod config;

pub use error::{EngineError, EngineReport, EngineResult, ErrorKind, IntoEngineReport};

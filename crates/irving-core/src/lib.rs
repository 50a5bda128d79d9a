pub mod ads;
pub mod aggregate;
pub mod cost_model;
pub mod engine;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod report;
pub mod sources;
pub mod types;

pub use error::{IrvingError, SourceError};
pub use types::*;

/// Standard result type for all engine operations
pub type IrvingResult<T> = Result<T, IrvingError>;

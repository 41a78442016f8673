//! Error handling for the clinic API server.

pub mod response;
pub mod types;

pub use types::{ApiError, ApiResult};

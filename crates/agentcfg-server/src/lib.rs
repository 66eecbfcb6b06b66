//! # agentcfg server
//!
//! HTTP front end that answers agent configuration requests from the
//! agentcfg cache.

#![warn(clippy::all)]

pub mod api;
pub mod error;

pub use api::{router, HealthResponse, SharedDispatcher};
pub use error::ApiError;

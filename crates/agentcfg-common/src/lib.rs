//! # agentcfg common
//!
//! Shared error type, logging bootstrap and test helpers used across the
//! agentcfg workspace.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{AgentCfgError, Result};
pub use logging::{init_logging, LoggingConfig};

//! Prospect Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the Prospect workspace members.
//!
//! # Overview
//!
//! - **Logging**: subscriber setup for console and rolling file output
//! - **Environment**: typed lookups of environment variables
//! - **Error Handling**: errors raised while reading the environment
//!
//! # Example
//!
//! ```no_run
//! use prospect_common::env;
//! use prospect_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     let page_size: u32 = env::parsed_or("PROSPECT_PAGE_SIZE", 25)?;
//!     tracing::info!(page_size, "Configured");
//!     Ok(())
//! }
//! ```

pub mod env;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{EnvError, EnvResult};

//! Structured logging and request correlation for the unclaude daemon and
//! CLI (spec §6 [AMBIENT] Logging).
//!
//! ```rust,no_run
//! use unclaude_telemetry::{LogConfig, LogFormat, setup_logging, RequestContext};
//!
//! # fn main() -> Result<(), unclaude_telemetry::TelemetryError> {
//! let config = LogConfig::new("info").with_format(LogFormat::Json);
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("daemon").with_operation("poll");
//! let _guard = ctx.enter();
//! tracing::info!("polling task queue");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};

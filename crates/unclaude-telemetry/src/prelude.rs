//! Commonly used types for convenient import: `use unclaude_telemetry::prelude::*;`

pub use crate::{LogConfig, LogFormat, LogTarget, RequestContext, RequestGuard};
pub use crate::{TelemetryError, TelemetryResult};
pub use crate::{setup_default_logging, setup_logging};

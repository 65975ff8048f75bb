//! Typed schemas for `config.yaml` and `proactive.yaml` (spec §6 [AMBIENT]
//! Configuration), following Design Note §9 "Duck-typed config objects":
//! one explicit struct per file, validated on load, with unrecognized
//! top-level keys logged as a warning rather than rejected.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod error;
mod proactive;

pub use config::{Config, ProviderConfig, RoutingProfile, SecurityProfile};
pub use error::{ConfigError, ConfigResult};
pub use proactive::{ActiveHours, Behavior, ProactiveConfig, SoulIdentity};

//! The Smart Router (C9, spec §4.9): local, regex/heuristic request scoring
//! and profile-based model selection. No network or LLM call is ever made
//! to route a request — the classification is entirely offline.

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod router;
mod scorer;

pub use router::{ModelSpec, RoutingDecision, RoutingProfile, SmartRouter};
pub use scorer::{RequestScorer, RequestTier, ScoringResult};

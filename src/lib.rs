//! Shatter Engine — runtime orchestration for a timed, choice-driven
//! narrative experience layered over procedural fracture growth.
//!
//! Interprets a declarative script of steps (dialogue, choices, interactive
//! challenges), paces text reveal against voice-line durations, tracks a
//! hidden compliance score that can force a full session reset, and grows a
//! deterministic seeded crack pattern from landing-page interactions.

pub mod core;
pub mod schema;

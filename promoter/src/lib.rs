//! Promotion and health-check execution engine.
//!
//! Turns an ordered list of pluggable steps into a promotion run, and an
//! ordered list of health checks into one aggregated verdict.
//!
//! - **[`core`]**: Pure, deterministic logic (health lattice, aliases,
//!   retry policy, shared types). No I/O, no async.
//! - **[`directive`]**: Runner contracts, permissions, the registry and the
//!   permission-scoped context builder.
//! - **[`io`]**: Configuration, step files, working directories and the
//!   collaborator contracts (credential store, cluster clients).
//!
//! Orchestration lives in [`promote`], [`health`] and [`engine`].

pub mod cancel;
pub mod core;
pub mod directive;
pub mod engine;
pub mod exit_codes;
pub mod health;
pub mod io;
pub mod logging;
pub mod promote;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

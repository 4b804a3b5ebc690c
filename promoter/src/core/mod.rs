//! Deterministic, pure logic shared by the engines.
//!
//! Core modules must be free of I/O side effects and async. They operate on
//! in-memory data and return deterministic outputs suitable for tests.

pub mod alias;
pub mod health_state;
pub mod retry;
pub mod types;

//! Config resolution and terminal output for the `court-records` binary.

pub mod config;
pub mod output;

//! synthmon CLI
//!
//! Command-line tools for inspecting, converting and comparing recorded
//! monitoring runs.

pub mod commands;
pub mod output;

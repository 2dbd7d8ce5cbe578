//! Subcommand implementations

pub mod alerts;
pub mod status;

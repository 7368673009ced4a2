//! Command line interface for emogif.

pub mod args;
pub mod commands;
pub mod output;

//! CLI interface for challack
//!
//! Argument parsing and its translation into an `InterceptConfig`. The
//! `challack` binary drives the rest.

pub mod args;

pub use args::{Cli, Commands};

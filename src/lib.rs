//! Crossroot - cross-build orchestrator
//!
//! Given a manifest of interdependent source packages, crossroot fetches
//! their latest tagged releases, builds them in dependency order through a
//! configure/patch/build/install pipeline and assembles a minimal runtime
//! image holding selected executables plus every shared library they need.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Scheduling, acquisition, build pipeline and image assembly
//! - [`infra`] - Infrastructure layer (network, filesystem, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;

//! Core business logic module
//!
//! Side effects (network, processes, binary inspection) go through the
//! seams in [`crate::infra`] so each engine can be driven by fakes in tests.
//!
//! # Submodules
//!
//! - [`manifest`] - Manifest parsing, validation and placeholder substitution
//! - [`package`] - Package definition
//! - [`scheduler`] - Dependency-depth priorities and build order
//! - [`index`] - Persisted source index and validation token store
//! - [`acquire`] - Concurrent tag lookup, download and extraction
//! - [`pipeline`] - Sequential configure/patch/build/install runner
//! - [`closure`] - Shared-library closure resolution
//! - [`image`] - Image tree assembly and packaging
//! - [`strip`] - Debug symbol stripping
//! - [`clean`] - Removal of cached state

pub mod acquire;
pub mod clean;
pub mod closure;
pub mod image;
pub mod index;
pub mod manifest;
pub mod package;
pub mod pipeline;
pub mod scheduler;
pub mod strip;

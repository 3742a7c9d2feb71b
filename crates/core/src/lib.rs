//! packscope-core
//!
//! Core library for packer fingerprinting and batch repacking of PE corpora.
//!
//! This crate owns corpus traversal, the PE magic gate, content fingerprinting,
//! the adapters around the external detector and packer tools, and the two
//! pipelines that compose them. Frontends (the CLI) only parse arguments,
//! resolve configuration, and print progress.

pub mod config;
pub mod corpus;
pub mod fingerprint;
pub mod model;
pub mod pe;
pub mod services;
pub mod table;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

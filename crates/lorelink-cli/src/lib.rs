//! Lorelink CLI library
//!
//! Modular pieces of the demonstration binary: argument parsing, layered
//! configuration, the file-backed snapshot store, and the in-process mesh
//! demo.

pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod store;

pub use config::AppConfig;
pub use error::{CliError, Result};
pub use store::FileSnapshotStore;

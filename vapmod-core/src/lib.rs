//! vapmod-core library exports

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;

pub use error::{FetchError, InstallError};

/// File extension of BepInEx plugin binaries
pub const PLUGIN_EXTENSION: &str = "dll";

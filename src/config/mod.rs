// src/config/mod.rs

//! Configuration loading and validation for lockstep.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it into a checked [`ConfigFile`] (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::{MAX_DURATION, parse_duration};
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConfigSection, RawConfigFile, RegistrySection, TaskConfig, TaskSpec, WorkKind,
    WorkSpec,
};

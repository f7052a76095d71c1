//! Configuration management for viva.
//!
//! Loads the TOML configuration from the user's config directory. The file is
//! created from a bundled template on first run (see `setup`).

pub mod file;

pub use file::{config_path, ApiConfig, AudioConfig, InterviewConfig, VivaConfig};

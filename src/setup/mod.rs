//! First-run setup.
//!
//! Writes the bundled default configuration when no config file exists yet.

use std::path::Path;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/viva.toml");

/// Creates the config file from the bundled template if it is missing.
///
/// Returns `true` when a new file was written.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn ensure_config(config_path: &Path) -> anyhow::Result<bool> {
    if config_path.exists() {
        tracing::debug!("Config file present at {}", config_path.display());
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_path, DEFAULT_CONFIG)?;
    tracing::info!("Wrote default configuration to {}", config_path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_template_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("viva.toml");

        assert!(ensure_config(&path).unwrap());
        std::fs::write(&path, "[audio]\ndevice = \"1\"\n").unwrap();
        assert!(!ensure_config(&path).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("device = \"1\""));
    }
}

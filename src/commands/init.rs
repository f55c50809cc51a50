//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Initialize canopy configuration
pub fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let base = base_dir.unwrap_or_else(Config::default_base_dir);
    let config_path = base.join("config.toml");

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Already initialized at {} (use --force to overwrite)",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.paths.base_dir = base;
    config.paths.config_file = config_path;
    config.save()?;

    info!("Initialized canopy at {}", config.paths.base_dir.display());
    Ok(config)
}

/// Print init result to console
pub fn print_init(config: &Config) {
    println!("\nInitialized canopy configuration\n");
    println!("Config file: {}", config.paths.config_file.display());
    println!("Qdrant URL: {}", config.qdrant_url);
    println!("Embedding model: {}", config.embedding.model);
    println!("LLM model: {}", config.llm.model);
    println!("\nEdit the config file to point at your Qdrant and model backends.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_config() {
        let tmp = TempDir::new().unwrap();
        let config = cmd_init(Some(tmp.path().to_path_buf()), false).unwrap();

        assert!(config.paths.config_file.exists());
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        cmd_init(Some(tmp.path().to_path_buf()), false).unwrap();

        let err = cmd_init(Some(tmp.path().to_path_buf()), false).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        cmd_init(Some(tmp.path().to_path_buf()), true).unwrap();
    }
}

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

const DATA_DIR_ENV: &str = "MEALBOOK_DATA_DIR";

pub struct Config {
    pub store_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolve the data directory: explicit override, then `MEALBOOK_DATA_DIR`,
    /// then the platform data directory.
    pub fn load(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir_override {
            Some(dir) => dir,
            None => match std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
                Some(dir) => PathBuf::from(dir),
                None => ProjectDirs::from("", "", "mealbook")
                    .context("Could not determine home directory")?
                    .data_dir()
                    .to_path_buf(),
            },
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let store_path = data_dir.join("mealbook.db");

        Ok(Config {
            store_path,
            data_dir,
        })
    }
}

use serde::{Deserialize, Serialize};

use crate::core::SeasonConfig;

/// On-disk season description (TOML).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeasonFile {
    pub season: SeasonConfig,
}

impl SeasonFile {
    pub fn load_from_file(path: &str) -> anyhow::Result<SeasonConfig> {
        let content = std::fs::read_to_string(path)?;
        let file: SeasonFile = toml::from_str(&content)?;
        Ok(file.season)
    }
}

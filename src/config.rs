use std::fs;
use std::path::PathBuf;

use log::warn;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigJoinMode {
    Inner,
    Outer,
}

/// Optional defaults loaded from `mf4import.toml`. CLI arguments always
/// take precedence; the file only fills in what the caller left unset.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub raster: Option<f64>,
    #[serde(default)]
    pub blacklist: Option<PathBuf>,
    #[serde(default)]
    pub targetdir: Option<PathBuf>,
    #[serde(default)]
    pub join: Option<ConfigJoinMode>,
    #[serde(default)]
    pub preview: Option<usize>,
}

impl Config {
    /// Load defaults from `$MF4IMPORT_CONFIG` or `./mf4import.toml`.
    /// A missing file yields the empty default; an unparseable one is
    /// reported and ignored.
    pub fn load() -> Self {
        let path = std::env::var("MF4IMPORT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("mf4import.toml"));
        if !path.is_file() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("cannot read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let config: Config = toml::from_str(
            r#"
            raster = 0.5
            blacklist = "/data/blacklist.txt"
            join = "inner"
            preview = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.raster, Some(0.5));
        assert_eq!(config.blacklist, Some(PathBuf::from("/data/blacklist.txt")));
        assert_eq!(config.join, Some(ConfigJoinMode::Inner));
        assert_eq!(config.preview, Some(20));
        assert!(config.targetdir.is_none());
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.raster.is_none());
        assert!(config.join.is_none());
    }
}

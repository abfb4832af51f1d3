use analyzers::{MatcherConfig, ScorerConfig};
use config::{Config, ConfigError, File};
use organizer_actions::{OrganizerConfig, DEFAULT_MAX_HISTORY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"
[matcher]
# Confidence reported for each kind of match
exact_name_confidence = 1.0
shared_channel_confidence = 0.95
# Name similarity required when both contacts share an organization
same_org_similarity = 0.85
# Name similarity required otherwise
similarity = 0.90

[quality]
# Display names treated as missing
placeholder_names = ["No Name"]

[history]
# Undo entries kept between runs; 0 keeps everything
max_depth = 100

[data]
# contacts_file = "/path/to/contacts.json"
# history_file = "/path/to/history.json"
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub quality: ScorerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryConfig {
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_HISTORY,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DataConfig {
    pub contacts_file: Option<String>,
    pub history_file: Option<String>,
}

impl AppConfig {
    /// Load from `path`, or from the user config directory when `None`.
    ///
    /// A missing file is created with the defaults.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: AppConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    pub fn organizer(&self) -> OrganizerConfig {
        OrganizerConfig {
            matcher: self.matcher.clone(),
            scorer: self.quality.clone(),
            max_history: self.history.max_depth,
        }
    }

    /// `--contacts` wins over the config file, which wins over the data directory.
    pub fn contacts_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.data.contacts_file.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| data_dir().join("contacts.json"))
    }

    /// Undo history lives next to the contacts file unless configured.
    pub fn history_path(&self, contacts_path: &Path) -> PathBuf {
        if let Some(history_file) = &self.data.history_file {
            return PathBuf::from(history_file);
        }
        let stem = contacts_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("contacts");
        contacts_path.with_file_name(format!("{stem}.history.json"))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("contacts-organizer").join("organizer.toml")
    } else {
        PathBuf::from("organizer.toml")
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("contacts-organizer"))
        .unwrap_or_else(|| PathBuf::from("."))
}

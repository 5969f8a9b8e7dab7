use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_ENV: &str = "NANDIN_CONFIG";
const CONFIG_RELATIVE: &str = ".config/nandin/config.yaml";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    /// Verify card-image partition hashes while opening.
    #[serde(default = "default_verify_hashes")]
    pub verify_hashes: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_verify_hashes() -> bool {
    true
}

fn default_log_dir() -> String {
    env::temp_dir().join("nandin").to_string_lossy().into_owned()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verify_hashes: default_verify_hashes(),
            log_dir: default_log_dir(),
        }
    }
}

impl Settings {
    pub fn parse(contents: &str) -> Result<Settings, String> {
        serde_norway::from_str(contents).map_err(|e| format!("Failed to parse settings: {}", e))
    }
}

/// `$NANDIN_CONFIG` when set, otherwise `~/.config/nandin/config.yaml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(CONFIG_RELATIVE))
}

/// Load settings, falling back to defaults when no config file exists or it
/// cannot be read. A present-but-malformed file is reported.
pub fn get_settings() -> Result<Settings, String> {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        return Settings::parse(&contents).map_err(|e| format!("{}: {}", path.display(), e));
    }
    Ok(Settings::default())
}

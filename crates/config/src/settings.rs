// User settings
// Loaded from ~/.config/regrade/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Result file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Reconciliation
    #[serde(rename = "recon.useDynamics")]
    pub use_dynamics: bool,

    #[serde(rename = "recon.profile")]
    pub profile: Option<PathBuf>,  // None = built-in column names

    // Output
    #[serde(rename = "output.directory")]
    pub output_directory: Option<PathBuf>,  // None = next to the input file

    #[serde(rename = "output.format")]
    pub output_format: OutputFormat,

    #[serde(rename = "output.dateFormat")]
    pub date_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_dynamics: false,
            profile: None,
            output_directory: None,
            output_format: OutputFormat::Xlsx,
            date_format: "%d-%m-%y".to_string(),
        }
    }
}

const DEFAULT_CONFIG: &str = r#"{
    // Reconciliation
    // Veto credit when the external checkpoints regress
    "recon.useDynamics": false,
    // Path to a TOML column profile (null = built-in column names)
    "recon.profile": null,

    // Output
    // Directory for result files (null = next to the input file)
    "output.directory": null,
    // "xlsx" or "csv"
    "output.format": "xlsx",
    // Date stamp in result file names (strftime)
    "output.dateFormat": "%d-%m-%y"
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("regrade");
        config_dir.join("settings.json")
    }

    /// Load settings from the user config dir, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from a specific file. A missing file is created with
    /// defaults; unreadable or malformed files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            create_default_file(path);
            return settings;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}", path.display(), e);
                    log::warn!("Using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned)
    }
}

/// Create default settings file with comments
fn create_default_file(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            log::warn!("Error creating config directory: {}", e);
            return;
        }
    }

    if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
        log::warn!("Error writing default settings.json: {}", e);
    }
}

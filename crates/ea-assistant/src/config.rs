//! Assistant configuration, loadable from TOML.

use std::path::PathBuf;

use serde::Deserialize;

use crate::inference::OllamaConfig;

/// Top-level configuration for the assistant.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// CSV file with an "Emission Date" column plus one column per industry.
    pub data_path: PathBuf,
    /// Directory trend charts are written to.
    #[serde(default = "default_plot_dir")]
    pub plot_dir: PathBuf,
    /// Text-generation backend. Optional, defaults to a local Ollama.
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Second-stage narrative settings.
    #[serde(default)]
    pub narrative: NarrativeConfig,
}

/// Whether results are turned into prose, and how.
#[derive(Debug, Clone, Deserialize)]
pub struct NarrativeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Print the narrative as it is generated.
    #[serde(default = "default_true")]
    pub stream: bool,
}

fn default_plot_dir() -> PathBuf {
    PathBuf::from("plots")
}

fn default_true() -> bool {
    true
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stream: true,
        }
    }
}

impl AssistantConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

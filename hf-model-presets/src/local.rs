use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::BufWriter;
use std::path::PathBuf;

use serde_json::Value;

use crate::{HfConfig, HubError, ModelPreset, PresetSource, Result};

/// Configs saved to disk: either one `config.json`, or a `configs.json` map
/// of model id to config as produced by bulk downloads.
pub struct LocalConfigs {
    path: PathBuf,
}

impl LocalConfigs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LocalConfigs { path: path.into() }
    }

    /// Write `configs` as a `{model_id: config}` map, replacing the file
    pub fn save(&self, configs: &BTreeMap<String, Value>) -> Result<()> {
        let io_error = |source| HubError::Io {
            location: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(io_error)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, configs).map_err(|e| io_error(e.into()))?;

        log::info!("Saved {} configs to {}", configs.len(), self.path.display());
        Ok(())
    }

    fn read_config(&self, model_id: &str) -> Result<HfConfig> {
        let location = self.path.display().to_string();
        let contents = fs::read_to_string(&self.path).map_err(|source| HubError::Io {
            location: location.clone(),
            source,
        })?;

        let malformed = |source| HubError::Malformed {
            model_id: model_id.to_string(),
            source,
        };
        let document: Value = serde_json::from_str(&contents).map_err(malformed)?;

        let config = if document.get("hidden_size").is_some() {
            log::debug!("{} holds a single config", location);
            document
        } else {
            document
                .get(model_id)
                .cloned()
                .ok_or_else(|| HubError::UnknownModel {
                    model_id: model_id.to_string(),
                    location,
                })?
        };

        HfConfig::from_value(model_id, config)
    }
}

impl PresetSource for LocalConfigs {
    fn load(&self, model_id: &str) -> Result<ModelPreset> {
        let config = self.read_config(model_id)?;
        ModelPreset::from_config(model_id, &config)
    }
}

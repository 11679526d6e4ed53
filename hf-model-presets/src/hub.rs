use std::collections::BTreeMap;
use std::env;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::{HfConfig, HubError, ModelPreset, PresetSource, Result};

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Fetches `config.json` straight from the Hub. Failures are returned as-is;
/// nothing is retried.
pub struct HubClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HubClient {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        HubClient {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Reads `HF_ENDPOINT` and `HF_TOKEN`
    pub fn from_env() -> Self {
        let endpoint = env::var("HF_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let token = env::var("HF_TOKEN").ok().filter(|t| !t.is_empty());
        Self::new(endpoint, token)
    }

    pub fn config_url(&self, model_id: &str) -> String {
        format!("{}/{}/resolve/main/config.json", self.endpoint, model_id)
    }

    /// The untouched `config.json` document, as stored by bulk downloads
    pub fn fetch_raw(&self, model_id: &str) -> Result<Value> {
        let url = self.config_url(model_id);
        log::debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let request_error = |source| HubError::Request {
            model_id: model_id.to_string(),
            source,
        };
        let response = request.send().map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::Status {
                model_id: model_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(request_error)?;
        serde_json::from_str(&body).map_err(|source| HubError::Malformed {
            model_id: model_id.to_string(),
            source,
        })
    }

    pub fn fetch_config(&self, model_id: &str) -> Result<HfConfig> {
        let document = self.fetch_raw(model_id)?;
        HfConfig::from_value(model_id, document)
    }

    /// Download every config into a `{model_id: config}` map.
    ///
    /// The first failure aborts the whole batch.
    pub fn fetch_configs<S: AsRef<str>>(&self, model_ids: &[S]) -> Result<BTreeMap<String, Value>> {
        model_ids
            .iter()
            .map(|model_id| {
                let model_id = model_id.as_ref();
                let document = self.fetch_raw(model_id)?;
                log::info!("Downloaded config for {}", model_id);
                Ok((model_id.to_string(), document))
            })
            .collect()
    }
}

impl PresetSource for HubClient {
    fn load(&self, model_id: &str) -> Result<ModelPreset> {
        let config = self.fetch_config(model_id)?;
        let preset = ModelPreset::from_config(model_id, &config)?;
        log::info!(
            "Loaded {} from the Hub: {:.2}B parameters, {} context",
            model_id,
            preset.parameters_b,
            preset.context_length
        );
        Ok(preset)
    }
}

use anyhow::{Context, Result};
use dirs::home_dir;
use std::{fs, path::Path};

use super::Config;
use super::builder::ConfigBuilder;
use super::environment::apply_env_overrides;
use super::types::{FileConfig, PersistedConfig};
use super::validation::validate;

impl Config {
    pub fn config_path() -> Result<std::path::PathBuf> {
        let mut path = home_dir().context("Could not determine home directory")?;
        path.push(".sitewatch/config");
        Ok(path)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut builder = ConfigBuilder::new();

        if path.exists() {
            builder = Self::apply_file(builder, &path)?;
        }

        builder = apply_env_overrides(builder)?;

        let config = builder.build()?;
        validate(&config)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Unable to create config directory {}", parent.display())
            })?;
        }

        let payload = PersistedConfig::from(self);
        let json = serde_json::to_string_pretty(&payload)
            .context("Failed to serialize configuration to JSON")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    fn apply_file(builder: ConfigBuilder, path: &Path) -> Result<ConfigBuilder> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed reading config at {}", path.display()))?;

        if contents.trim().is_empty() {
            return Ok(builder);
        }

        let raw: FileConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed parsing JSON config at {}", path.display()))?;

        Ok(raw.apply(builder))
    }
}

impl FileConfig {
    fn apply(self, mut builder: ConfigBuilder) -> ConfigBuilder {
        if let Some(file_llm) = self.llm {
            builder = builder.with_llm(|llm| {
                if let Some(provider) = file_llm.provider.clone() {
                    if let Ok(parsed) = provider.parse::<super::types::LlmProvider>() {
                        if llm.provider != parsed {
                            llm.provider = parsed;
                            llm.base_url = parsed.default_base_url().to_string();
                        }
                    }
                }
                if let Some(api_key) = file_llm.api_key.clone() {
                    llm.api_key = api_key;
                }
                if let Some(timeout) = file_llm.timeout_secs {
                    llm.timeout_secs = timeout;
                }
                if let Some(base_url) = file_llm.base_url.clone() {
                    llm.base_url = base_url;
                }
                if let Some(user_agent) = file_llm.user_agent.clone() {
                    llm.user_agent = user_agent;
                }
            });
        }

        if let Some(file_models) = self.models {
            builder = builder.with_models(|models| {
                if let Some(model) = file_models.model.clone() {
                    models.model = model;
                }
                if let Some(max_tokens) = file_models.max_tokens {
                    models.max_tokens = max_tokens;
                }
            });
        }

        builder
    }
}

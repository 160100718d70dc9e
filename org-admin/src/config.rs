use anyhow::{bail, Context, Result};
use grid_staging::EngineConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_ms: 30_000,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml` / `.yml` are YAML, everything else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        }
    }
}

impl ConsoleConfig {
    /// Loads `path` if it exists, falls back to defaults otherwise, then
    /// applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            log::warn!("{} not found, using default console config", path.display());
            ConsoleConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content, ConfigFormat::from_path(path)).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: ConsoleConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path) {
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
        };
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ORG_ADMIN_API_URL") {
            self.api.base_url = url;
        }
        if let Some(timeout) = lookup("ORG_ADMIN_API_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => self.api.timeout_ms = ms,
                Err(_) => log::warn!("Ignoring ORG_ADMIN_API_TIMEOUT_MS={timeout}: not a number"),
            }
        }
        if let Some(token) = lookup("ORG_ADMIN_API_TOKEN") {
            self.api.auth_token = Some(token).filter(|token| !token.is_empty());
        }
        if let Some(limit) = lookup("ORG_ADMIN_MAX_IN_FLIGHT") {
            match limit.parse::<usize>() {
                Ok(n) => self.engine.max_in_flight = n,
                Err(_) => log::warn!("Ignoring ORG_ADMIN_MAX_IN_FLIGHT={limit}: not a number"),
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            bail!("api.base_url must be an http(s) URL, got '{}'", self.api.base_url);
        }
        if self.engine.max_in_flight == 0 {
            bail!("engine.max_in_flight must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn toml_sections_are_optional() {
        let config = ConsoleConfig::parse(
            r#"
            [api]
            base_url = "https://admin.example.com/api"
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://admin.example.com/api");
        assert_eq!(config.api.timeout_ms, 30_000);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn yaml_is_picked_by_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("console.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("console.toml")), ConfigFormat::Toml);

        let config = ConsoleConfig::parse(
            "engine:\n  max_in_flight: 4\n  enforce_representative: false\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(config.engine.max_in_flight, 4);
        assert!(!config.engine.enforce_representative);
        assert!(config.engine.enforce_unique_business_key);
    }

    #[test]
    fn environment_overrides_win() {
        let vars: HashMap<&str, &str> = [
            ("ORG_ADMIN_API_URL", "http://10.0.0.5:9000"),
            ("ORG_ADMIN_API_TOKEN", "s3cret"),
            ("ORG_ADMIN_MAX_IN_FLIGHT", "8"),
            ("ORG_ADMIN_API_TIMEOUT_MS", "soon"),
        ]
        .into_iter()
        .collect();

        let mut config = ConsoleConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.api.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.api.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(config.engine.max_in_flight, 8);
        assert_eq!(config.api.timeout_ms, 30_000);
    }

    #[test]
    fn saved_config_loads_back() {
        let path = env::temp_dir().join(format!("org-admin-config-{}.yaml", std::process::id()));
        let mut config = ConsoleConfig::default();
        config.api.auth_token = Some("t0k".to_string());
        config.engine.max_in_flight = 2;

        config.save(&path).unwrap();
        let loaded = ConsoleConfig::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn zero_in_flight_is_rejected() {
        let mut config = ConsoleConfig::default();
        config.engine.max_in_flight = 0;
        assert!(config.validate().is_err());
    }
}

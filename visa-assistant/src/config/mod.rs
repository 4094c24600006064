use crate::services::providers::gemini::{GeminiConfig, GEMINI_API_BASE};
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_INACTIVITY_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct VisaAssistantConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub session: SessionSettings,
    /// OTLP collector for trace export; traces stay local when unset.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Sessions idle for longer than this are dropped.
    pub inactivity_hours: i64,
    pub secure_cookie: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            inactivity_hours: DEFAULT_INACTIVITY_HOURS,
            secure_cookie: false,
        }
    }
}

impl VisaAssistantConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let get = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let api_key = get("GEMINI_API_KEY", None)?;
        if api_key.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GEMINI_API_KEY is set but empty"
            )));
        }

        Ok(VisaAssistantConfig {
            common,
            gemini: GeminiSettings {
                api_key: Secret::new(api_key),
                model: get("GEMINI_MODEL", Some(DEFAULT_MODEL))?,
                base_url: get("GEMINI_API_BASE", Some(GEMINI_API_BASE))?,
                timeout_secs: parse_or(
                    "GEMINI_TIMEOUT_SECS",
                    &get("GEMINI_TIMEOUT_SECS", Some(&DEFAULT_TIMEOUT_SECS.to_string()))?,
                )?,
            },
            session: SessionSettings {
                inactivity_hours: parse_or(
                    "SESSION_INACTIVITY_HOURS",
                    &get(
                        "SESSION_INACTIVITY_HOURS",
                        Some(&DEFAULT_INACTIVITY_HOURS.to_string()),
                    )?,
                )?,
                secure_cookie: parse_or(
                    "SESSION_SECURE_COOKIE",
                    &get("SESSION_SECURE_COOKIE", Some("false"))?,
                )?,
            },
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }

    /// Settings for the Gemini client.
    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.gemini.api_key.clone(),
            model: self.gemini.model.clone(),
            base_url: self.gemini.base_url.clone(),
            timeout: Duration::from_secs(self.gemini.timeout_secs),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value.trim().parse().map_err(|_| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, value))
    })
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<VisaAssistantConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        VisaAssistantConfig::from_lookup(core_config::Config::default(), |key| {
            vars.get(key).cloned()
        })
    }

    #[test]
    fn dev_defaults_apply_when_only_key_is_set() {
        let config = load(&[("GEMINI_API_KEY", "secret")]).unwrap();

        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.base_url, GEMINI_API_BASE);
        assert_eq!(config.gemini.timeout_secs, 120);
        assert_eq!(config.session.inactivity_hours, 24);
        assert!(!config.session.secure_cookie);
        assert!(config.otlp_endpoint.is_none());
        assert_eq!(config.gemini_config().timeout, Duration::from_secs(120));
    }

    #[test]
    fn missing_api_key_fails_even_in_dev() {
        assert!(matches!(load(&[]), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn blank_api_key_fails() {
        assert!(matches!(
            load(&[("GEMINI_API_KEY", "  ")]),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn production_requires_explicit_settings() {
        let result = load(&[("ENVIRONMENT", "prod"), ("GEMINI_API_KEY", "secret")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("GEMINI_TIMEOUT_SECS", "30"),
            ("SESSION_SECURE_COOKIE", "true"),
            ("OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();

        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.gemini.timeout_secs, 30);
        assert!(config.session.secure_cookie);
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn malformed_number_is_a_config_error() {
        let result = load(&[("GEMINI_API_KEY", "secret"), ("GEMINI_TIMEOUT_SECS", "soon")]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}

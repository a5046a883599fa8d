//! Runtime configuration, read from the process environment.
//!
//! # API pattern
//!
//! Every constructor has two forms:
//! - `from_lookup(lookup, …)`: explicit variable source; used in tests
//! - `from_env()`: reads `std::env`, delegates to `from_lookup`
//!
//! One [`SyncConfig`] is built at process start and passed by reference.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::json_store;
use crate::types::LanguageCode;

pub const ENV_API_URL: &str = "TAMPERE_API_URL";
pub const ENV_API_AUTH: &str = "TAMPERE_API_AUTH";
pub const ENV_HTTP_TIMEOUT: &str = "PLACESYNC_HTTP_TIMEOUT_SECS";
pub const ENV_LANGUAGES: &str = "PLACESYNC_LANGUAGES";
pub const ENV_DEFAULT_LANGUAGE: &str = "PLACESYNC_DEFAULT_LANGUAGE";
pub const ENV_FALLBACK_LANGUAGE: &str = "PLACESYNC_FALLBACK_LANGUAGE";
pub const ENV_STORE: &str = "PLACESYNC_STORE";

pub const DEFAULT_LANGUAGE: &str = "fi";
pub const FALLBACK_LANGUAGE: &str = "en";

/// Path of the JSON export below the site root.
const API_JSON_PATH: &str = "sites/default/files/api_json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Remote API location and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Directory URL holding `place_of_business_<lang>.json`, no trailing slash.
    pub base_url: String,
    /// Basic auth credential, `user:password`.
    pub credential: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("credential", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    pub fn new(base_url: &str, credential: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            credential: credential.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// `<base>/place_of_business_<lang>.json`
    pub fn endpoint(&self, language: &LanguageCode) -> String {
        format!("{}/place_of_business_{}.json", self.base_url, language)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let site = required(&lookup, ENV_API_URL)?;
        let credential = required(&lookup, ENV_API_AUTH)?;

        let site = if site.ends_with('/') {
            site
        } else {
            format!("{site}/")
        };
        let mut config = Self::new(&format!("{site}{API_JSON_PATH}"), &credential);

        if let Some(raw) = optional(&lookup, ENV_HTTP_TIMEOUT) {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidVar {
                name: ENV_HTTP_TIMEOUT,
                reason: format!("'{raw}' is not a number of seconds"),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// `from_lookup` convenience wrapper.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

// ---------------------------------------------------------------------------
// LanguageSettings
// ---------------------------------------------------------------------------

/// The multi-language facility: which languages the store carries and where
/// each one is imported to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSettings {
    pub languages: Vec<LanguageCode>,
    pub default_language: LanguageCode,
    pub fallback_language: LanguageCode,
}

impl LanguageSettings {
    /// Target language for a source language: the default language maps to
    /// itself, every other language to the fallback.
    pub fn target_for(&self, from: &LanguageCode) -> LanguageCode {
        if *from == self.default_language {
            self.default_language.clone()
        } else {
            self.fallback_language.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Process-wide configuration for the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub default_language: LanguageCode,
    pub fallback_language: LanguageCode,
    /// `None` when no multi-language facility is configured.
    pub languages: Option<LanguageSettings>,
    pub store_path: PathBuf,
}

impl SyncConfig {
    pub fn from_lookup<F>(lookup: F, home: Option<&Path>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_language = language_var(&lookup, ENV_DEFAULT_LANGUAGE, DEFAULT_LANGUAGE)?;
        let fallback_language = language_var(&lookup, ENV_FALLBACK_LANGUAGE, FALLBACK_LANGUAGE)?;

        let languages = match optional(&lookup, ENV_LANGUAGES) {
            None => None,
            Some(raw) => {
                let mut list = Vec::new();
                for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
                    let lang: LanguageCode =
                        part.parse().map_err(|reason| ConfigError::InvalidVar {
                            name: ENV_LANGUAGES,
                            reason,
                        })?;
                    if !list.contains(&lang) {
                        list.push(lang);
                    }
                }
                if list.is_empty() {
                    None
                } else {
                    Some(LanguageSettings {
                        languages: list,
                        default_language: default_language.clone(),
                        fallback_language: fallback_language.clone(),
                    })
                }
            }
        };

        let store_path = match optional(&lookup, ENV_STORE) {
            Some(path) => PathBuf::from(path),
            None => json_store::default_path_at(home.ok_or(ConfigError::HomeNotFound)?),
        };

        Ok(Self {
            default_language,
            fallback_language,
            languages,
            store_path,
        })
    }

    /// `from_lookup` convenience wrapper.
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = dirs::home_dir();
        Self::from_lookup(|key| std::env::var(key).ok(), home.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::MissingVar { name })
}

fn language_var<F>(lookup: &F, name: &'static str, default: &str) -> Result<LanguageCode, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name)
        .as_deref()
        .unwrap_or(default)
        .parse()
        .map_err(|reason| ConfigError::InvalidVar { name, reason })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn api_endpoint_is_built_under_json_export() {
        let config = ApiConfig::from_lookup(env(&[
            (ENV_API_URL, "https://www.tampere.fi/"),
            (ENV_API_AUTH, "user:pass"),
        ]))
        .unwrap();
        assert_eq!(
            config.endpoint(&LanguageCode::from("sv")),
            "https://www.tampere.fi/sites/default/files/api_json/place_of_business_sv.json"
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn api_url_without_trailing_slash_is_joined() {
        let config = ApiConfig::from_lookup(env(&[
            (ENV_API_URL, "http://localhost:8080"),
            (ENV_API_AUTH, "a:b"),
        ]))
        .unwrap();
        assert_eq!(
            config.base_url,
            "http://localhost:8080/sites/default/files/api_json"
        );
    }

    #[test]
    fn missing_credential_is_reported_by_name() {
        let err = ApiConfig::from_lookup(env(&[(ENV_API_URL, "http://x/")])).unwrap_err();
        assert!(err.to_string().contains(ENV_API_AUTH));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = ApiConfig::from_lookup(env(&[
            (ENV_API_URL, "http://x/"),
            (ENV_API_AUTH, "a:b"),
            (ENV_HTTP_TIMEOUT, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { .. }));
    }

    #[test]
    fn debug_output_redacts_credential() {
        let config = ApiConfig::new("http://x", "secret:pw");
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn sync_config_defaults() {
        let home = tempfile::TempDir::new().unwrap();
        let config = SyncConfig::from_lookup(env(&[]), Some(home.path())).unwrap();
        assert_eq!(config.default_language.as_str(), "fi");
        assert_eq!(config.fallback_language.as_str(), "en");
        assert!(config.languages.is_none());
        assert!(config.store_path.ends_with(".placesync/records.json"));
    }

    #[test]
    fn languages_list_is_parsed_and_deduplicated() {
        let config = SyncConfig::from_lookup(
            env(&[(ENV_LANGUAGES, "fi, en,sv,fi"), (ENV_STORE, "/tmp/s.json")]),
            None,
        )
        .unwrap();
        let settings = config.languages.expect("languages");
        let codes: Vec<_> = settings.languages.iter().map(|l| l.as_str()).collect();
        assert_eq!(codes, vec!["fi", "en", "sv"]);
        assert_eq!(config.store_path, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn target_language_mapping() {
        let settings = LanguageSettings {
            languages: vec!["fi".into(), "en".into(), "sv".into()],
            default_language: "fi".into(),
            fallback_language: "en".into(),
        };
        assert_eq!(settings.target_for(&"fi".into()).as_str(), "fi");
        assert_eq!(settings.target_for(&"sv".into()).as_str(), "en");
        assert_eq!(settings.target_for(&"en".into()).as_str(), "en");
    }

    #[test]
    fn no_home_and_no_store_path_fails() {
        let err = SyncConfig::from_lookup(env(&[]), None).unwrap_err();
        assert!(matches!(err, ConfigError::HomeNotFound));
    }
}

//! Remote place-of-business export: wire model and HTTP source.
//!
//! One GET per language against `<base>/place_of_business_<lang>.json`,
//! authenticated with HTTP Basic. Anything other than a 200 carrying a
//! non-empty JSON array is a [`FetchError`].

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde::Deserialize;

use placesync_core::{ApiConfig, LanguageCode};

use crate::error::FetchError;

const MAX_LOG_BODY_CHARS: usize = 256;

// ---------------------------------------------------------------------------
// Wire model
// ---------------------------------------------------------------------------

/// One element of the remote export. Field names follow the upstream JSON,
/// including the `field_additinal_phones` spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteEntity {
    pub id: i64,
    pub langcode: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub field_summary: Option<String>,
    #[serde(default)]
    pub field_body_md: Option<String>,
    #[serde(default)]
    pub field_additional_information: Option<String>,
    #[serde(default)]
    pub field_address_postal: Option<PostalAddress>,
    #[serde(default)]
    pub field_phone: Option<String>,
    #[serde(default)]
    pub phone_supplementary: Option<String>,
    #[serde(default)]
    pub field_additinal_phones: Option<Vec<AdditionalPhone>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostalAddress {
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AdditionalPhone {
    #[serde(default)]
    pub telephone_number: Option<String>,
    #[serde(default)]
    pub telephone_supplementary: Option<String>,
}

// ---------------------------------------------------------------------------
// RemoteSource
// ---------------------------------------------------------------------------

/// Read-only provider of the remote entity set for one language.
pub trait RemoteSource {
    fn fetch(&self, language: &LanguageCode) -> Result<Vec<RemoteEntity>, FetchError>;
}

/// Parse a response body into a non-empty entity list.
pub fn parse_entities(url: &str, body: &str) -> Result<Vec<RemoteEntity>, FetchError> {
    let entities: Vec<RemoteEntity> =
        serde_json::from_str(body).map_err(|source| FetchError::Parse {
            url: url.to_owned(),
            source,
        })?;
    if entities.is_empty() {
        return Err(FetchError::Empty {
            url: url.to_owned(),
        });
    }
    Ok(entities)
}

// ---------------------------------------------------------------------------
// HttpSource
// ---------------------------------------------------------------------------

/// Blocking HTTP client for the remote export.
#[derive(Clone)]
pub struct HttpSource {
    agent: ureq::Agent,
    config: ApiConfig,
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpSource {
    pub fn new(config: ApiConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }

    fn authorization(&self) -> String {
        format!("Basic {}", BASE64_STANDARD.encode(&self.config.credential))
    }
}

impl RemoteSource for HttpSource {
    fn fetch(&self, language: &LanguageCode) -> Result<Vec<RemoteEntity>, FetchError> {
        let url = self.config.endpoint(language);
        tracing::info!("fetching entities from {}", url);

        let response = match self
            .agent
            .get(&url)
            .set("Authorization", &self.authorization())
            .set("Accept", "application/json")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                let preview: String = body.chars().take(MAX_LOG_BODY_CHARS).collect();
                tracing::debug!("API response error ({}): {}", status, preview);
                return Err(FetchError::Status { url, status });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(FetchError::Transport {
                    url,
                    message: transport.to_string(),
                });
            }
        };

        let status = response.status();
        if status != 200 {
            return Err(FetchError::Status { url, status });
        }

        let body = response.into_string().map_err(|source| FetchError::Body {
            url: url.clone(),
            source,
        })?;
        let entities = parse_entities(&url, &body)?;
        tracing::debug!("fetched {} entities for {}", entities.len(), language);
        Ok(entities)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

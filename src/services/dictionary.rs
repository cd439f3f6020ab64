use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("word must not be empty")]
    EmptyWord,
    #[error("no entry for {0}")]
    NotFound(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryDefinition {
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryMeaning {
    pub part_of_speech: String,
    pub definitions: Vec<DictionaryDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    pub meanings: Vec<DictionaryMeaning>,
}

// Upstream shape. Only the fields we surface are declared.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    word: String,
    phonetic: Option<String>,
    #[serde(default)]
    phonetics: Vec<RawPhonetic>,
    #[serde(default)]
    meanings: Vec<RawMeaning>,
}

#[derive(Debug, Deserialize)]
struct RawPhonetic {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeaning {
    #[serde(default)]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<RawDefinition>,
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(default)]
    definition: String,
    example: Option<String>,
}

#[derive(Clone)]
pub struct DictionaryClient {
    base_url: String,
    client: reqwest::Client,
}

impl DictionaryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn lookup(&self, word: &str) -> Result<Vec<DictionaryEntry>, DictionaryError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(DictionaryError::EmptyWord);
        }

        let url = format!("{}/{}", self.base_url, urlencoding::encode(word));
        debug!(url = %url, "dictionary lookup");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DictionaryError::NotFound(word.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, word = %word, "dictionary upstream error");
            return Err(DictionaryError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        let entries = parse_entries(&bytes)?;
        if entries.is_empty() {
            return Err(DictionaryError::NotFound(word.to_string()));
        }
        Ok(entries)
    }
}

pub fn parse_entries(bytes: &[u8]) -> Result<Vec<DictionaryEntry>, DictionaryError> {
    let raw: Vec<RawEntry> = serde_json::from_slice(bytes)?;
    Ok(raw.into_iter().map(DictionaryEntry::from).collect())
}

impl From<RawEntry> for DictionaryEntry {
    fn from(raw: RawEntry) -> Self {
        // Fall back to the first non-empty phonetic variant.
        let phonetic = raw
            .phonetic
            .filter(|p| !p.trim().is_empty())
            .or_else(|| {
                raw.phonetics
                    .into_iter()
                    .filter_map(|p| p.text)
                    .find(|t| !t.trim().is_empty())
            });

        let meanings = raw
            .meanings
            .into_iter()
            .map(|m| DictionaryMeaning {
                part_of_speech: m.part_of_speech,
                definitions: m
                    .definitions
                    .into_iter()
                    .filter(|d| !d.definition.trim().is_empty())
                    .map(|d| DictionaryDefinition {
                        definition: d.definition,
                        example: d.example,
                    })
                    .collect(),
            })
            .collect();

        Self {
            word: raw.word,
            phonetic,
            meanings,
        }
    }
}

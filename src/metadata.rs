//! Metadata clients for the two remote sources
//!
//! The primary source serves per-token reveal status and attributes; the
//! secondary (Reservoir) source serves rarity rank, trait supply counts and
//! floor prices. Neither response is cached: every call is a fresh request.
//!
//! Both fetchers surface failures as [`FetchError`] so the caller picks the
//! retry policy. `fetch_rarity_metadata` additionally distinguishes a
//! definite "token not found" (`Ok(None)`) from a transient failure.

use crate::config::Config;
use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use serde::Deserialize;
use std::sync::Arc;

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Primary-source metadata for a single token
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealMetadata {
    #[serde(default)]
    pub is_revealed: Option<bool>,
    #[serde(default)]
    pub revealed_at: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Vec<TokenTrait>,
}

/// One trait line from the primary source
#[derive(Debug, Clone, Deserialize)]
pub struct TokenTrait {
    pub trait_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Rarity metadata from the secondary source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityMetadata {
    #[serde(default)]
    pub rarity_rank: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Vec<RarityTrait>,
    #[serde(default)]
    pub collection: Option<CollectionInfo>,
}

/// One trait line from the secondary source, with supply count and trait floor
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityTrait {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub token_count: Option<u64>,
    #[serde(default)]
    pub floor_ask_price: Option<PriceInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    #[serde(default)]
    pub floor_ask_price: Option<PriceInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceInfo {
    #[serde(default)]
    pub amount: Option<PriceAmount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceAmount {
    #[serde(default)]
    pub decimal: Option<f64>,
    #[serde(default)]
    pub usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TokensResponse {
    #[serde(default)]
    tokens: Vec<TokenEnvelope>,
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token: RarityMetadata,
}

// ============================================================================
// CLIENT
// ============================================================================

#[derive(Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    config: Arc<Config>,
}

impl MetadataClient {
    pub fn new(config: Arc<Config>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Shared HTTP client, reused by the animation composer for downloads
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetch reveal status and attributes from the primary source.
    pub async fn fetch_reveal_metadata(&self, token_id: u64) -> Result<RevealMetadata, FetchError> {
        let url = format!("{}/{}", self.config.metadata_base_url, token_id);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: url,
                status,
            });
        }

        let metadata = response
            .json::<RevealMetadata>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        logger::debug(
            LogTag::Api,
            &format!(
                "token #{}: isRevealed={:?}, {} attributes",
                token_id,
                metadata.is_revealed,
                metadata.attributes.len()
            ),
        );

        Ok(metadata)
    }

    /// Fetch rarity rank, trait supply and floor prices from the secondary
    /// source. `Ok(None)` means the API answered but knows no such token.
    pub async fn fetch_rarity_metadata(
        &self,
        token_id: u64,
    ) -> Result<Option<RarityMetadata>, FetchError> {
        let url = self.config.reservoir_api_url.clone();
        let response = self
            .http
            .get(&url)
            .header("x-api-key", &self.config.reservoir_api_key)
            .query(&[
                (
                    "tokens",
                    format!("{}:{}", self.config.contract_address, token_id),
                ),
                ("includeAttributes", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: url,
                status,
            });
        }

        let body = response
            .json::<TokensResponse>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        Ok(body.tokens.into_iter().next().map(|envelope| envelope.token))
    }

    /// Download raw image bytes (used for the final reveal frame).
    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: url.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_metadata_tolerates_missing_fields() {
        let metadata: RevealMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(metadata.is_revealed, None);
        assert_eq!(metadata.revealed_at, None);
        assert_eq!(metadata.image, None);
        assert!(metadata.attributes.is_empty());
    }

    #[test]
    fn reveal_metadata_parses_full_body() {
        let body = r#"{
            "isRevealed": true,
            "revealedAt": "2025-03-21T02:47:00.000Z",
            "image": "https://example.com/102.png",
            "attributes": [
                {"trait_type": "Fur", "value": "Blue"},
                {"trait_type": "Generation", "value": 2}
            ]
        }"#;
        let metadata: RevealMetadata = serde_json::from_str(body).unwrap();
        assert_eq!(metadata.is_revealed, Some(true));
        assert_eq!(metadata.attributes.len(), 2);
        assert_eq!(metadata.attributes[0].trait_type, "Fur");
    }

    #[test]
    fn rarity_response_unwraps_token_envelope() {
        let body = r#"{
            "tokens": [{
                "token": {
                    "rarityRank": 42,
                    "attributes": [
                        {"key": "Fur", "value": "Blue", "tokenCount": 12,
                         "floorAskPrice": {"amount": {"decimal": 0.2, "usd": 450.0}}}
                    ],
                    "collection": {
                        "floorAskPrice": {"amount": {"decimal": 0.1, "usd": 225.0}}
                    }
                }
            }]
        }"#;
        let parsed: TokensResponse = serde_json::from_str(body).unwrap();
        let token = &parsed.tokens[0].token;
        assert_eq!(token.rarity_rank, Some(42.0));
        assert_eq!(token.attributes[0].token_count, Some(12));
        let floor = token.collection.as_ref().unwrap().floor_ask_price.as_ref();
        assert_eq!(floor.unwrap().amount.as_ref().unwrap().decimal, Some(0.1));
    }

    #[test]
    fn empty_tokens_array_is_absent() {
        let parsed: TokensResponse = serde_json::from_str(r#"{"tokens": []}"#).unwrap();
        assert!(parsed.tokens.is_empty());
    }
}

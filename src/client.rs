//! HTTP client for the analysis service.
//!
//! One GET per `(category, topic)`; the body is decoded with the tolerant
//! decoders in [`crate::flexible`] and folded into an [`OrganizationAnalysis`].
//! No retries, no timeouts: callers wrap `fetch` if they need either.

use futures::future::join_all;
use log::{debug, info, warn};
use reqwest::{header, Client};
use serde_json::Value;

use crate::category::AnalysisCategory;
use crate::error::{DecodeError, FetchError};
use crate::flexible::{decode_envelope, CategoryShape};
use crate::models::OrganizationAnalysis;

pub const DEFAULT_BASE_URL: &str = "https://compass-ai-internal-api.com";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root without a trailing slash, e.g. `https://host:8000`.
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// How a category's response body becomes a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseHandler {
    /// Political leaning: the server's `lean` text is used verbatim.
    Lean,
    /// Five-point categories: the label comes from the category's scale.
    Scored,
    /// Financial contributions: delegated to `fetch_financial`.
    Financial,
}

impl ResponseHandler {
    /// Exhaustive by construction: adding a category without a handler does
    /// not compile. `None` means the category must never be dispatched.
    pub fn for_category(category: AnalysisCategory) -> Option<Self> {
        match category {
            AnalysisCategory::PoliticalLeaning => Some(ResponseHandler::Lean),
            AnalysisCategory::DeiFriendliness
            | AnalysisCategory::Wokeness
            | AnalysisCategory::EnvironmentalImpact
            | AnalysisCategory::ImmigrationSupport
            | AnalysisCategory::TechnologyInnovation => Some(ResponseHandler::Scored),
            AnalysisCategory::FinancialContributions => Some(ResponseHandler::Financial),
            AnalysisCategory::Undefined => None,
        }
    }
}

pub struct AnalysisClient {
    config: ClientConfig,
    http: Client,
}

impl AnalysisClient {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let http = Client::builder().build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Uses a caller-built `reqwest::Client`.
    pub fn with_http_client(mut config: ClientConfig, http: Client) -> Self {
        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }
        Self { config, http }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// `{base}{endpoint}/{percent-encoded topic}`.
    pub fn request_url(&self, category: AnalysisCategory, topic: &str) -> String {
        format!(
            "{}{}/{}",
            self.config.base_url,
            category.endpoint(),
            urlencoding::encode(topic)
        )
    }

    /// Fetches and normalizes one analysis. All-or-nothing: any failure yields
    /// an error and no partial record.
    pub async fn fetch(&self, category: AnalysisCategory, topic: &str) -> Result<OrganizationAnalysis, FetchError> {
        let handler = ResponseHandler::for_category(category)
            .ok_or(FetchError::UnsupportedCategory(category))?;

        match handler {
            ResponseHandler::Lean | ResponseHandler::Scored => {
                let body = self.get_json(category, topic).await?;
                let analysis = normalize_scalar(category, handler, topic, &body)?;
                info!(
                    "Fetched {} for '{}': rating {} ({})",
                    category, analysis.topic, analysis.rating, analysis.lean_or_label
                );
                Ok(analysis)
            }
            ResponseHandler::Financial => {
                let overview = self.fetch_financial(topic).await?;
                Ok(OrganizationAnalysis::financial(topic, overview))
            }
        }
    }

    /// Runs one fetch per category concurrently. Results come back in the
    /// order of `categories`; a failure in one does not affect the others.
    pub async fn fetch_many(
        &self,
        categories: &[AnalysisCategory],
        topic: &str,
    ) -> Vec<(AnalysisCategory, Result<OrganizationAnalysis, FetchError>)> {
        let fetches = categories.iter().map(|&category| async move {
            let result = self.fetch(category, topic).await;
            if let Err(ref e) = result {
                warn!("{} fetch for '{}' failed: {}", category, topic, e);
            }
            (category, result)
        });
        join_all(fetches).await
    }

    /// Issues the GET and returns the parsed JSON body.
    pub(crate) async fn get_json(&self, category: AnalysisCategory, topic: &str) -> Result<Value, FetchError> {
        if ResponseHandler::for_category(category).is_none() {
            return Err(FetchError::UnsupportedCategory(category));
        }

        let url = self.request_url(category, topic);
        info!("Making request to: {}", url);

        let response = self
            .http
            .get(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP error {} from {}", status.as_u16(), url);
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(FetchError::NoData);
        }
        debug!("Received {} bytes from {}", bytes.len(), url);

        serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::Decode(DecodeError::InvalidJson(e.to_string())))
    }
}

/// Folds a political-leaning or five-point payload into the canonical record.
pub fn normalize_scalar(
    category: AnalysisCategory,
    handler: ResponseHandler,
    queried_topic: &str,
    body: &Value,
) -> Result<OrganizationAnalysis, DecodeError> {
    let shape = match handler {
        ResponseHandler::Lean => CategoryShape::Lean,
        _ => CategoryShape::Scored,
    };
    let fields = decode_envelope(body, shape)?;

    let lean_or_label = match handler {
        ResponseHandler::Lean => fields.lean.clone().unwrap_or_default(),
        _ => category.rating_label(fields.rating),
    };
    let topic = fields
        .metadata
        .as_ref()
        .and_then(|m| m.topic.clone())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| queried_topic.to_string());

    Ok(OrganizationAnalysis {
        topic,
        lean_or_label,
        rating: fields.rating,
        description: fields.context,
        category,
        has_financial_contributions: fields.created_with_financial_contributions_info,
        financial_contributions_text: None,
        financial_overview: None,
    })
}

//! API client for the text-analysis service.
//!
//! `ApiClient` dispatches every call through its interceptor pipeline: the
//! stored credential is attached on the way out, and a rejected credential
//! clears the session on the way back. Errors always reach the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ApiError, Interceptors};
use crate::auth::SessionStore;
use crate::config::ApiConfig;
use crate::models::{
    HistoryEntry, HistoryResponse, KeywordsRequest, KeywordsResult, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, SentimentResult, SimilarityRequest, SimilarityResult, Stats,
    SummaryRequest, SummaryResult, TextRequest,
};

// ============================================================================
// Endpoints
// ============================================================================

pub const LOGIN_ENDPOINT: &str = "/api/login";
pub const REGISTER_ENDPOINT: &str = "/api/register";
const SENTIMENT_ENDPOINT: &str = "/api/sentiment";
const KEYWORDS_ENDPOINT: &str = "/api/keywords";
const SUMMARY_ENDPOINT: &str = "/api/summary";
const SIMILARITY_ENDPOINT: &str = "/api/similarity";
const HISTORY_ENDPOINT: &str = "/api/history";
const STATS_ENDPOINT: &str = "/api/stats";
const LLM_SENTIMENT_ENDPOINT: &str = "/api/llm/sentiment";
const LLM_KEYWORDS_ENDPOINT: &str = "/api/llm/keywords";
const LLM_SUMMARY_ENDPOINT: &str = "/api/llm/summary";
const LLM_COMPREHENSIVE_ENDPOINT: &str = "/api/llm/comprehensive";
const LLM_HEALTH_ENDPOINT: &str = "/api/llm/health";
const HYBRID_ENDPOINT: &str = "/api/hybrid/analysis";

/// Authenticated client for the analysis service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    interceptors: Interceptors,
}

impl ApiClient {
    /// Client with the session interceptors backed by `store`.
    pub fn new(config: &ApiConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        Self::with_interceptors(config, Interceptors::session(store))
    }

    pub fn with_interceptors(config: &ApiConfig, interceptors: Interceptors) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            interceptors,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Run the pipeline around one request.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let mut request = builder.build()?;
        self.interceptors.apply_request(&mut request)?;

        let url = request.url().clone();
        debug!(method = %request.method(), path = url.path(), "Sending request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        debug!(path = url.path(), status = status.as_u16(), "Response received");

        self.interceptors.apply_response(&url, status);
        Self::check_response(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", path, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.client.request(Method::GET, self.url(path))).await?;
        Self::parse(response, path).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let response = self
            .send(self.client.request(Method::POST, self.url(path)).json(body))
            .await?;
        Self::parse(response, path).await
    }

    // ===== Account =====

    /// Exchange username/password for a token. Does not touch the session
    /// store; see `auth::flow::login`.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post(LOGIN_ENDPOINT, &body).await.context("Login failed")
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<MessageResponse> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post(REGISTER_ENDPOINT, &body).await.context("Registration failed")
    }

    // ===== Analysis =====

    pub async fn sentiment(&self, text: &str) -> Result<SentimentResult> {
        let body = TextRequest { text: text.to_string() };
        self.post(SENTIMENT_ENDPOINT, &body)
            .await
            .context("Sentiment analysis failed")
    }

    pub async fn keywords(&self, text: &str, top_k: u32) -> Result<KeywordsResult> {
        let body = KeywordsRequest {
            text: text.to_string(),
            top_k,
        };
        self.post(KEYWORDS_ENDPOINT, &body)
            .await
            .context("Keyword extraction failed")
    }

    pub async fn summary(&self, text: &str, max_length: u32) -> Result<SummaryResult> {
        let body = SummaryRequest {
            text: text.to_string(),
            max_length,
        };
        self.post(SUMMARY_ENDPOINT, &body)
            .await
            .context("Summary generation failed")
    }

    pub async fn similarity(&self, text1: &str, text2: &str) -> Result<SimilarityResult> {
        let body = SimilarityRequest {
            text1: text1.to_string(),
            text2: text2.to_string(),
        };
        self.post(SIMILARITY_ENDPOINT, &body)
            .await
            .context("Similarity calculation failed")
    }

    // ===== Dashboard data =====

    /// Most recent analyses of the current user, newest first.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        let response: HistoryResponse = self
            .get(HISTORY_ENDPOINT)
            .await
            .context("Failed to fetch history")?;
        Ok(response.history)
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.get(STATS_ENDPOINT).await.context("Failed to fetch statistics")
    }

    // ===== LLM-backed analysis (opaque results) =====

    pub async fn llm_sentiment(&self, text: &str) -> Result<Value> {
        let body = TextRequest { text: text.to_string() };
        self.post(LLM_SENTIMENT_ENDPOINT, &body)
            .await
            .context("LLM sentiment analysis failed")
    }

    pub async fn llm_keywords(&self, text: &str, top_k: u32) -> Result<Value> {
        let body = KeywordsRequest {
            text: text.to_string(),
            top_k,
        };
        self.post(LLM_KEYWORDS_ENDPOINT, &body)
            .await
            .context("LLM keyword extraction failed")
    }

    pub async fn llm_summary(&self, text: &str, max_length: u32) -> Result<Value> {
        let body = SummaryRequest {
            text: text.to_string(),
            max_length,
        };
        self.post(LLM_SUMMARY_ENDPOINT, &body)
            .await
            .context("LLM summary generation failed")
    }

    pub async fn llm_comprehensive(&self, text: &str) -> Result<Value> {
        let body = TextRequest { text: text.to_string() };
        self.post(LLM_COMPREHENSIVE_ENDPOINT, &body)
            .await
            .context("LLM comprehensive analysis failed")
    }

    pub async fn hybrid_analysis(&self, text: &str) -> Result<Value> {
        let body = TextRequest { text: text.to_string() };
        self.post(HYBRID_ENDPOINT, &body)
            .await
            .context("Hybrid analysis failed")
    }

    pub async fn llm_health(&self) -> Result<Value> {
        self.get(LLM_HEALTH_ENDPOINT)
            .await
            .context("Failed to fetch LLM health")
    }
}

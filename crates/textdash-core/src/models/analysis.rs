//! Request and result shapes of the analysis endpoints.
//!
//! The analysis itself runs on the server; these types only mirror the JSON.

use serde::{Deserialize, Serialize};

/// Keywords returned when the caller does not ask for a count
pub const DEFAULT_TOP_K: u32 = 10;

/// Summary length used when the caller does not ask for one
pub const DEFAULT_MAX_LENGTH: u32 = 200;

#[derive(Debug, Clone, Serialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordsRequest {
    pub text: String,
    pub top_k: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest {
    pub text: String,
    pub max_length: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarityRequest {
    pub text1: String,
    pub text2: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SentimentResult {
    pub sentiment: String,
    pub score: f64,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Keyword {
    pub word: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct KeywordsResult {
    #[serde(default)]
    pub tfidf_keywords: Vec<Keyword>,
    #[serde(default)]
    pub textrank_keywords: Vec<Keyword>,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SummaryResult {
    pub summary: String,
    pub length: u64,
    /// Absent when the text was short enough to be returned whole
    #[serde(default)]
    pub original_length: Option<u64>,
    #[serde(default)]
    pub compression_ratio: Option<f64>,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SimilarityResult {
    pub similarity_score: f64,
    pub similarity_percentage: f64,
    pub interpretation: String,
    #[serde(default)]
    pub method: Option<String>,
}

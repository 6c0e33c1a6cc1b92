//! Data models for the text-analysis service.
//!
//! - Account payloads: login and registration
//! - Analysis requests and results: sentiment, keywords, summary, similarity
//! - `HistoryEntry` and `Stats` for the dashboard views

pub mod account;
pub mod analysis;
pub mod history;

pub use account::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest};
pub use analysis::{
    Keyword, KeywordsRequest, KeywordsResult, SentimentResult, SimilarityRequest, SimilarityResult,
    SummaryRequest, SummaryResult, TextRequest, DEFAULT_MAX_LENGTH, DEFAULT_TOP_K,
};
pub use history::{AnalysisType, HistoryEntry, HistoryResponse, Stats};

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Timestamp format used by the history endpoint
const HISTORY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum AnalysisType {
    Sentiment,
    Keywords,
    Summary,
    Similarity,
    #[serde(other)]
    Other,
}

impl AnalysisType {
    pub fn display_name(&self) -> &'static str {
        match self {
            AnalysisType::Sentiment => "Sentiment",
            AnalysisType::Keywords => "Keywords",
            AnalysisType::Summary => "Summary",
            AnalysisType::Similarity => "Similarity",
            AnalysisType::Other => "Other",
        }
    }
}

/// One past analysis. `text` and `result` arrive already shortened by the
/// server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct HistoryEntry {
    pub id: i64,
    pub text: String,
    pub analysis_type: AnalysisType,
    pub result: String,
    #[serde(serialize_with = "serialize_time", deserialize_with = "deserialize_time")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Per-user counters from `/api/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Stats {
    #[serde(default)]
    pub total_analyses: u64,
    #[serde(default)]
    pub sentiment_count: u64,
    #[serde(default)]
    pub keywords_count: u64,
    #[serde(default)]
    pub summary_count: u64,
    #[serde(default)]
    pub similarity_count: u64,
}

impl Stats {
    /// Counts by type, in menu order.
    pub fn breakdown(&self) -> [(AnalysisType, u64); 4] {
        [
            (AnalysisType::Sentiment, self.sentiment_count),
            (AnalysisType::Keywords, self.keywords_count),
            (AnalysisType::Summary, self.summary_count),
            (AnalysisType::Similarity, self.similarity_count),
        ]
    }
}

fn serialize_time<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.format(HISTORY_TIME_FORMAT).to_string())
}

fn deserialize_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&raw, HISTORY_TIME_FORMAT).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_history_response() {
        let json = r#"{"history": [{"id": 3, "text": "The movie was great...", "analysis_type": "sentiment", "result": "{'sentiment': 'positive'}", "created_at": "2024-05-01 13:45:10"}, {"id": 2, "text": "x", "analysis_type": "translation", "result": "", "created_at": "2024-04-30 08:00:00"}]}"#;
        let parsed: HistoryResponse = serde_json::from_str(json).expect("parse history");

        assert_eq!(parsed.history.len(), 2);
        let first = &parsed.history[0];
        assert_eq!(first.analysis_type, AnalysisType::Sentiment);
        assert_eq!(first.created_at.year(), 2024);
        assert_eq!(first.created_at.hour(), 13);
        assert_eq!(parsed.history[1].analysis_type, AnalysisType::Other);
    }

    #[test]
    fn test_history_bad_timestamp_fails() {
        let json = r#"{"id": 1, "text": "", "analysis_type": "summary", "result": "", "created_at": "yesterday"}"#;
        assert!(serde_json::from_str::<HistoryEntry>(json).is_err());
    }

    #[test]
    fn test_created_at_serializes_in_service_format() {
        let json = r#"{"id": 1, "text": "", "analysis_type": "summary", "result": "", "created_at": "2024-05-01 13:45:10"}"#;
        let entry: HistoryEntry = serde_json::from_str(json).expect("parse entry");
        let value = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(value["created_at"], "2024-05-01 13:45:10");
    }

    #[test]
    fn test_stats_breakdown() {
        let stats: Stats = serde_json::from_str(
            r#"{"total_analyses": 6, "sentiment_count": 3, "keywords_count": 1, "summary_count": 2, "similarity_count": 0}"#,
        )
        .expect("parse stats");
        assert_eq!(stats.breakdown()[0], (AnalysisType::Sentiment, 3));
        assert_eq!(stats.breakdown().iter().map(|(_, n)| n).sum::<u64>(), stats.total_analyses);
    }
}

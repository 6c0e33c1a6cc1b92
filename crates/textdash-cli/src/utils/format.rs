use chrono::NaiveDateTime;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

/// Format a history timestamp for display
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format("%b %d, %Y %H:%M").to_string()
}

/// Render a 0..1 ratio as a percentage with one decimal
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Fixed-width text bar for a 0..1 weight
pub fn weight_bar(weight: f64, width: usize) -> String {
    let filled = (weight.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

//! Utility functions for string formatting.

pub mod format;

pub use format::{format_optional, format_ratio, format_timestamp, truncate_string, weight_bar};

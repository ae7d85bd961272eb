use chrono::{Local, NaiveDateTime};
use pipelog_parser::scan_timestamp;
use uuid::Uuid;

/// a single line read from a log source
#[derive(Debug, Clone)]
pub struct LogItem {
    pub id: Uuid,
    /// wall clock time the line was received
    pub time: String,
    /// timestamp found in the line itself, if any
    pub timestamp: Option<NaiveDateTime>,
    pub content: String,
}

impl LogItem {
    pub fn new(content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: Local::now().format("%H:%M:%S%.3f").to_string(),
            timestamp: scan_timestamp(&content),
            content,
        }
    }

    /// first non-blank line of the content, trimmed, for the list view
    pub fn preview(&self) -> &str {
        self.content
            .split('\n')
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }
}

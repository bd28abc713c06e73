use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub severity: AlertSeverity,
    pub source: String,
    pub event_type: String,
    pub message: String,
    pub details: Value,
    pub occurred_at: DateTime<Utc>,
}

impl AlertPayload {
    pub fn new(
        severity: AlertSeverity,
        source: &str,
        event_type: &str,
        message: String,
        details: Value,
    ) -> Self {
        Self {
            severity,
            source: source.to_string(),
            event_type: event_type.to_string(),
            message,
            details,
            occurred_at: Utc::now(),
        }
    }
}

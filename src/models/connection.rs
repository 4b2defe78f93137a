use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    Partial,
    Error,
}

/// Result of probing one upstream service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionCheck {
    pub service: String,
    pub status: CheckStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub overall: OverallStatus,
    pub results: Vec<ConnectionCheck>,
}

impl ConnectionReport {
    pub fn from_checks(results: Vec<ConnectionCheck>) -> Self {
        let ok = results
            .iter()
            .filter(|r| r.status == CheckStatus::Success)
            .count();
        let overall = if !results.is_empty() && ok == results.len() {
            OverallStatus::Success
        } else if ok > 0 {
            OverallStatus::Partial
        } else {
            OverallStatus::Error
        };
        Self { overall, results }
    }
}

use serde::{Deserialize, Serialize};

use og_core::services::CleanupRunRecord;

/// Body of `POST /ops/cleanup/run`. A missing `confirm` counts as `false`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunCleanupRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// Result of a manual cleanup run, including aborted ones
#[derive(Debug, Clone, Serialize)]
pub struct CleanupRunResponse {
    pub safety_passed: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,

    pub run: Option<CleanupRunRecord>,
}

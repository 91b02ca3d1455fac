//! Request and response bodies of the document API.

use serde::{Deserialize, Serialize};

/// One entry of `GET /pdfs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfEntry {
    pub name: String,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackAccessRequest {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Analytics {
    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub unique_pdfs: u64,
    #[serde(default)]
    pub today_views: u64,
    #[serde(default)]
    pub pdf_stats: Vec<PdfStat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfStat {
    pub filename: String,
    #[serde(default)]
    pub total_opens: u64,
    /// Raw server timestamp; `None` when the document was never opened.
    #[serde(default)]
    pub last_accessed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PdfDetails {
    #[serde(default)]
    pub accesses: Vec<AccessRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub timestamp: String,
}

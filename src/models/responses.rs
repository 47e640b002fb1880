use serde::{Deserialize, Serialize};
use crate::models::domain::{BreedingMatch, MatchView};
use crate::services::CacheStats;

/// Response for the discover matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverMatchesResponse {
    pub created: Vec<BreedingMatch>,
    pub candidates_considered: usize,
    pub duplicates_skipped: usize,
}

/// Response for the list matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchListResponse {
    pub matches: Vec<MatchView>,
    pub total_results: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub cache: CacheStats,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Delete response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub id: String,
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health status value that makes an animal eligible for breeding
pub const HEALTHY: &str = "healthy";

/// Sex of a registered animal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn opposite(&self) -> Sex {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered animal (row of the `cows` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: String,
    pub name: String,
    pub breed: String,
    pub age: f64,
    #[serde(rename = "gender")]
    pub sex: Sex,
    pub health_status: String,
    #[serde(rename = "milk_production", default)]
    pub milk_yield: Option<f64>,
    #[serde(default)]
    pub genetic_history: Option<String>,
    #[serde(default)]
    pub location_lat: Option<f64>,
    #[serde(default)]
    pub location_lng: Option<f64>,
    pub owner_id: String,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Animal {
    pub fn is_healthy(&self) -> bool {
        self.health_status == HEALTHY
    }

    pub fn is_owned_by(&self, actor_id: &str) -> bool {
        self.owner_id == actor_id
    }
}

/// Lifecycle status of a breeding match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Rejected => "rejected",
        }
    }

    /// Only a pending match may move, and only to accepted or rejected.
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Pending, MatchStatus::Accepted) | (MatchStatus::Pending, MatchStatus::Rejected)
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proposed breeding pairing (row of the `breeding_matches` table)
///
/// `cow1_id` is the animal discovery was run for, `cow2_id` the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedingMatch {
    pub id: String,
    pub cow1_id: String,
    pub cow2_id: String,
    pub compatibility_score: f64,
    pub status: MatchStatus,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl BreedingMatch {
    /// The other side of the pair, if `animal_id` is one of them
    pub fn partner_of(&self, animal_id: &str) -> Option<&str> {
        if self.cow1_id == animal_id {
            Some(&self.cow2_id)
        } else if self.cow2_id == animal_id {
            Some(&self.cow1_id)
        } else {
            None
        }
    }
}

/// A match joined with both of its animals for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub breeding_match: BreedingMatch,
    pub cow1: Option<Animal>,
    pub cow2: Option<Animal>,
}

/// Kind of welfare incident being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    IllegalTransport,
    Mistreatment,
    Abandonment,
    UnsafeConditions,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Investigating,
    Resolved,
}

/// Welfare incident report (row of the `welfare_reports` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelfareReport {
    pub id: String,
    pub incident_type: IncidentType,
    pub description: String,
    pub location_lat: f64,
    pub location_lng: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: ReportStatus,
    pub reporter_id: String,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Scoring weights for the compatibility heuristic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub breed: f64,
    pub age: f64,
    pub health: f64,
    pub milk: f64,
    /// Age difference (years) at which the age term reaches zero
    pub age_window_years: f64,
    /// Female milk yield (litres/day) that must be exceeded for the milk bonus
    pub milk_threshold_lpd: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            breed: 0.3,
            age: 0.2,
            health: 0.3,
            milk: 0.2,
            age_window_years: 5.0,
            milk_threshold_lpd: 15.0,
        }
    }
}

/// Match creation policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Minimum score (inclusive) for a match to be created
    pub min_score: f64,
    /// Skip pairs that already have a match in any status
    pub dedupe_pairs: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            min_score: 0.7,
            dedupe_pairs: true,
        }
    }
}

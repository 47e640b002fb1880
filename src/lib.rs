//! Herd Match - cattle registry, breeding match and welfare reporting service
//!
//! The library holds the matching core (compatibility scoring, candidate
//! filtering and the match lifecycle), the data collaborators it runs
//! against, and the actix-web routes that expose it.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{compatibility_score, ActorContext, CoreError, MatchLifecycle, Registry, WelfareDesk};
pub use crate::models::{Animal, BreedingMatch, MatchPolicy, MatchStatus, ScoringWeights, Sex, WelfareReport};

// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Animal, BreedingMatch, IncidentType, MatchPolicy, MatchStatus, MatchView, ReportStatus,
    ScoringWeights, Sex, WelfareReport, HEALTHY,
};
pub use requests::{AnimalUpdate, NewAnimal, NewWelfareReport, SetMatchStatusRequest};
pub use responses::{DeletedResponse, DiscoverMatchesResponse, ErrorResponse, HealthResponse, MatchListResponse};

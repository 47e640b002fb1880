// Core exports
pub mod context;
pub mod error;
pub mod filters;
pub mod lifecycle;
pub mod registry;
pub mod scoring;
pub mod welfare;

pub use context::{Actor, ActorContext};
pub use error::{CoreError, CoreResult};
pub use filters::{candidate_filter, is_breeding_candidate, matches_involving};
pub use lifecycle::{DiscoveryOutcome, MatchLifecycle, TransitionOutcome};
pub use registry::Registry;
pub use scoring::compatibility_score;
pub use welfare::WelfareDesk;

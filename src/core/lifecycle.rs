use crate::core::context::ActorContext;
use crate::core::error::{CoreError, CoreResult};
use crate::core::filters::{candidate_filter, is_breeding_candidate, matches_involving, pairs};
use crate::core::scoring::compatibility_score;
use crate::models::{Animal, BreedingMatch, MatchPolicy, MatchStatus, MatchView, ScoringWeights};
use crate::services::store::{from_record, from_records, to_record, DataStore, Filter, Table};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Result of a discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Newly created matches, best score first
    pub created: Vec<BreedingMatch>,
    pub candidates_considered: usize,
    pub duplicates_skipped: usize,
    /// Owners whose match listings changed
    pub affected_owners: BTreeSet<String>,
}

/// Result of a status transition
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub updated: BreedingMatch,
    pub affected_owners: BTreeSet<String>,
}

#[derive(Serialize)]
struct NewMatchRow<'a> {
    cow1_id: &'a str,
    cow2_id: &'a str,
    compatibility_score: f64,
    status: MatchStatus,
}

/// Match discovery, listing and status transitions
///
/// # Discovery
/// 1. Resolve the source animal, which must belong to the actor
/// 2. Fetch healthy opposite-sex animals of the same breed owned by others
/// 3. Score each candidate
/// 4. Persist a pending match for every candidate at or above the threshold
///
/// A source whose health status is not `healthy` yields no matches at all.
/// Earlier releases still scored such a source and could create a 0.7 match
/// from breed, age and milk alone.
#[derive(Clone)]
pub struct MatchLifecycle {
    store: Arc<dyn DataStore>,
    weights: ScoringWeights,
    policy: MatchPolicy,
}

impl MatchLifecycle {
    pub fn new(store: Arc<dyn DataStore>, weights: ScoringWeights, policy: MatchPolicy) -> Self {
        Self {
            store,
            weights,
            policy,
        }
    }

    pub fn with_defaults(store: Arc<dyn DataStore>) -> Self {
        Self::new(store, ScoringWeights::default(), MatchPolicy::default())
    }

    async fn load_animal(&self, id: &str) -> CoreResult<Option<Animal>> {
        match self.store.find_by_id(Table::Cows, id).await? {
            Some(row) => Ok(Some(from_record(row)?)),
            None => Ok(None),
        }
    }

    async fn load_animals(&self, ids: &BTreeSet<String>) -> CoreResult<HashMap<String, Animal>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self
            .store
            .select(Table::Cows, &Filter::new().in_list("id", ids.iter().cloned()))
            .await?;

        Ok(from_records::<Animal>(rows)?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect())
    }

    async fn existing_partners(&self, source_id: &str) -> CoreResult<Vec<BreedingMatch>> {
        let rows = self
            .store
            .select(Table::BreedingMatches, &matches_involving(&[source_id.to_string()]))
            .await?;
        Ok(from_records(rows)?)
    }

    /// Find and persist matches for one of the actor's animals
    pub async fn discover_matches(&self, ctx: &ActorContext, source_id: &str) -> CoreResult<DiscoveryOutcome> {
        let actor = ctx.require_actor()?;

        let source = self
            .load_animal(source_id)
            .await?
            .filter(|a| a.is_owned_by(&actor.id))
            .ok_or_else(|| CoreError::not_found("animal", source_id))?;

        let mut outcome = DiscoveryOutcome {
            created: Vec::new(),
            candidates_considered: 0,
            duplicates_skipped: 0,
            affected_owners: BTreeSet::new(),
        };

        if !source.is_healthy() {
            tracing::info!(
                "Animal {} is '{}', not eligible for matching",
                source.id,
                source.health_status
            );
            return Ok(outcome);
        }

        let rows = self
            .store
            .select(Table::Cows, &candidate_filter(&source, &actor.id))
            .await?;

        // Re-check in memory; the store filter compares text forms only
        let candidates: Vec<Animal> = from_records::<Animal>(rows)?
            .into_iter()
            .filter(|c| is_breeding_candidate(&source, c, &actor.id))
            .collect();

        outcome.candidates_considered = candidates.len();
        tracing::debug!("Found {} candidates for animal {}", candidates.len(), source.id);

        let mut existing = if self.policy.dedupe_pairs {
            self.existing_partners(&source.id).await?
        } else {
            Vec::new()
        };

        for candidate in &candidates {
            let score = compatibility_score(&source, candidate, &self.weights);
            if score < self.policy.min_score {
                continue;
            }

            if self.policy.dedupe_pairs && existing.iter().any(|m| pairs(m, &source.id, &candidate.id)) {
                outcome.duplicates_skipped += 1;
                continue;
            }

            let row = to_record(&NewMatchRow {
                cow1_id: &source.id,
                cow2_id: &candidate.id,
                compatibility_score: score,
                status: MatchStatus::Pending,
            })?;

            let created: BreedingMatch = from_record(self.store.insert(Table::BreedingMatches, row).await?)?;
            tracing::debug!(
                "Created match {} ({} x {}, score {:.2})",
                created.id,
                source.id,
                candidate.id,
                score
            );

            outcome.affected_owners.insert(candidate.owner_id.clone());
            existing.push(created.clone());
            outcome.created.push(created);
        }

        if !outcome.created.is_empty() {
            outcome.affected_owners.insert(source.owner_id.clone());
        }

        outcome.created.sort_by(|a, b| {
            b.compatibility_score
                .partial_cmp(&a.compatibility_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::info!(
            "Discovery for animal {}: {} created, {} duplicates skipped (from {} candidates)",
            source.id,
            outcome.created.len(),
            outcome.duplicates_skipped,
            outcome.candidates_considered
        );

        Ok(outcome)
    }

    /// All matches touching the actor's animals, joined with both animals
    pub async fn list_matches(&self, ctx: &ActorContext) -> CoreResult<Vec<MatchView>> {
        let actor = ctx.require_actor()?;

        let own_rows = self
            .store
            .select(Table::Cows, &Filter::new().eq("owner_id", actor.id.as_str()))
            .await?;
        let own_ids: Vec<String> = from_records::<Animal>(own_rows)?
            .into_iter()
            .map(|a| a.id)
            .collect();

        if own_ids.is_empty() {
            return Ok(Vec::new());
        }

        let match_rows = self
            .store
            .select(Table::BreedingMatches, &matches_involving(&own_ids))
            .await?;
        let matches: Vec<BreedingMatch> = from_records(match_rows)?;

        let referenced: BTreeSet<String> = matches
            .iter()
            .flat_map(|m| [m.cow1_id.clone(), m.cow2_id.clone()])
            .collect();
        let animals = self.load_animals(&referenced).await?;

        let mut views: Vec<MatchView> = matches
            .into_iter()
            .map(|m| {
                let cow1 = animals.get(&m.cow1_id).cloned();
                let cow2 = animals.get(&m.cow2_id).cloned();
                if cow1.is_none() || cow2.is_none() {
                    tracing::warn!("Match {} references a missing animal", m.id);
                }
                MatchView {
                    breeding_match: m,
                    cow1,
                    cow2,
                }
            })
            .collect();

        views.sort_by(|a, b| {
            b.breeding_match
                .compatibility_score
                .partial_cmp(&a.breeding_match.compatibility_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(views)
    }

    /// Accept or reject a pending match on behalf of an owner of either animal
    pub async fn set_match_status(
        &self,
        ctx: &ActorContext,
        match_id: &str,
        status: MatchStatus,
    ) -> CoreResult<TransitionOutcome> {
        let actor = ctx.require_actor()?;

        if status == MatchStatus::Pending {
            return Err(CoreError::Validation(
                "status must be 'accepted' or 'rejected'".to_string(),
            ));
        }

        let current: BreedingMatch = match self.store.find_by_id(Table::BreedingMatches, match_id).await? {
            Some(row) => from_record(row)?,
            None => return Err(CoreError::not_found("match", match_id)),
        };

        let ids: BTreeSet<String> = [current.cow1_id.clone(), current.cow2_id.clone()].into();
        let owners: BTreeSet<String> = self
            .load_animals(&ids)
            .await?
            .into_values()
            .map(|a| a.owner_id)
            .collect();

        if !owners.contains(&actor.id) {
            tracing::warn!("Actor {} tried to change match {} without owning either animal", actor.id, match_id);
            return Err(CoreError::AccessDenied(format!(
                "match {} does not involve any of your animals",
                match_id
            )));
        }

        if !current.status.can_transition_to(status) {
            return Err(CoreError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let mut patch = serde_json::Map::new();
        patch.insert("status".to_string(), Value::String(status.as_str().to_string()));

        let updated: BreedingMatch = from_record(
            self.store
                .update(Table::BreedingMatches, match_id, patch)
                .await?,
        )?;

        tracing::info!("Match {} moved {} -> {} by {}", match_id, current.status, updated.status, actor.id);

        Ok(TransitionOutcome {
            updated,
            affected_owners: owners,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;
    use crate::services::MemoryStore;

    fn create_animal(id: &str, owner: &str, sex: Sex, age: f64, milk: Option<f64>) -> Animal {
        Animal {
            id: id.to_string(),
            name: format!("Cow {}", id),
            breed: "Gir".to_string(),
            age,
            sex,
            health_status: "healthy".to_string(),
            milk_yield: milk,
            genetic_history: None,
            location_lat: None,
            location_lng: None,
            owner_id: owner.to_string(),
            created_at: None,
        }
    }

    async fn seed(store: &MemoryStore, animals: &[Animal]) {
        for animal in animals {
            store.insert(Table::Cows, to_record(animal).unwrap()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_discover_requires_actor() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = MatchLifecycle::with_defaults(store);

        let result = lifecycle.discover_matches(&ActorContext::anonymous(), "a").await;
        assert!(matches!(result, Err(CoreError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_discover_foreign_source_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &[create_animal("a", "alice", Sex::Female, 4.0, Some(18.0))]).await;
        let lifecycle = MatchLifecycle::with_defaults(store);

        let result = lifecycle.discover_matches(&ActorContext::for_actor("bob"), "a").await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_discover_orders_pair_source_first() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            &[
                create_animal("a", "alice", Sex::Female, 4.0, Some(18.0)),
                create_animal("b", "bob", Sex::Male, 5.0, None),
            ],
        )
        .await;
        let lifecycle = MatchLifecycle::with_defaults(store.clone());

        let outcome = lifecycle
            .discover_matches(&ActorContext::for_actor("alice"), "a")
            .await
            .unwrap();

        assert_eq!(outcome.created.len(), 1);
        let m = &outcome.created[0];
        assert_eq!((m.cow1_id.as_str(), m.cow2_id.as_str()), ("a", "b"));
        assert_eq!(m.status, MatchStatus::Pending);
        assert!((m.compatibility_score - 0.96).abs() < 1e-9);
        assert!(outcome.affected_owners.contains("alice"));
        assert!(outcome.affected_owners.contains("bob"));
    }

    #[tokio::test]
    async fn test_unhealthy_source_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut sick = create_animal("a", "alice", Sex::Female, 4.0, Some(18.0));
        sick.health_status = "lame".to_string();
        seed(&store, &[sick, create_animal("b", "bob", Sex::Male, 4.0, None)]).await;
        let lifecycle = MatchLifecycle::with_defaults(store.clone());

        let outcome = lifecycle
            .discover_matches(&ActorContext::for_actor("alice"), "a")
            .await
            .unwrap();

        assert!(outcome.created.is_empty());
        assert_eq!(store.row_count(Table::BreedingMatches).await, 0);
    }
}

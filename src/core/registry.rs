use crate::core::context::ActorContext;
use crate::core::error::{CoreError, CoreResult};
use crate::core::filters::matches_involving;
use crate::models::{Animal, AnimalUpdate, BreedingMatch, NewAnimal};
use crate::services::store::{from_record, from_records, to_record, DataStore, Direction, Filter, Table};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::Validate;

/// Animal registry
///
/// Listing is open to everyone. Writes require an actor, and updates and
/// deletes are limited to the animal's owner.
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn DataStore>,
}

impl Registry {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Every registered animal, newest first
    pub async fn list_animals(&self) -> CoreResult<Vec<Animal>> {
        let rows = self
            .store
            .select(Table::Cows, &Filter::new().order_by("created_at", Direction::Descending))
            .await?;
        Ok(from_records(rows)?)
    }

    /// The actor's own animals, newest first
    pub async fn list_owned(&self, ctx: &ActorContext) -> CoreResult<Vec<Animal>> {
        let actor = ctx.require_actor()?;
        let filter = Filter::new()
            .eq("owner_id", actor.id.as_str())
            .order_by("created_at", Direction::Descending);

        Ok(from_records(self.store.select(Table::Cows, &filter).await?)?)
    }

    pub async fn get_animal(&self, id: &str) -> CoreResult<Animal> {
        match self.store.find_by_id(Table::Cows, id).await? {
            Some(row) => Ok(from_record(row)?),
            None => Err(CoreError::not_found("animal", id)),
        }
    }

    /// Load an animal and check that the actor owns it
    async fn owned_animal(&self, ctx: &ActorContext, id: &str) -> CoreResult<Animal> {
        let actor = ctx.require_actor()?;
        let animal = self.get_animal(id).await?;

        if !animal.is_owned_by(&actor.id) {
            tracing::warn!("Actor {} tried to modify animal {} owned by {}", actor.id, id, animal.owner_id);
            return Err(CoreError::AccessDenied(format!("animal {} belongs to another owner", id)));
        }
        Ok(animal)
    }

    pub async fn create_animal(&self, ctx: &ActorContext, new_animal: NewAnimal) -> CoreResult<Animal> {
        let actor = ctx.require_actor()?;
        new_animal.validate()?;

        let mut row = to_record(&new_animal)?;
        row.insert("owner_id".to_string(), Value::String(actor.id.clone()));

        let created: Animal = from_record(self.store.insert(Table::Cows, row).await?)?;
        tracing::info!("Registered animal {} ({}) for {}", created.id, created.breed, actor.id);
        Ok(created)
    }

    pub async fn update_animal(&self, ctx: &ActorContext, id: &str, update: AnimalUpdate) -> CoreResult<Animal> {
        ctx.require_actor()?;
        update.validate()?;
        if update.is_empty() {
            return Err(CoreError::Validation("update must change at least one field".to_string()));
        }

        self.owned_animal(ctx, id).await?;

        let patch = to_record(&update)?;
        let updated: Animal = from_record(self.store.update(Table::Cows, id, patch).await?)?;
        tracing::debug!("Updated animal {}", id);
        Ok(updated)
    }

    /// Delete one of the actor's animals
    ///
    /// Returns the owners whose match listings referenced the animal: the
    /// actor plus the owner of every partner. Match rows are left in place.
    pub async fn delete_animal(&self, ctx: &ActorContext, id: &str) -> CoreResult<BTreeSet<String>> {
        let animal = self.owned_animal(ctx, id).await?;

        let matches: Vec<BreedingMatch> = from_records(
            self.store
                .select(Table::BreedingMatches, &matches_involving(&[id.to_string()]))
                .await?,
        )?;
        let partner_ids: BTreeSet<String> = matches
            .iter()
            .filter_map(|m| m.partner_of(id))
            .map(str::to_string)
            .collect();

        let mut affected_owners = BTreeSet::from([animal.owner_id]);
        if !partner_ids.is_empty() {
            let rows = self
                .store
                .select(Table::Cows, &Filter::new().in_list("id", partner_ids))
                .await?;
            affected_owners.extend(from_records::<Animal>(rows)?.into_iter().map(|a| a.owner_id));
        }

        self.store.delete(Table::Cows, id).await?;
        tracing::info!("Deleted animal {} ({} matches left orphaned)", id, matches.len());
        Ok(affected_owners)
    }
}

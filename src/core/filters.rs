use crate::models::{Animal, BreedingMatch, HEALTHY};
use crate::services::store::{Filter, Predicate};

/// Check if `candidate` may be paired with `source` for an actor
///
/// The candidate must belong to someone else, be a different animal, share
/// the breed, be healthy and be of the opposite sex.
#[inline]
pub fn is_breeding_candidate(source: &Animal, candidate: &Animal, actor_id: &str) -> bool {
    if candidate.is_owned_by(actor_id) || candidate.id == source.id {
        return false;
    }

    candidate.breed == source.breed && candidate.is_healthy() && candidate.sex == source.sex.opposite()
}

/// Store-side form of [`is_breeding_candidate`]
pub fn candidate_filter(source: &Animal, actor_id: &str) -> Filter {
    Filter::new()
        .neq("owner_id", actor_id)
        .eq("breed", source.breed.as_str())
        .eq("health_status", HEALTHY)
        .neq("gender", source.sex.as_str())
}

/// Matches touching any of `animal_ids`, on either side
pub fn matches_involving(animal_ids: &[String]) -> Filter {
    Filter::new().any_of(vec![
        Predicate::in_list("cow1_id", animal_ids.iter().cloned()),
        Predicate::in_list("cow2_id", animal_ids.iter().cloned()),
    ])
}

/// Check if a match already pairs the two animals, in either order
#[inline]
pub fn pairs(existing: &BreedingMatch, a: &str, b: &str) -> bool {
    (existing.cow1_id == a && existing.cow2_id == b) || (existing.cow1_id == b && existing.cow2_id == a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStatus, Sex};
    use serde_json::json;

    fn create_test_animal(id: &str, owner: &str, breed: &str, sex: Sex, health: &str) -> Animal {
        Animal {
            id: id.to_string(),
            name: format!("Cow {}", id),
            breed: breed.to_string(),
            age: 4.0,
            sex,
            health_status: health.to_string(),
            milk_yield: None,
            genetic_history: None,
            location_lat: None,
            location_lng: None,
            owner_id: owner.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_candidate_passes() {
        let source = create_test_animal("s", "me", "Gir", Sex::Female, "healthy");
        let candidate = create_test_animal("c", "them", "Gir", Sex::Male, "healthy");
        assert!(is_breeding_candidate(&source, &candidate, "me"));
    }

    #[test]
    fn test_own_animal_excluded() {
        let source = create_test_animal("s", "me", "Gir", Sex::Female, "healthy");
        let candidate = create_test_animal("c", "me", "Gir", Sex::Male, "healthy");
        assert!(!is_breeding_candidate(&source, &candidate, "me"));
    }

    #[test]
    fn test_breed_sex_and_health_required() {
        let source = create_test_animal("s", "me", "Gir", Sex::Female, "healthy");

        let other_breed = create_test_animal("c1", "them", "Sahiwal", Sex::Male, "healthy");
        let same_sex = create_test_animal("c2", "them", "Gir", Sex::Female, "healthy");
        let sick = create_test_animal("c3", "them", "Gir", Sex::Male, "under treatment");

        assert!(!is_breeding_candidate(&source, &other_breed, "me"));
        assert!(!is_breeding_candidate(&source, &same_sex, "me"));
        assert!(!is_breeding_candidate(&source, &sick, "me"));
    }

    #[test]
    fn test_candidate_filter_agrees_with_predicate() {
        let source = create_test_animal("s", "me", "Gir", Sex::Female, "healthy");
        let candidate = create_test_animal("c", "them", "Gir", Sex::Male, "healthy");
        let filter = candidate_filter(&source, "me");

        let row = serde_json::to_value(&candidate).unwrap();
        assert!(filter.matches(row.as_object().unwrap()));

        let mine = json!({"owner_id": "me", "breed": "Gir", "health_status": "healthy", "gender": "male"});
        assert!(!filter.matches(mine.as_object().unwrap()));
    }

    #[test]
    fn test_pairs_is_unordered() {
        let m = BreedingMatch {
            id: "m".to_string(),
            cow1_id: "a".to_string(),
            cow2_id: "b".to_string(),
            compatibility_score: 0.9,
            status: MatchStatus::Pending,
            created_at: None,
        };

        assert!(pairs(&m, "a", "b"));
        assert!(pairs(&m, "b", "a"));
        assert!(!pairs(&m, "a", "c"));
    }
}

// Unit tests for Herd Match scoring and candidate filtering

use herd_match::core::{candidate_filter, compatibility_score, filters::pairs, is_breeding_candidate};
use herd_match::models::{Animal, BreedingMatch, MatchStatus, ScoringWeights, Sex};
use herd_match::services::store::to_record;

fn animal(id: &str, breed: &str, age: f64, sex: Sex, health: &str, milk: Option<f64>, owner: &str) -> Animal {
    Animal {
        id: id.to_string(),
        name: format!("Cow {}", id),
        breed: breed.to_string(),
        age,
        sex,
        health_status: health.to_string(),
        milk_yield: milk,
        genetic_history: None,
        location_lat: None,
        location_lng: None,
        owner_id: owner.to_string(),
        created_at: None,
    }
}

fn gir_female(age: f64, milk: Option<f64>) -> Animal {
    animal("f", "Gir", age, Sex::Female, "healthy", milk, "farmer-1")
}

fn gir_male(age: f64) -> Animal {
    animal("m", "Gir", age, Sex::Male, "healthy", None, "farmer-2")
}

#[test]
fn test_reference_pair_scores_096() {
    let weights = ScoringWeights::default();
    let score = compatibility_score(&gir_female(4.0, Some(18.0)), &gir_male(5.0), &weights);

    assert!((score - 0.96).abs() < 1e-9, "score was {}", score);
}

#[test]
fn test_strong_pairs_clear_060() {
    let weights = ScoringWeights::default();

    for (female_age, male_age) in [(3.0, 3.0), (4.0, 5.0), (6.5, 5.5), (2.0, 2.25)] {
        let score = compatibility_score(&gir_female(female_age, Some(15.5)), &gir_male(male_age), &weights);
        assert!(score >= 0.6, "ages {} / {} scored {}", female_age, male_age, score);
    }
}

#[test]
fn test_score_independent_of_argument_order() {
    let weights = ScoringWeights::default();
    let female = gir_female(4.0, Some(18.0));
    let male = gir_male(7.5);

    assert_eq!(
        compatibility_score(&female, &male, &weights),
        compatibility_score(&male, &female, &weights)
    );
}

#[test]
fn test_maximum_score_is_exactly_one() {
    let weights = ScoringWeights::default();
    let score = compatibility_score(&gir_female(5.0, Some(20.0)), &gir_male(5.0), &weights);

    assert_eq!(score, 1.0);
}

#[test]
fn test_score_clamped_for_oversized_weights() {
    let weights = ScoringWeights {
        breed: 0.9,
        age: 0.9,
        health: 0.9,
        milk: 0.9,
        ..ScoringWeights::default()
    };

    let score = compatibility_score(&gir_female(5.0, Some(20.0)), &gir_male(5.0), &weights);
    assert_eq!(score, 1.0);
}

#[test]
fn test_milk_threshold_is_strict() {
    let weights = ScoringWeights::default();
    let at_threshold = compatibility_score(&gir_female(5.0, Some(15.0)), &gir_male(5.0), &weights);
    let above = compatibility_score(&gir_female(5.0, Some(15.01)), &gir_male(5.0), &weights);

    assert!((at_threshold - 0.8).abs() < 1e-9);
    assert_eq!(above, 1.0);
}

#[test]
fn test_milk_ignored_for_same_sex_pair() {
    let weights = ScoringWeights::default();
    let a = gir_female(5.0, Some(25.0));
    let b = animal("g", "Gir", 5.0, Sex::Female, "healthy", Some(25.0), "farmer-2");

    assert!((compatibility_score(&a, &b, &weights) - 0.8).abs() < 1e-9);
}

#[test]
fn test_age_term_reaches_zero_at_window() {
    let weights = ScoringWeights::default();
    let far = compatibility_score(&gir_female(2.0, None), &gir_male(9.0), &weights);
    let edge = compatibility_score(&gir_female(2.0, None), &gir_male(7.0), &weights);

    assert!((far - 0.6).abs() < 1e-9);
    assert!((edge - 0.6).abs() < 1e-9);
}

#[test]
fn test_unhealthy_and_cross_breed_pairs_score_low() {
    let weights = ScoringWeights::default();
    let sick = animal("s", "Gir", 5.0, Sex::Male, "sick", None, "farmer-2");
    let sahiwal = animal("h", "Sahiwal", 5.0, Sex::Male, "healthy", None, "farmer-2");
    let female = gir_female(5.0, Some(20.0));

    assert!(compatibility_score(&female, &sick, &weights) < 0.7);
    assert!(compatibility_score(&female, &sahiwal, &weights) < 0.7);
}

#[test]
fn test_candidate_rules() {
    let source = gir_female(4.0, Some(18.0));

    assert!(is_breeding_candidate(&source, &gir_male(5.0), "farmer-1"));

    // own animal
    let own = animal("o", "Gir", 5.0, Sex::Male, "healthy", None, "farmer-1");
    assert!(!is_breeding_candidate(&source, &own, "farmer-1"));

    // same sex
    let heifer = animal("h", "Gir", 5.0, Sex::Female, "healthy", None, "farmer-2");
    assert!(!is_breeding_candidate(&source, &heifer, "farmer-1"));

    // other breed
    let sahiwal = animal("s", "Sahiwal", 5.0, Sex::Male, "healthy", None, "farmer-2");
    assert!(!is_breeding_candidate(&source, &sahiwal, "farmer-1"));

    // not healthy
    let sick = animal("k", "Gir", 5.0, Sex::Male, "under_treatment", None, "farmer-2");
    assert!(!is_breeding_candidate(&source, &sick, "farmer-1"));
}

#[test]
fn test_store_filter_agrees_with_candidate_rules() {
    let source = gir_female(4.0, Some(18.0));
    let filter = candidate_filter(&source, "farmer-1");

    let population = vec![
        gir_male(5.0),
        animal("o", "Gir", 5.0, Sex::Male, "healthy", None, "farmer-1"),
        animal("h", "Gir", 5.0, Sex::Female, "healthy", None, "farmer-2"),
        animal("s", "Sahiwal", 5.0, Sex::Male, "healthy", None, "farmer-2"),
        animal("k", "Gir", 5.0, Sex::Male, "sick", None, "farmer-3"),
    ];

    for candidate in &population {
        let record = to_record(candidate).unwrap();
        assert_eq!(
            filter.matches(&record),
            is_breeding_candidate(&source, candidate, "farmer-1"),
            "disagreement on {}",
            candidate.id
        );
    }
}

#[test]
fn test_pairs_is_unordered() {
    let existing = BreedingMatch {
        id: "m-1".to_string(),
        cow1_id: "a".to_string(),
        cow2_id: "b".to_string(),
        compatibility_score: 0.9,
        status: MatchStatus::Rejected,
        created_at: None,
    };

    assert!(pairs(&existing, "a", "b"));
    assert!(pairs(&existing, "b", "a"));
    assert!(!pairs(&existing, "a", "c"));
}

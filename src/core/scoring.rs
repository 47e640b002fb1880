use crate::models::{Animal, ScoringWeights, Sex};

/// Calculate a breeding compatibility score (0-1) for a pair of animals
///
/// Scoring formula:
/// score = min(
///     breed_match * 0.3 +          # identical breed string
///     age_similarity * 0.2 +       # 1 at equal age, 0 at >= 5 years apart
///     both_healthy * 0.3 +         # health_status == "healthy" on both
///     milk_bonus * 0.2,            # female of a male/female pair > 15 L/day
///     1.0
/// )
///
/// The milk term looks at whichever animal is female, so the score does not
/// depend on argument order.
pub fn compatibility_score(a: &Animal, b: &Animal, weights: &ScoringWeights) -> f64 {
    let breed_score = if a.breed == b.breed { 1.0 } else { 0.0 };

    let age_score = calculate_age_score(a.age, b.age, weights.age_window_years);

    let health_score = if a.is_healthy() && b.is_healthy() { 1.0 } else { 0.0 };

    let milk_score = match female_of_pair(a, b) {
        Some(female) if exceeds_milk_threshold(female, weights.milk_threshold_lpd) => 1.0,
        _ => 0.0,
    };

    let total = breed_score * weights.breed
        + age_score * weights.age
        + health_score * weights.health
        + milk_score * weights.milk;

    total.min(1.0).max(0.0)
}

/// Age similarity (0-1), falling linearly to zero at `window_years` apart
#[inline]
fn calculate_age_score(age_a: f64, age_b: f64, window_years: f64) -> f64 {
    if window_years <= 0.0 {
        return if age_a == age_b { 1.0 } else { 0.0 };
    }

    let diff = (age_a - age_b).abs();
    1.0 - (diff / window_years).min(1.0)
}

/// The female member of a male/female pair; `None` for same-sex pairs
#[inline]
fn female_of_pair<'a>(a: &'a Animal, b: &'a Animal) -> Option<&'a Animal> {
    match (a.sex, b.sex) {
        (Sex::Female, Sex::Male) => Some(a),
        (Sex::Male, Sex::Female) => Some(b),
        _ => None,
    }
}

#[inline]
fn exceeds_milk_threshold(animal: &Animal, threshold_lpd: f64) -> bool {
    animal.milk_yield.map(|m| m > threshold_lpd).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_animal(id: &str, age: f64, sex: Sex, milk: Option<f64>) -> Animal {
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
            owner_id: format!("owner-{}", id),
            created_at: None,
        }
    }

    #[test]
    fn test_reference_pair() {
        let a = create_test_animal("a", 4.0, Sex::Female, Some(18.0));
        let b = create_test_animal("b", 5.0, Sex::Male, None);

        let score = compatibility_score(&a, &b, &ScoringWeights::default());
        assert!((score - 0.96).abs() < 1e-9, "expected 0.96, got {}", score);
    }

    #[test]
    fn test_age_score() {
        assert_eq!(calculate_age_score(4.0, 4.0, 5.0), 1.0);
        assert!((calculate_age_score(4.0, 5.0, 5.0) - 0.8).abs() < 1e-12);
        assert_eq!(calculate_age_score(2.0, 7.0, 5.0), 0.0);
        assert_eq!(calculate_age_score(1.0, 12.0, 5.0), 0.0);
    }

    #[test]
    fn test_milk_bonus_needs_strictly_more_than_threshold() {
        let at_threshold = create_test_animal("a", 4.0, Sex::Female, Some(15.0));
        let bull = create_test_animal("b", 4.0, Sex::Male, None);

        let score = compatibility_score(&at_threshold, &bull, &ScoringWeights::default());
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_same_sex_pair_gets_no_milk_bonus() {
        let a = create_test_animal("a", 4.0, Sex::Female, Some(25.0));
        let b = create_test_animal("b", 4.0, Sex::Female, Some(25.0));

        let score = compatibility_score(&a, &b, &ScoringWeights::default());
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_unhealthy_partner_loses_health_term() {
        let a = create_test_animal("a", 4.0, Sex::Female, None);
        let mut b = create_test_animal("b", 4.0, Sex::Male, None);
        b.health_status = "Healthy".to_string();

        let score = compatibility_score(&a, &b, &ScoringWeights::default());
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_when_weights_overshoot() {
        let a = create_test_animal("a", 4.0, Sex::Female, Some(20.0));
        let b = create_test_animal("b", 4.0, Sex::Male, None);
        let heavy = ScoringWeights {
            breed: 0.9,
            health: 0.9,
            ..ScoringWeights::default()
        };

        assert_eq!(compatibility_score(&a, &b, &heavy), 1.0);
    }
}

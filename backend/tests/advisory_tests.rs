//! Health advisory tests
//!
//! Property-based and unit tests for:
//! - Advisory determinism for any (AQI, profile) pair
//! - Profile augmentation thresholds
//! - Advisory/category consistency

use std::collections::BTreeSet;

use proptest::prelude::*;

use shared::{advise, ActivityLevel, AqiCategory, HealthCondition, UserProfile};

// ============================================================================
// Property Test Strategies
// ============================================================================

fn condition_strategy() -> impl Strategy<Value = HealthCondition> {
    prop_oneof![
        Just(HealthCondition::Asthma),
        Just(HealthCondition::Copd),
        Just(HealthCondition::HeartDisease),
        Just(HealthCondition::Diabetes),
        Just(HealthCondition::Allergies),
        Just(HealthCondition::Pregnancy),
    ]
}

fn activity_strategy() -> impl Strategy<Value = ActivityLevel> {
    prop_oneof![
        Just(ActivityLevel::Low),
        Just(ActivityLevel::Moderate),
        Just(ActivityLevel::High),
    ]
}

fn profile_strategy() -> impl Strategy<Value = UserProfile> {
    (
        proptest::option::of(1u8..=100),
        proptest::collection::btree_set(condition_strategy(), 0..4),
        activity_strategy(),
    )
        .prop_map(|(age, conditions, activity_level)| UserProfile {
            age,
            conditions,
            activity_level,
        })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Same input always produces the same advisory
    #[test]
    fn advice_is_deterministic(aqi in 0u16..=500, profile in profile_strategy()) {
        let a = advise(aqi, Some(&profile));
        let b = advise(aqi, Some(&profile));
        prop_assert_eq!(a.recommendations, b.recommendations);
        prop_assert_eq!(a.category, b.category);
    }

    /// Category and color always agree with the AQI band
    #[test]
    fn advisory_matches_category(aqi in 0u16..=500, profile in profile_strategy()) {
        let advisory = advise(aqi, Some(&profile));
        let category = AqiCategory::from_aqi(aqi);
        prop_assert_eq!(advisory.category, category.name());
        prop_assert_eq!(advisory.color, category.color());
        prop_assert_eq!(advisory.aqi_value, aqi);
    }

    /// Profile augmentation only adds text at moderate-or-worse air quality
    #[test]
    fn good_air_needs_no_personalization(aqi in 0u16..=50, profile in profile_strategy()) {
        let personalized = advise(aqi, Some(&profile));
        let generic = advise(aqi, None);
        prop_assert_eq!(personalized.recommendations, generic.recommendations);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

fn profile(age: u8, conditions: &[HealthCondition], activity: ActivityLevel) -> UserProfile {
    UserProfile {
        age: Some(age),
        conditions: BTreeSet::from_iter(conditions.iter().copied()),
        activity_level: activity,
    }
}

#[test]
fn child_gets_age_caution_above_100() {
    let advisory = advise(110, Some(&profile(10, &[], ActivityLevel::Low)));
    assert!(advisory
        .recommendations
        .precautions
        .contains("Extra caution recommended for your age group."));
}

#[test]
fn adult_without_conditions_gets_base_text() {
    let advisory = advise(110, Some(&profile(35, &[], ActivityLevel::Moderate)));
    let generic = advise(110, None);
    assert_eq!(advisory.recommendations, generic.recommendations);
}

#[test]
fn heart_disease_escalates_activities_above_100() {
    let advisory = advise(
        120,
        Some(&profile(40, &[HealthCondition::HeartDisease], ActivityLevel::Low)),
    );
    assert_eq!(
        advisory.recommendations.activities,
        "Avoid all outdoor activities. Consult your healthcare provider."
    );
}

#[test]
fn athlete_override_applies_even_with_conditions() {
    let advisory = advise(
        120,
        Some(&profile(40, &[HealthCondition::Asthma], ActivityLevel::High)),
    );
    assert!(advisory
        .recommendations
        .activities
        .contains("indoor training alternatives"));
    // The condition fragment still lands in precautions
    assert!(advisory
        .recommendations
        .precautions
        .contains("Your health conditions require extra caution."));
}

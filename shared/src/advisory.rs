//! Health advice derived from AQI readings
//!
//! Deterministic category lookup plus profile-driven text augmentation.
//! Pure function of its inputs — the caller owns and threads any profile
//! state.

use serde::{Deserialize, Serialize};

use crate::aqi::AqiCategory;
use crate::models::{ActivityLevel, UserProfile};

/// Recommendation text triple for one advisory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendations {
    pub general: String,
    pub activities: String,
    pub precautions: String,
}

/// Health advisory for an AQI reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthAdvisory {
    pub category: String,
    pub color: String,
    pub aqi_value: u16,
    pub recommendations: Recommendations,
}

fn base_recommendations(category: AqiCategory) -> Recommendations {
    let (general, activities, precautions) = match category {
        AqiCategory::Good => (
            "Air quality is satisfactory. Perfect day for outdoor activities!",
            "All outdoor activities recommended",
            "None needed",
        ),
        AqiCategory::Moderate => (
            "Air quality is acceptable. Sensitive individuals should limit prolonged outdoor exertion.",
            "Most outdoor activities are fine. Consider shorter durations for intense exercise.",
            "Sensitive individuals should monitor symptoms",
        ),
        AqiCategory::UnhealthyForSensitiveGroups => (
            "Sensitive groups should reduce outdoor activities.",
            "Limit outdoor exercise. Choose indoor alternatives when possible.",
            "Sensitive individuals should stay indoors during peak hours",
        ),
        AqiCategory::Unhealthy => (
            "Everyone should limit outdoor activities.",
            "Avoid outdoor exercise. Stay indoors with windows closed.",
            "Use air purifiers indoors. Wear masks when going outside.",
        ),
        AqiCategory::VeryUnhealthy => (
            "Everyone should avoid outdoor activities.",
            "Stay indoors. Avoid all outdoor exercise.",
            "Keep windows closed. Use air purifiers. Wear N95 masks outdoors.",
        ),
        AqiCategory::Hazardous => (
            "Emergency conditions. Everyone should remain indoors.",
            "No outdoor activities. Stay indoors with air purification.",
            "Seal windows and doors. Use multiple air purifiers. Avoid going outside.",
        ),
    };

    Recommendations {
        general: general.to_string(),
        activities: activities.to_string(),
        precautions: precautions.to_string(),
    }
}

/// Map an AQI value (and optional user profile) to a health advisory.
///
/// Profile augmentations are independent fixed fragments applied in a fixed
/// order (age, conditions, activity level), so the output is deterministic
/// for any given input.
pub fn advise(aqi: u16, profile: Option<&UserProfile>) -> HealthAdvisory {
    let category = AqiCategory::from_aqi(aqi);
    let mut recommendations = base_recommendations(category);

    if let Some(profile) = profile {
        if profile.is_age_sensitive() && aqi > 100 {
            recommendations
                .precautions
                .push_str(" Extra caution recommended for your age group.");
        }

        if profile.has_sensitive_condition() && aqi > 50 {
            recommendations
                .precautions
                .push_str(" Your health conditions require extra caution.");
            if aqi > 100 {
                recommendations.activities =
                    "Avoid all outdoor activities. Consult your healthcare provider.".to_string();
            }
        }

        if profile.activity_level == ActivityLevel::High && aqi > 100 {
            recommendations.activities = "Consider indoor training alternatives. \
                 High-intensity exercise not recommended outdoors."
                .to_string();
        }
    }

    HealthAdvisory {
        category: category.name().to_string(),
        color: category.color().to_string(),
        aqi_value: aqi,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::models::HealthCondition;

    fn profile(age: u8, conditions: &[HealthCondition], activity: ActivityLevel) -> UserProfile {
        UserProfile {
            age: Some(age),
            conditions: BTreeSet::from_iter(conditions.iter().copied()),
            activity_level: activity,
        }
    }

    #[test]
    fn base_advice_without_profile() {
        let advisory = advise(42, None);
        assert_eq!(advisory.category, "Good");
        assert_eq!(advisory.color, "#00E400");
        assert_eq!(advisory.recommendations.precautions, "None needed");
    }

    #[test]
    fn elderly_asthmatic_gets_both_cautions() {
        let advisory = advise(
            130,
            Some(&profile(70, &[HealthCondition::Asthma], ActivityLevel::Moderate)),
        );
        assert!(advisory
            .recommendations
            .precautions
            .contains("Extra caution recommended for your age group."));
        assert!(advisory
            .recommendations
            .precautions
            .contains("Your health conditions require extra caution."));
        assert!(!advisory.recommendations.activities.to_lowercase().contains("outdoor activities recommended"));
        assert!(advisory
            .recommendations
            .activities
            .starts_with("Avoid all outdoor activities."));
    }

    #[test]
    fn condition_caution_starts_above_moderate_threshold() {
        let quiet = advise(
            50,
            Some(&profile(30, &[HealthCondition::Copd], ActivityLevel::Low)),
        );
        assert!(!quiet.recommendations.precautions.contains("health conditions"));

        let elevated = advise(
            60,
            Some(&profile(30, &[HealthCondition::Copd], ActivityLevel::Low)),
        );
        assert!(elevated.recommendations.precautions.contains("health conditions"));
        // Below 100, activities text is unchanged
        assert!(!elevated.recommendations.activities.starts_with("Avoid all"));
    }

    #[test]
    fn high_activity_override_wins_over_condition_text() {
        // The activity override is applied after the condition override
        let advisory = advise(
            120,
            Some(&profile(40, &[HealthCondition::Asthma], ActivityLevel::High)),
        );
        assert!(advisory
            .recommendations
            .activities
            .contains("indoor training alternatives"));
    }

    #[test]
    fn non_sensitive_condition_does_not_escalate() {
        let advisory = advise(
            120,
            Some(&profile(40, &[HealthCondition::Allergies], ActivityLevel::Moderate)),
        );
        assert!(!advisory.recommendations.precautions.contains("health conditions"));
    }
}

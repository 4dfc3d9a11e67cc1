//! User health profile models

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Health conditions tracked for advisory personalization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HealthCondition {
    Asthma,
    Copd,
    HeartDisease,
    Diabetes,
    Allergies,
    Pregnancy,
}

impl HealthCondition {
    /// Whether this condition makes the person sensitive to air pollution
    /// for the purposes of advisory escalation.
    pub fn is_air_quality_sensitive(&self) -> bool {
        matches!(
            self,
            HealthCondition::Asthma
                | HealthCondition::Copd
                | HealthCondition::HeartDisease
                | HealthCondition::Diabetes
        )
    }
}

/// Self-reported physical activity level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    #[default]
    Moderate,
    High,
}

/// Optional user profile for personalized health advice
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserProfile {
    pub age: Option<u8>,
    #[serde(default)]
    pub conditions: BTreeSet<HealthCondition>,
    #[serde(default)]
    pub activity_level: ActivityLevel,
}

impl UserProfile {
    pub fn has_sensitive_condition(&self) -> bool {
        self.conditions
            .iter()
            .any(HealthCondition::is_air_quality_sensitive)
    }

    /// Children and the elderly get extra cautions at elevated AQI
    pub fn is_age_sensitive(&self) -> bool {
        matches!(self.age, Some(age) if age < 18 || age > 65)
    }
}

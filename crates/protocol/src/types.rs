use serde::{Deserialize, Serialize};

/// Diagnosis label produced by the health scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Excellent,
    Good,
    #[serde(rename = "Fair/Risk")]
    FairRisk,
    Critical,
    #[serde(rename = "OVERHEATING WARNING")]
    OverheatingWarning,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Excellent => "Excellent",
            Condition::Good => "Good",
            Condition::FairRisk => "Fair/Risk",
            Condition::Critical => "Critical",
            Condition::OverheatingWarning => "OVERHEATING WARNING",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Condition::Excellent => "Battery is in good shape. Maintain standard charging habits.",
            Condition::Good => "Minor degradation detected. Avoid deep discharges.",
            Condition::FairRisk => {
                "Significant aging. Plan for replacement soon. Check cooling systems."
            }
            Condition::Critical => "IMMEDIATE REPLACEMENT REQUIRED. High risk of failure.",
            Condition::OverheatingWarning => {
                "DANGER: Temperature is too high! Cool down immediately to prevent permanent damage."
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Condition::Excellent => Severity::Success,
            Condition::Good | Condition::FairRisk => Severity::Warning,
            Condition::Critical | Condition::OverheatingWarning => Severity::Danger,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// UI-facing tier used to pick visual styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Danger,
}

impl Severity {
    /// Style class understood by the dashboard templates.
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Success => "text-success-custom",
            Severity::Warning => "text-warning-custom",
            Severity::Danger => "text-danger-custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    /// Remaining useful life in cycles.
    pub rul: u32,
    /// 0-100.
    pub health_score: u8,
    pub condition: Condition,
    pub recommendation: String,
    /// Estimated repair cost in dollars.
    pub cost: u32,
    pub severity: Severity,
}

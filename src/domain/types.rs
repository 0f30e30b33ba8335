use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Plumbing,
    Electrical,
    Safety,
    Cleanliness,
    Infrastructure,
    Landscaping,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Plumbing => "plumbing",
            Category::Electrical => "electrical",
            Category::Safety => "safety",
            Category::Cleanliness => "cleanliness",
            Category::Infrastructure => "infrastructure",
            Category::Landscaping => "landscaping",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub severity: Severity,
    pub confidence: f64,
    pub suggestion: String,
}

impl Classification {
    pub fn new(category: Category, severity: Severity, confidence: f64) -> Self {
        Self {
            category,
            severity,
            confidence,
            suggestion: default_suggestion(category, severity),
        }
    }
}

pub fn default_suggestion(category: Category, severity: Severity) -> String {
    format!("Issue categorized as {category} with {severity} priority")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_labels_in_lowercase() {
        let value = serde_json::to_value(Classification::new(
            Category::Plumbing,
            Severity::High,
            DEFAULT_CONFIDENCE,
        ))
        .unwrap();
        assert_eq!(value["category"], "plumbing");
        assert_eq!(value["severity"], "high");
        assert_eq!(value["confidence"], 0.8);
        assert_eq!(
            value["suggestion"],
            "Issue categorized as plumbing with high priority"
        );
    }

    #[test]
    fn rejects_labels_outside_the_closed_sets() {
        assert!(serde_json::from_str::<Category>("\"roofing\"").is_err());
        assert!(serde_json::from_str::<Severity>("\"extreme\"").is_err());
    }
}

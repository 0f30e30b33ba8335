use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{types::DEFAULT_CONFIDENCE, Category, Classification, Severity};

use super::IssueClassifier;

/// Checked in order; the first rule with any hit decides the category.
const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Plumbing,
        &["water", "leak", "pipe", "fountain", "toilet", "sink", "drain"],
    ),
    (
        Category::Electrical,
        &["light", "electric", "power", "outlet", "wire", "bulb"],
    ),
    (
        Category::Safety,
        &["danger", "unsafe", "hazard", "risk", "emergency", "broken glass"],
    ),
    (
        Category::Cleanliness,
        &["dirty", "trash", "garbage", "clean", "mess", "waste"],
    ),
    (
        Category::Infrastructure,
        &[
            "road", "path", "sidewalk", "building", "wall", "roof", "door", "window",
        ],
    ),
    (
        Category::Landscaping,
        &["grass", "tree", "plant", "garden", "lawn", "landscape"],
    ),
];

const HIGH_SEVERITY: &[&str] = &[
    "urgent",
    "critical",
    "emergency",
    "danger",
    "unsafe",
    "immediate",
];
const LOW_SEVERITY: &[&str] = &["minor", "small", "slight", "cosmetic"];

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_text(&self, description: &str) -> Classification {
        let text = description.to_lowercase();
        Classification::new(
            resolve_category(&text),
            resolve_severity(&text),
            DEFAULT_CONFIDENCE,
        )
    }
}

#[async_trait]
impl IssueClassifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn classify(&self, description: &str) -> Result<Classification> {
        Ok(self.classify_text(description))
    }
}

fn resolve_category(text: &str) -> Category {
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| contains_any(text, keywords))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

fn resolve_severity(text: &str) -> Severity {
    if contains_any(text, HIGH_SEVERITY) {
        Severity::High
    } else if contains_any(text, LOW_SEVERITY) {
        Severity::Low
    } else {
        Severity::Medium
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

// ============================================================
// Layer 3 — Examples and Tasks
// ============================================================
// An Example is one (text, label) row read from the dataset.
// Cleaning the text and encoding the label string into a class
// index turns it into the LabeledText the model trains on.
//
// Two tasks are supported:
//   Sentiment — movie reviews, 2 classes (negative, positive)
//   Abuse     — tweets, 6 cyberbullying classes
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use serde::{Deserialize, Serialize};

use crate::domain::error::{ClfError, Result};

/// A raw labelled row exactly as it was read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub text:  String,
    pub label: String,
}

impl Example {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self { text: text.into(), label: label.into() }
    }
}

/// Cleaned text paired with its encoded class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledText {
    pub text:  String,
    pub label: usize,
}

const SENTIMENT_LABELS: [&str; 2] = ["negative", "positive"];

// Sorted, so class indices match a label encoder fitted on the dataset
const ABUSE_LABELS: [&str; 6] = [
    "age",
    "ethnicity",
    "gender",
    "not_cyberbullying",
    "other_cyberbullying",
    "religion",
];

/// The classification task being trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Sentiment,
    Abuse,
}

impl Task {
    /// Class names, indexed by class id
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Task::Sentiment => &SENTIMENT_LABELS,
            Task::Abuse     => &ABUSE_LABELS,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.labels().len()
    }

    /// Default name of the free-text column in the dataset CSV
    pub fn text_column(&self) -> &'static str {
        match self {
            Task::Sentiment => "review",
            Task::Abuse     => "tweet_text",
        }
    }

    /// Default name of the label column in the dataset CSV
    pub fn label_column(&self) -> &'static str {
        match self {
            Task::Sentiment => "sentiment",
            Task::Abuse     => "cyberbullying_type",
        }
    }

    /// Map a label string to its class index.
    ///
    /// Sentiment keeps the historical mapping of the original
    /// datasets: "positive" is 1 and every other value, including
    /// typos and empty strings, falls through to 0.
    pub fn encode_label(&self, label: &str) -> Result<usize> {
        match self {
            Task::Sentiment => Ok(usize::from(label == "positive")),
            Task::Abuse => ABUSE_LABELS
                .iter()
                .position(|l| *l == label)
                .ok_or_else(|| ClfError::Config(format!("unknown abuse label '{label}'"))),
        }
    }

    pub fn label_name(&self, class: usize) -> Option<&'static str> {
        self.labels().get(class).copied()
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Sentiment => write!(f, "sentiment"),
            Task::Abuse     => write!(f, "abuse"),
        }
    }
}

impl std::str::FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sentiment" => Ok(Task::Sentiment),
            "abuse" | "cyberbullying" => Ok(Task::Abuse),
            _ => Err(format!("Unknown task: {s}. Use: sentiment, abuse")),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_label_mapping() {
        let t = Task::Sentiment;
        assert_eq!(t.encode_label("positive").unwrap(), 1);
        assert_eq!(t.encode_label("negative").unwrap(), 0);
        // Anything else silently maps to negative
        assert_eq!(t.encode_label("neutral").unwrap(), 0);
        assert_eq!(t.encode_label("Positive").unwrap(), 0);
        assert_eq!(t.encode_label("").unwrap(), 0);
    }

    #[test]
    fn test_abuse_labels_are_sorted() {
        let mut sorted = ABUSE_LABELS.to_vec();
        sorted.sort();
        assert_eq!(sorted, ABUSE_LABELS.to_vec());
        assert_eq!(Task::Abuse.num_classes(), 6);
    }

    #[test]
    fn test_abuse_unknown_label_is_rejected() {
        assert_eq!(Task::Abuse.encode_label("religion").unwrap(), 5);
        assert!(matches!(
            Task::Abuse.encode_label("spam"),
            Err(ClfError::Config(_))
        ));
    }

    #[test]
    fn test_task_from_str() {
        assert_eq!("Sentiment".parse::<Task>().unwrap(), Task::Sentiment);
        assert_eq!("cyberbullying".parse::<Task>().unwrap(), Task::Abuse);
        assert!("topic".parse::<Task>().is_err());
    }
}

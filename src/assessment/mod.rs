//! Assessment domain model: paths, statuses, and the nested response map.

pub mod completion;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The two questionnaire variants. They differ in question count and step
/// total (migration adds legacy-system questions to most categories).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentPath {
    Exploratory,
    Migration,
}

impl AssessmentPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exploratory => "exploratory",
            Self::Migration => "migration",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exploratory" => Some(Self::Exploratory),
            "migration" => Some(Self::Migration),
            _ => None,
        }
    }
}

/// Assessment lifecycle. Derived from responses on every save — clients never
/// set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Draft,
    InProgress,
    Completed,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Per-category completion state, from required-question presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryCompletion {
    NotStarted,
    Partial,
    Completed,
}

/// `map<category_id, map<question_id, answer>>`. BTreeMap keeps the JSON
/// serialization stable across saves.
pub type ResponseMap = BTreeMap<String, BTreeMap<String, String>>;

/// Stored per-category status entry (the `category_statuses` document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStatusEntry {
    pub status: CategoryCompletion,
    /// Percentage of required questions answered, 0..=100.
    pub completion_percentage: u8,
    /// RFC 3339 timestamp of the last save that touched this category.
    pub last_modified: String,
}

/// `map<category_id, CategoryStatusEntry>`.
pub type CategoryStatusMap = BTreeMap<String, CategoryStatusEntry>;

/// True if an answer string counts as present. Whitespace-only answers do not.
pub fn is_answered(value: &str) -> bool {
    !value.trim().is_empty()
}

//! Static definition of the RAPID questionnaire.
//!
//! Five categories in fixed display order; each question declares which
//! assessment paths include it and whether an answer is required. The
//! migration path carries extra migration-specific questions, so the two
//! paths differ in question count and step total.

use crate::assessment::AssessmentPath;

/// Category identifiers in display order. Also the step order of the wizard.
pub const CATEGORY_ORDER: [&str; 5] = [
    "use_case_discovery",
    "data_readiness",
    "compliance_integration",
    "model_evaluation",
    "business_value",
];

/// Human-readable category titles, index-aligned with [`CATEGORY_ORDER`].
pub const CATEGORY_TITLES: [&str; 5] = [
    "Use Case Discovery",
    "Data Readiness",
    "Compliance & Integration",
    "Model Evaluation",
    "Business Value / ROI",
];

/// A single questionnaire question.
#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub id: &'static str,
    pub category: &'static str,
    pub prompt: &'static str,
    pub required: bool,
    /// Paths that include this question.
    pub paths: &'static [AssessmentPath],
}

const BOTH: &[AssessmentPath] = &[AssessmentPath::Exploratory, AssessmentPath::Migration];
const MIGRATION_ONLY: &[AssessmentPath] = &[AssessmentPath::Migration];

/// The full question inventory, grouped by category in display order.
pub const QUESTIONS: &[Question] = &[
    // ─── Use Case Discovery ──────────────────────────────────────────────────
    Question {
        id: "ucd_business_goal",
        category: "use_case_discovery",
        prompt: "What business goal should the AI initiative advance?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "ucd_primary_use_case",
        category: "use_case_discovery",
        prompt: "Describe the primary use case under consideration.",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "ucd_stakeholders",
        category: "use_case_discovery",
        prompt: "Who are the stakeholders and end users?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "ucd_current_workflow",
        category: "use_case_discovery",
        prompt: "How is the workflow handled today, without AI?",
        required: false,
        paths: BOTH,
    },
    Question {
        id: "ucd_existing_system",
        category: "use_case_discovery",
        prompt: "Which existing system or model is being migrated, and why?",
        required: true,
        paths: MIGRATION_ONLY,
    },
    // ─── Data Readiness ──────────────────────────────────────────────────────
    Question {
        id: "dr_data_sources",
        category: "data_readiness",
        prompt: "What data sources are available for this use case?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "dr_data_quality",
        category: "data_readiness",
        prompt: "How would you rate the quality and completeness of that data?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "dr_data_volume",
        category: "data_readiness",
        prompt: "What data volume is generated per month?",
        required: false,
        paths: BOTH,
    },
    Question {
        id: "dr_labeling",
        category: "data_readiness",
        prompt: "Is labeled data available, or is a labeling effort needed?",
        required: false,
        paths: BOTH,
    },
    Question {
        id: "dr_migration_format",
        category: "data_readiness",
        prompt: "In what formats does the legacy system store its data?",
        required: true,
        paths: MIGRATION_ONLY,
    },
    Question {
        id: "dr_migration_volume",
        category: "data_readiness",
        prompt: "How much historical data must be migrated?",
        required: false,
        paths: MIGRATION_ONLY,
    },
    // ─── Compliance & Integration ────────────────────────────────────────────
    Question {
        id: "ci_regulations",
        category: "compliance_integration",
        prompt: "Which regulations apply (GDPR, HIPAA, SOC 2, industry-specific)?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "ci_data_residency",
        category: "compliance_integration",
        prompt: "Are there data residency or sovereignty constraints?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "ci_integrations",
        category: "compliance_integration",
        prompt: "Which internal systems must the solution integrate with?",
        required: false,
        paths: BOTH,
    },
    Question {
        id: "ci_security_review",
        category: "compliance_integration",
        prompt: "What does your security review process require of vendors?",
        required: false,
        paths: BOTH,
    },
    Question {
        id: "ci_migration_downtime",
        category: "compliance_integration",
        prompt: "What downtime window is acceptable during cutover?",
        required: true,
        paths: MIGRATION_ONLY,
    },
    // ─── Model Evaluation ────────────────────────────────────────────────────
    Question {
        id: "me_success_metrics",
        category: "model_evaluation",
        prompt: "How will model output quality be measured?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "me_accuracy_bar",
        category: "model_evaluation",
        prompt: "What accuracy or quality bar must be met before launch?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "me_human_review",
        category: "model_evaluation",
        prompt: "Will humans review model output, and at what stage?",
        required: false,
        paths: BOTH,
    },
    Question {
        id: "me_baseline_metrics",
        category: "model_evaluation",
        prompt: "What metrics does the current system achieve today?",
        required: true,
        paths: MIGRATION_ONLY,
    },
    // ─── Business Value / ROI ────────────────────────────────────────────────
    Question {
        id: "bv_cost_today",
        category: "business_value",
        prompt: "What does the current process cost per month (people + tooling)?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "bv_expected_saving",
        category: "business_value",
        prompt: "What saving or revenue uplift is expected from the AI solution?",
        required: true,
        paths: BOTH,
    },
    Question {
        id: "bv_timeline",
        category: "business_value",
        prompt: "What is the target timeline to production?",
        required: false,
        paths: BOTH,
    },
    Question {
        id: "bv_migration_budget",
        category: "business_value",
        prompt: "What budget is allocated for the migration itself?",
        required: false,
        paths: MIGRATION_ONLY,
    },
];

/// Human-readable title for a category id, or the id itself if unknown.
pub fn category_title(category: &str) -> &str {
    CATEGORY_ORDER
        .iter()
        .position(|c| *c == category)
        .map(|i| CATEGORY_TITLES[i])
        .unwrap_or(category)
}

/// True if `category` is one of the five RAPID categories.
pub fn is_valid_category(category: &str) -> bool {
    CATEGORY_ORDER.contains(&category)
}

/// All questions of `category` included in `path`, in definition order.
pub fn questions_for(path: AssessmentPath, category: &str) -> Vec<&'static Question> {
    QUESTIONS
        .iter()
        .filter(|q| q.category == category && q.paths.contains(&path))
        .collect()
}

/// Required questions of `category` for `path`.
pub fn required_questions(path: AssessmentPath, category: &str) -> Vec<&'static Question> {
    questions_for(path, category)
        .into_iter()
        .filter(|q| q.required)
        .collect()
}

/// Look up a question by id within a path, checking category membership.
pub fn find_question(
    path: AssessmentPath,
    category: &str,
    question_id: &str,
) -> Option<&'static Question> {
    QUESTIONS
        .iter()
        .find(|q| q.id == question_id && q.category == category && q.paths.contains(&path))
}

/// Total number of questions a path presents across all categories — the
/// wizard's step total (exploratory and migration differ here).
pub fn total_steps(path: AssessmentPath) -> usize {
    QUESTIONS.iter().filter(|q| q.paths.contains(&path)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_has_more_steps_than_exploratory() {
        assert!(total_steps(AssessmentPath::Migration) > total_steps(AssessmentPath::Exploratory));
    }

    #[test]
    fn every_category_has_required_questions_on_both_paths() {
        for category in CATEGORY_ORDER {
            for path in [AssessmentPath::Exploratory, AssessmentPath::Migration] {
                assert!(
                    !required_questions(path, category).is_empty(),
                    "{category} has no required questions for {path:?}"
                );
            }
        }
    }

    #[test]
    fn question_ids_are_unique() {
        let mut ids: Vec<&str> = QUESTIONS.iter().map(|q| q.id).collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(before, ids.len());
    }

    #[test]
    fn migration_only_questions_are_absent_from_exploratory() {
        assert!(find_question(
            AssessmentPath::Migration,
            "use_case_discovery",
            "ucd_existing_system"
        )
        .is_some());
        assert!(find_question(
            AssessmentPath::Exploratory,
            "use_case_discovery",
            "ucd_existing_system"
        )
        .is_none());
    }

    #[test]
    fn category_titles_resolve() {
        assert_eq!(category_title("data_readiness"), "Data Readiness");
        assert_eq!(category_title("nope"), "nope");
    }
}

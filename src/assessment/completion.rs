//! Completion engine: category status derivation, the Next Category gate,
//! report readiness, and the auto-save merge.

use std::collections::BTreeSet;

use super::{
    is_answered, AssessmentPath, AssessmentStatus, CategoryCompletion, CategoryStatusEntry,
    CategoryStatusMap, ResponseMap,
};
use crate::catalog;

/// Derived status and completion percentage for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProgress {
    pub status: CategoryCompletion,
    pub completion_percentage: u8,
    pub answered_required: usize,
    pub total_required: usize,
}

/// Derive one category's progress from required-question presence.
///
/// The percentage is `answered_required / total_required`, rounded, but only
/// reaches 100 when every required question is answered. A category with no
/// required questions for this path counts as completed once any of its
/// questions is answered.
pub fn category_progress(
    path: AssessmentPath,
    category: &str,
    responses: &ResponseMap,
) -> CategoryProgress {
    let required = catalog::required_questions(path, category);
    let answers = responses.get(category);
    let any_answer = answers
        .map(|a| a.values().any(|v| is_answered(v)))
        .unwrap_or(false);

    if required.is_empty() {
        return CategoryProgress {
            status: if any_answer {
                CategoryCompletion::Completed
            } else {
                CategoryCompletion::NotStarted
            },
            completion_percentage: if any_answer { 100 } else { 0 },
            answered_required: 0,
            total_required: 0,
        };
    }

    let answered = required
        .iter()
        .filter(|q| {
            answers
                .and_then(|a| a.get(q.id))
                .map(|v| is_answered(v))
                .unwrap_or(false)
        })
        .count();

    let pct = percentage(answered, required.len());
    let status = if answered == required.len() {
        CategoryCompletion::Completed
    } else if any_answer {
        CategoryCompletion::Partial
    } else {
        CategoryCompletion::NotStarted
    };

    CategoryProgress {
        status,
        completion_percentage: pct,
        answered_required: answered,
        total_required: required.len(),
    }
}

/// Rounded percentage that only reports 100 when `answered == total`.
fn percentage(answered: usize, total: usize) -> u8 {
    if total == 0 || answered >= total {
        return 100;
    }
    let pct = ((answered * 100) + total / 2) / total;
    pct.min(99) as u8
}

/// The "Next Category" gate: may the user advance past `category`?
pub fn can_advance(path: AssessmentPath, category: &str, responses: &ResponseMap) -> bool {
    category_progress(path, category, responses).status == CategoryCompletion::Completed
}

/// True when every category has all required questions answered — the
/// condition for the `completed` status and for report generation.
pub fn report_ready(path: AssessmentPath, responses: &ResponseMap) -> bool {
    catalog::CATEGORY_ORDER
        .iter()
        .all(|c| category_progress(path, c, responses).status == CategoryCompletion::Completed)
}

/// Overall completion percentage: answered required questions over all
/// required questions, across every category of the path.
pub fn overall_percentage(path: AssessmentPath, responses: &ResponseMap) -> u8 {
    let mut answered = 0;
    let mut total = 0;
    for category in catalog::CATEGORY_ORDER {
        let p = category_progress(path, category, responses);
        answered += p.answered_required;
        total += p.total_required;
    }
    percentage(answered, total)
}

/// Derive the assessment status from its responses. Zero answers = draft;
/// all required answered = completed; anything else = in progress.
pub fn derive_status(path: AssessmentPath, responses: &ResponseMap) -> AssessmentStatus {
    let any_answer = responses
        .values()
        .any(|cat| cat.values().any(|v| is_answered(v)));
    if !any_answer {
        AssessmentStatus::Draft
    } else if report_ready(path, responses) {
        AssessmentStatus::Completed
    } else {
        AssessmentStatus::InProgress
    }
}

/// Reject auto-save payloads that reference unknown categories or questions.
pub fn validate_payload(path: AssessmentPath, incoming: &ResponseMap) -> Result<(), String> {
    for (category, answers) in incoming {
        if !catalog::is_valid_category(category) {
            return Err(format!("unknown category: {category}"));
        }
        for question_id in answers.keys() {
            if catalog::find_question(path, category, question_id).is_none() {
                return Err(format!(
                    "unknown question for {} path in {category}: {question_id}",
                    path.as_str()
                ));
            }
        }
    }
    Ok(())
}

/// Auto-save merge: fold `incoming` into `existing` question by question.
///
/// A blank incoming value clears the stored answer; categories absent from
/// the payload are untouched. Returns the set of categories the payload
/// touched (used to refresh their `last_modified` stamps).
pub fn merge_responses(existing: &mut ResponseMap, incoming: &ResponseMap) -> BTreeSet<String> {
    let mut touched = BTreeSet::new();
    for (category, answers) in incoming {
        touched.insert(category.clone());
        let slot = existing.entry(category.clone()).or_default();
        for (question_id, value) in answers {
            if is_answered(value) {
                slot.insert(question_id.clone(), value.clone());
            } else {
                slot.remove(question_id);
            }
        }
    }
    touched
}

/// Recompute the stored category-status map after a save.
///
/// Categories in `touched` get `now` as their `last_modified`; the rest keep
/// the timestamp from `previous` (or `now` when first materialized).
pub fn rebuild_status_map(
    path: AssessmentPath,
    responses: &ResponseMap,
    previous: &CategoryStatusMap,
    touched: &BTreeSet<String>,
    now: &str,
) -> CategoryStatusMap {
    let mut map = CategoryStatusMap::new();
    for category in catalog::CATEGORY_ORDER {
        let progress = category_progress(path, category, responses);
        let last_modified = if touched.contains(category) {
            now.to_string()
        } else {
            previous
                .get(category)
                .map(|e| e.last_modified.clone())
                .unwrap_or_else(|| now.to_string())
        };
        map.insert(
            category.to_string(),
            CategoryStatusEntry {
                status: progress.status,
                completion_percentage: progress.completion_percentage,
                last_modified,
            },
        );
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn answer(responses: &mut ResponseMap, category: &str, question: &str, value: &str) {
        responses
            .entry(category.to_string())
            .or_default()
            .insert(question.to_string(), value.to_string());
    }

    /// Answer every required question of every category for the path.
    fn answer_all_required(path: AssessmentPath) -> ResponseMap {
        let mut responses = ResponseMap::new();
        for category in catalog::CATEGORY_ORDER {
            for q in catalog::required_questions(path, category) {
                answer(&mut responses, category, q.id, "an answer");
            }
        }
        responses
    }

    #[test]
    fn empty_category_is_not_started() {
        let responses = ResponseMap::new();
        let p = category_progress(AssessmentPath::Exploratory, "data_readiness", &responses);
        assert_eq!(p.status, CategoryCompletion::NotStarted);
        assert_eq!(p.completion_percentage, 0);
    }

    #[test]
    fn whitespace_answers_do_not_count() {
        let mut responses = ResponseMap::new();
        answer(&mut responses, "data_readiness", "dr_data_sources", "   ");
        let p = category_progress(AssessmentPath::Exploratory, "data_readiness", &responses);
        assert_eq!(p.status, CategoryCompletion::NotStarted);
    }

    #[test]
    fn partial_category_never_reports_100() {
        let mut responses = ResponseMap::new();
        answer(&mut responses, "data_readiness", "dr_data_sources", "crm");
        let p = category_progress(AssessmentPath::Exploratory, "data_readiness", &responses);
        assert_eq!(p.status, CategoryCompletion::Partial);
        assert!(p.completion_percentage < 100);
        assert!(p.completion_percentage > 0);
    }

    #[test]
    fn optional_answer_alone_is_partial() {
        let mut responses = ResponseMap::new();
        answer(&mut responses, "data_readiness", "dr_data_volume", "10 GB");
        let p = category_progress(AssessmentPath::Exploratory, "data_readiness", &responses);
        assert_eq!(p.status, CategoryCompletion::Partial);
        assert_eq!(p.completion_percentage, 0);
    }

    #[test]
    fn all_required_answered_is_completed() {
        let mut responses = ResponseMap::new();
        for q in catalog::required_questions(AssessmentPath::Exploratory, "model_evaluation") {
            answer(&mut responses, "model_evaluation", q.id, "measured");
        }
        let p = category_progress(AssessmentPath::Exploratory, "model_evaluation", &responses);
        assert_eq!(p.status, CategoryCompletion::Completed);
        assert_eq!(p.completion_percentage, 100);
        assert!(can_advance(
            AssessmentPath::Exploratory,
            "model_evaluation",
            &responses
        ));
    }

    #[test]
    fn migration_path_requires_its_extra_questions() {
        // Answering only the exploratory-required set must not complete the
        // migration path's use_case_discovery category.
        let mut responses = ResponseMap::new();
        for q in catalog::required_questions(AssessmentPath::Exploratory, "use_case_discovery") {
            answer(&mut responses, "use_case_discovery", q.id, "done");
        }
        assert!(!can_advance(
            AssessmentPath::Migration,
            "use_case_discovery",
            &responses
        ));
        answer(
            &mut responses,
            "use_case_discovery",
            "ucd_existing_system",
            "legacy scoring engine",
        );
        assert!(can_advance(
            AssessmentPath::Migration,
            "use_case_discovery",
            &responses
        ));
    }

    #[test]
    fn status_derivation_follows_answers() {
        let path = AssessmentPath::Exploratory;
        let mut responses = ResponseMap::new();
        assert_eq!(derive_status(path, &responses), AssessmentStatus::Draft);

        answer(&mut responses, "business_value", "bv_cost_today", "$40k");
        assert_eq!(derive_status(path, &responses), AssessmentStatus::InProgress);

        let responses = answer_all_required(path);
        assert_eq!(derive_status(path, &responses), AssessmentStatus::Completed);
        assert!(report_ready(path, &responses));
        assert_eq!(overall_percentage(path, &responses), 100);
    }

    #[test]
    fn clearing_an_answer_demotes_completed() {
        let path = AssessmentPath::Exploratory;
        let mut responses = answer_all_required(path);

        let mut incoming = ResponseMap::new();
        answer(&mut incoming, "business_value", "bv_cost_today", "");
        let touched = merge_responses(&mut responses, &incoming);
        assert_eq!(touched.len(), 1);
        assert_eq!(derive_status(path, &responses), AssessmentStatus::InProgress);
    }

    #[test]
    fn merge_is_additive_across_categories() {
        let mut existing = ResponseMap::new();
        answer(&mut existing, "data_readiness", "dr_data_sources", "s3");

        let mut incoming = ResponseMap::new();
        answer(&mut incoming, "business_value", "bv_cost_today", "$10k");
        merge_responses(&mut existing, &incoming);

        assert_eq!(
            existing["data_readiness"]["dr_data_sources"],
            "s3".to_string()
        );
        assert_eq!(
            existing["business_value"]["bv_cost_today"],
            "$10k".to_string()
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let mut a = ResponseMap::new();
        let mut incoming = ResponseMap::new();
        answer(&mut incoming, "data_readiness", "dr_data_sources", "crm");
        merge_responses(&mut a, &incoming);
        let snapshot = a.clone();
        merge_responses(&mut a, &incoming);
        assert_eq!(a, snapshot);
    }

    #[test]
    fn payload_validation_rejects_unknown_ids() {
        let mut bad_category = ResponseMap::new();
        bad_category.insert("feelings".to_string(), BTreeMap::new());
        assert!(validate_payload(AssessmentPath::Exploratory, &bad_category).is_err());

        let mut bad_question = ResponseMap::new();
        bad_question
            .entry("data_readiness".to_string())
            .or_default()
            .insert("dr_bogus".to_string(), "x".to_string());
        assert!(validate_payload(AssessmentPath::Exploratory, &bad_question).is_err());

        // Migration-only question on the exploratory path is also rejected.
        let mut wrong_path = ResponseMap::new();
        wrong_path
            .entry("use_case_discovery".to_string())
            .or_default()
            .insert("ucd_existing_system".to_string(), "x".to_string());
        assert!(validate_payload(AssessmentPath::Exploratory, &wrong_path).is_err());
        assert!(validate_payload(AssessmentPath::Migration, &wrong_path).is_ok());
    }

    #[test]
    fn rebuild_status_map_tracks_touched_timestamps() {
        let path = AssessmentPath::Exploratory;
        let mut responses = ResponseMap::new();
        answer(&mut responses, "data_readiness", "dr_data_sources", "crm");

        let touched: std::collections::BTreeSet<String> =
            ["data_readiness".to_string()].into_iter().collect();
        let first = rebuild_status_map(path, &responses, &CategoryStatusMap::new(), &touched, "t1");
        assert_eq!(first["data_readiness"].last_modified, "t1");
        assert_eq!(first["business_value"].last_modified, "t1");

        // A later save touching a different category keeps the old stamp.
        let touched: std::collections::BTreeSet<String> =
            ["business_value".to_string()].into_iter().collect();
        let second = rebuild_status_map(path, &responses, &first, &touched, "t2");
        assert_eq!(second["data_readiness"].last_modified, "t1");
        assert_eq!(second["business_value"].last_modified, "t2");
    }

    proptest! {
        /// Percentage stays within 0..=100 and only hits the bounds exactly
        /// at empty / full.
        #[test]
        fn percentage_bounds(answered in 0usize..50, extra in 1usize..50) {
            let total = answered + extra; // strictly more than answered
            let pct = percentage(answered, total);
            prop_assert!(pct <= 99);
            if answered > 0 {
                prop_assert!(pct >= 1 || (answered * 100) / total == 0);
            }
        }
    }
}

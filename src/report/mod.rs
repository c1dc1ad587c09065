//! Report generation: gate on completion, gather questionnaire data, request
//! prose from the AI model, render the HTML skeleton, persist.

pub mod template;

use anyhow::Result;
use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::ai::SharedModel;
use crate::assessment::{completion, AssessmentStatus, ResponseMap};
use crate::catalog;
use crate::storage::{AssessmentRow, CompanyRow, ReportRow, Storage};
use template::{CategorySection, ReportData};

#[derive(Debug, Error)]
pub enum ReportError {
    /// The assessment has unanswered required questions.
    #[error("assessment is not completed — answer all required questions first")]
    NotCompleted,
    #[error("AI model error: {0}")]
    Model(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Generate (or regenerate) the report for a completed assessment.
pub async fn generate(
    storage: &Storage,
    model: &SharedModel,
    assessment: &AssessmentRow,
    company: &CompanyRow,
    generated_by: &str,
) -> Result<ReportRow, ReportError> {
    if assessment.parsed_status()? != AssessmentStatus::Completed {
        return Err(ReportError::NotCompleted);
    }
    let path = assessment.path()?;
    let responses = assessment.response_map()?;

    let categories = collect_sections(path, &responses);
    let answers_digest = answers_digest(&categories);

    let executive_summary = model
        .generate(&executive_summary_prompt(
            &company.name,
            &assessment.name,
            path.as_str(),
            &answers_digest,
        ))
        .await
        .map_err(ReportError::Model)?;
    let recommendations = model
        .generate(&recommendations_prompt(
            &company.name,
            path.as_str(),
            &answers_digest,
        ))
        .await
        .map_err(ReportError::Model)?;

    let data = ReportData {
        company_name: company.name.clone(),
        company_description: company.description.clone(),
        assessment_name: assessment.name.clone(),
        path_label: path_label(path.as_str()),
        generated_at: Utc::now().to_rfc3339(),
        overall_percentage: completion::overall_percentage(path, &responses),
        categories,
        executive_summary,
        recommendations,
    };
    let html = template::render(&data);

    let row = storage
        .upsert_report(
            &assessment.id,
            &company.id,
            &company.name,
            &assessment.name,
            path.as_str(),
            &html,
            generated_by,
        )
        .await?;
    info!(
        assessment = %assessment.id,
        model = %model.name(),
        bytes = html.len(),
        "report generated"
    );
    Ok(row)
}

fn path_label(path: &str) -> String {
    match path {
        "exploratory" => "Exploratory".to_string(),
        "migration" => "Migration".to_string(),
        other => other.to_string(),
    }
}

/// Build the per-category sections, in catalog order, keeping only answered
/// questions (required or optional).
fn collect_sections(
    path: crate::assessment::AssessmentPath,
    responses: &ResponseMap,
) -> Vec<CategorySection> {
    catalog::CATEGORY_ORDER
        .iter()
        .map(|category| {
            let progress = completion::category_progress(path, category, responses);
            let entries = catalog::questions_for(path, category)
                .into_iter()
                .filter_map(|q| {
                    responses
                        .get(*category)
                        .and_then(|a| a.get(q.id))
                        .filter(|v| crate::assessment::is_answered(v))
                        .map(|v| (q.prompt.to_string(), v.clone()))
                })
                .collect();
            CategorySection {
                title: catalog::category_title(category).to_string(),
                status: progress.status,
                completion_percentage: progress.completion_percentage,
                entries,
            }
        })
        .collect()
}

/// Plain-text digest of the answers, fed to the model prompts.
fn answers_digest(categories: &[CategorySection]) -> String {
    let mut digest = String::new();
    for section in categories {
        digest.push_str(&format!("## {}\n", section.title));
        for (prompt, answer) in &section.entries {
            digest.push_str(&format!("- {prompt}\n  {answer}\n"));
        }
    }
    digest
}

fn executive_summary_prompt(
    company: &str,
    assessment: &str,
    path: &str,
    digest: &str,
) -> String {
    format!(
        "Executive summary\n\
         You are writing the executive summary of an AI-readiness assessment \
         report. Company: {company}. Assessment: {assessment} ({path} path).\n\
         Respond with 2-3 HTML paragraphs (<p> tags only, no headings) \
         summarizing readiness, notable strengths, and the main gaps.\n\n\
         Questionnaire answers:\n{digest}"
    )
}

fn recommendations_prompt(company: &str, path: &str, digest: &str) -> String {
    format!(
        "Recommendations\n\
         You are writing the recommendations section of an AI-readiness \
         assessment report for {company} ({path} path).\n\
         Respond with an HTML ordered list (<ol> with <li> items) of concrete \
         next steps, most impactful first.\n\n\
         Questionnaire answers:\n{digest}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentPath;

    fn full_responses(path: AssessmentPath) -> ResponseMap {
        let mut responses = ResponseMap::new();
        for category in catalog::CATEGORY_ORDER {
            for q in catalog::required_questions(path, category) {
                responses
                    .entry(category.to_string())
                    .or_default()
                    .insert(q.id.to_string(), format!("answer to {}", q.id));
            }
        }
        responses
    }

    #[test]
    fn sections_follow_catalog_order_and_skip_unanswered() {
        let path = AssessmentPath::Exploratory;
        let sections = collect_sections(path, &full_responses(path));
        assert_eq!(sections.len(), 5);
        assert_eq!(sections[0].title, "Use Case Discovery");
        assert_eq!(sections[4].title, "Business Value / ROI");
        // Only required questions were answered, so optional ones are absent.
        for (category, section) in catalog::CATEGORY_ORDER.iter().zip(&sections) {
            assert_eq!(
                section.entries.len(),
                catalog::required_questions(path, category).len()
            );
        }
    }

    #[test]
    fn digest_contains_category_headers_and_answers() {
        let path = AssessmentPath::Migration;
        let digest = answers_digest(&collect_sections(path, &full_responses(path)));
        assert!(digest.contains("## Data Readiness"));
        assert!(digest.contains("answer to dr_migration_format"));
    }

    #[test]
    fn prompts_lead_with_the_section_name() {
        let p = executive_summary_prompt("Acme", "Q3", "exploratory", "");
        assert!(p.starts_with("Executive summary\n"));
        let p = recommendations_prompt("Acme", "migration", "");
        assert!(p.starts_with("Recommendations\n"));
    }
}

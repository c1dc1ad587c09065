//! Fixed HTML skeleton for generated reports. All questionnaire-sourced
//! values are escaped; only the model-authored prose sections are inserted
//! as markup.

use crate::assessment::CategoryCompletion;

/// One rendered questionnaire category.
pub struct CategorySection {
    pub title: String,
    pub status: CategoryCompletion,
    pub completion_percentage: u8,
    /// (question prompt, answer) pairs in definition order. Unanswered
    /// optional questions are omitted upstream.
    pub entries: Vec<(String, String)>,
}

/// Everything the skeleton interpolates.
pub struct ReportData {
    pub company_name: String,
    pub company_description: String,
    pub assessment_name: String,
    pub path_label: String,
    pub generated_at: String,
    pub overall_percentage: u8,
    pub categories: Vec<CategorySection>,
    /// Model-authored HTML prose.
    pub executive_summary: String,
    /// Model-authored HTML prose.
    pub recommendations: String,
}

/// Escape a value for interpolation into HTML text or attributes.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn badge(status: CategoryCompletion) -> &'static str {
    match status {
        CategoryCompletion::NotStarted => "not started",
        CategoryCompletion::Partial => "partial",
        CategoryCompletion::Completed => "completed",
    }
}

/// Assemble the report document.
pub fn render(data: &ReportData) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>RAPID Assessment Report — {}</title>\n",
        escape(&data.company_name)
    ));
    html.push_str(
        "<style>\n\
         body { font-family: -apple-system, 'Segoe UI', sans-serif; margin: 2rem auto; \
         max-width: 56rem; color: #1a202c; line-height: 1.6; }\n\
         h1 { border-bottom: 3px solid #2b6cb0; padding-bottom: .5rem; }\n\
         h2 { color: #2b6cb0; margin-top: 2rem; }\n\
         table.meta { border-collapse: collapse; margin: 1rem 0; }\n\
         table.meta td { padding: .25rem 1rem .25rem 0; }\n\
         table.meta td:first-child { font-weight: 600; }\n\
         .badge { display: inline-block; padding: .1rem .6rem; border-radius: 1rem; \
         font-size: .8rem; background: #edf2f7; }\n\
         dl { margin: .5rem 0 1.5rem; }\n\
         dt { font-weight: 600; margin-top: .75rem; }\n\
         dd { margin: .25rem 0 0 1rem; }\n\
         </style>\n</head>\n<body>\n",
    );

    html.push_str(&format!(
        "<h1>RAPID Assessment Report</h1>\n\
         <table class=\"meta\">\n\
         <tr><td>Company</td><td>{}</td></tr>\n\
         <tr><td>Assessment</td><td>{}</td></tr>\n\
         <tr><td>Path</td><td>{}</td></tr>\n\
         <tr><td>Overall completion</td><td>{}%</td></tr>\n\
         <tr><td>Generated</td><td>{}</td></tr>\n\
         </table>\n",
        escape(&data.company_name),
        escape(&data.assessment_name),
        escape(&data.path_label),
        data.overall_percentage,
        escape(&data.generated_at),
    ));

    if !data.company_description.trim().is_empty() {
        html.push_str(&format!("<p>{}</p>\n", escape(&data.company_description)));
    }

    html.push_str("<h2>Executive Summary</h2>\n");
    html.push_str(&data.executive_summary);
    html.push('\n');

    for section in &data.categories {
        html.push_str(&format!(
            "<h2>{} <span class=\"badge\">{} — {}%</span></h2>\n<dl>\n",
            escape(&section.title),
            badge(section.status),
            section.completion_percentage,
        ));
        for (prompt, answer) in &section.entries {
            html.push_str(&format!(
                "<dt>{}</dt>\n<dd>{}</dd>\n",
                escape(prompt),
                escape(answer)
            ));
        }
        html.push_str("</dl>\n");
    }

    html.push_str("<h2>Recommendations</h2>\n");
    html.push_str(&data.recommendations);
    html.push_str("\n</body>\n</html>\n");
    html
}

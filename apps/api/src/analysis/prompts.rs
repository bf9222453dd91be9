// Prompt templates for résumé analysis.
// `prepare_instructions` must stay a pure function: identical inputs give identical instructions.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// Categories the model is asked to score. Keys appear verbatim in `categoryScores`.
pub const FEEDBACK_CATEGORIES: [&str; 5] = ["ATS", "toneAndStyle", "content", "structure", "skills"];

pub const ANALYSIS_SYSTEM: &str = "\
You are an expert in applicant tracking systems (ATS) and résumé review. \
You rate résumés honestly against a specific job: a weak résumé gets a low score.";

const INSTRUCTIONS_TEMPLATE: &str = r#"Analyze and rate the attached résumé and explain how to improve it.
Be thorough and specific. Do not inflate scores.

TARGET JOB TITLE:
{job_title}

TARGET JOB DESCRIPTION:
{job_description}

Weigh every category against the job above.

OUTPUT SCHEMA (return exactly this structure):
{
  "overallScore": integer 0-100,
  "categoryScores": {
{category_lines}
  },
  "notes": "string: the most important improvements, in order of impact"
}

RULES:
1. Every score is an integer between 0 and 100.
2. Use exactly the category keys listed in the schema.
3. Return ONLY the JSON object, with no code fences and no other text."#;

const DOCUMENT_TEMPLATE: &str = "The résumé is the attached PDF document.\n\n{instructions}";

/// Builds the instruction payload sent with the résumé for one job.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    let category_lines = FEEDBACK_CATEGORIES
        .iter()
        .map(|c| format!("    \"{c}\": integer 0-100"))
        .collect::<Vec<_>>()
        .join(",\n");

    fill(
        INSTRUCTIONS_TEMPLATE,
        &[
            ("category_lines", category_lines.as_str()),
            ("job_title", job_title.trim()),
            ("job_description", job_description.trim()),
        ],
    )
}

/// Full system prompt for the analysis call.
pub fn analysis_system() -> String {
    format!("{ANALYSIS_SYSTEM} {JSON_ONLY_SYSTEM}")
}

/// Text block sent alongside the résumé PDF.
pub fn document_prompt(instructions: &str) -> String {
    fill(DOCUMENT_TEMPLATE, &[("instructions", instructions)])
}

/// Single-pass `{slot}` substitution. Substituted values are never rescanned,
/// so user text containing `{job_title}` stays literal.
fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        for (name, value) in slots {
            if let Some(after) = tail.strip_prefix(name).and_then(|t| t.strip_prefix('}')) {
                out.push_str(value);
                rest = after;
                continue 'scan;
            }
        }
        out.push('{');
        rest = tail;
    }
    out.push_str(rest);
    out
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The durable unit: one submitted résumé and, eventually, its analysis.
///
/// Everything except `feedback` is fixed once the record is first persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub resume_ref: String,
    pub image_ref: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub feedback: Feedback,
}

impl ResumeRecord {
    /// A record whose uploads are done but whose analysis has not come back yet.
    pub fn pending(
        id: Uuid,
        resume_ref: String,
        image_ref: String,
        company_name: String,
        job_title: String,
        job_description: String,
    ) -> Self {
        Self {
            id,
            resume_ref,
            image_ref,
            company_name,
            job_title,
            job_description,
            feedback: Feedback::Pending,
        }
    }

    pub fn overall_score(&self) -> Option<u8> {
        match &self.feedback {
            Feedback::Scored(result) => Some(result.overall_score),
            _ => None,
        }
    }
}

/// Analysis state of a record.
///
/// Wire shape: `""` while pending, the result object once scored, and
/// `{"parseError": "<raw text>"}` when the AI answer could not be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FeedbackRepr", into = "FeedbackRepr")]
pub enum Feedback {
    #[default]
    Pending,
    Scored(AnalysisResult),
    ParseError(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FeedbackRepr {
    Pending(String),
    ParseError {
        #[serde(rename = "parseError")]
        parse_error: String,
    },
    Scored(AnalysisResult),
}

impl TryFrom<FeedbackRepr> for Feedback {
    type Error = String;

    fn try_from(repr: FeedbackRepr) -> Result<Self, Self::Error> {
        match repr {
            FeedbackRepr::Pending(s) if s.is_empty() => Ok(Feedback::Pending),
            FeedbackRepr::Pending(s) => Err(format!("unexpected feedback string {s:?}")),
            FeedbackRepr::ParseError { parse_error } => Ok(Feedback::ParseError(parse_error)),
            FeedbackRepr::Scored(result) => Ok(Feedback::Scored(result)),
        }
    }
}

impl From<Feedback> for FeedbackRepr {
    fn from(feedback: Feedback) -> Self {
        match feedback {
            Feedback::Pending => FeedbackRepr::Pending(String::new()),
            Feedback::ParseError(raw) => FeedbackRepr::ParseError { parse_error: raw },
            Feedback::Scored(result) => FeedbackRepr::Scored(result),
        }
    }
}

/// Structured result returned by the AI backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub overall_score: u8, // 0 – 100
    #[serde(default)]
    pub category_scores: BTreeMap<String, u8>,
    #[serde(default)]
    pub notes: String,
}

impl AnalysisResult {
    /// Rejects scores above 100. Negative or fractional scores never get this far
    /// because they fail to deserialize into `u8`.
    pub fn validate(&self) -> Result<(), String> {
        if self.overall_score > 100 {
            return Err(format!(
                "overallScore {} is outside 0–100",
                self.overall_score
            ));
        }
        if let Some((category, score)) = self.category_scores.iter().find(|(_, s)| **s > 100) {
            return Err(format!("score {score} for category {category:?} is outside 0–100"));
        }
        Ok(())
    }
}

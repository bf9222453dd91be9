use serde::Serialize;
use uuid::Uuid;

use crate::models::resume::{Feedback, ResumeRecord};
use crate::presentation::score_circle::{self, ScoreCircle, ScoreSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Pending,
    Scored,
    Unreadable,
}

/// One entry of the home-page list.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeCard {
    pub id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub status: CardStatus,
    /// Medium circle, present only for scored records.
    pub score: Option<ScoreCircle>,
    pub image_url: String,
    pub detail_path: String,
}

impl ResumeCard {
    pub fn from_record(record: &ResumeRecord) -> Self {
        let (status, score) = match &record.feedback {
            Feedback::Pending => (CardStatus::Pending, None),
            Feedback::ParseError(_) => (CardStatus::Unreadable, None),
            Feedback::Scored(result) => (
                CardStatus::Scored,
                Some(score_circle::render(
                    i64::from(result.overall_score),
                    ScoreSize::Medium,
                )),
            ),
        };

        Self {
            id: record.id,
            company_name: record.company_name.clone(),
            job_title: record.job_title.clone(),
            status,
            score,
            image_url: format!("/api/v1/resumes/{}/image", record.id),
            detail_path: format!("/resume/{}", record.id),
        }
    }
}

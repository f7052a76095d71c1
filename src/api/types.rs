//! Wire types for the recruiting backend.
//!
//! Fields the backend sometimes omits are optional and default when absent;
//! unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reply to the interview start request.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StartResponse {
    pub message_to_candidate: String,
    pub question_id: i64,
    #[serde(default)]
    pub questions_count: Option<u32>,
    #[serde(default)]
    pub audio_fid: Option<String>,
    #[serde(default)]
    pub audio_filename: Option<String>,
}

/// Reply to an uploaded answer.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AnswerResponse {
    #[serde(default)]
    pub message_to_candidate: Option<String>,
    #[serde(default)]
    pub question_id: Option<i64>,
    /// Non-empty once the interview has finished
    #[serde(default)]
    pub interview_result: Option<Map<String, Value>>,
    #[serde(default)]
    pub audio_fid: Option<String>,
    #[serde(default)]
    pub audio_filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Question {
    pub id: i64,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub hint_for_evaluation: Option<String>,
    /// Allowance in minutes
    #[serde(default)]
    pub response_time: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Vacancy {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skill_lvl: Option<String>,
    #[serde(default)]
    pub question_response_time: Option<f64>,
    #[serde(default)]
    pub questions_type: Option<String>,
}

/// Resume screening verdict returned when applying to a vacancy.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApplyResponse {
    #[serde(default)]
    pub accordance_xp_vacancy_score: f64,
    #[serde(default)]
    pub accordance_skill_vacancy_score: f64,
    #[serde(default)]
    pub interview_link: Option<String>,
}

impl ApplyResponse {
    const PASSING_SCORE: f64 = 3.0;

    /// Both accordance scores must reach the passing mark.
    pub fn passed(&self) -> bool {
        self.accordance_xp_vacancy_score >= Self::PASSING_SCORE
            && self.accordance_skill_vacancy_score >= Self::PASSING_SCORE
    }

    /// Interview id taken from the last path segment of the invitation link.
    pub fn interview_id(&self) -> Option<&str> {
        self.interview_link
            .as_deref()?
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
    }
}

/// A resume that passed batch screening, with the candidate's contact details.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResumeEvaluation {
    #[serde(default)]
    pub candidate_name: String,
    #[serde(default)]
    pub candidate_email: String,
    #[serde(default)]
    pub candidate_phone: String,
    #[serde(default)]
    pub accordance_xp_vacancy_score: f64,
    #[serde(default)]
    pub accordance_skill_vacancy_score: f64,
}

/// Outcome of screening a batch of resumes.
///
/// Only passing resumes are listed; each of them has been invited to interview.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScreeningReport {
    #[serde(default)]
    pub evaluation_resumes: Vec<ResumeEvaluation>,
}

impl ScreeningReport {
    pub fn passed(&self) -> usize {
        self.evaluation_resumes.len()
    }

    /// Resumes out of `submitted` that did not pass.
    pub fn failed(&self, submitted: usize) -> usize {
        submitted.saturating_sub(self.passed())
    }
}

/// One candidate's interview as listed for a vacancy.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InterviewSummary {
    pub id: i64,
    pub vacancy_id: i64,
    #[serde(default)]
    pub candidate_email: String,
    #[serde(default)]
    pub general_score: Option<f64>,
    #[serde(default)]
    pub general_result: Option<String>,
    #[serde(default)]
    pub general_recommendation: Option<String>,
    #[serde(default)]
    pub strong_areas: Option<String>,
    #[serde(default)]
    pub weak_areas: Option<String>,
    #[serde(default)]
    pub message_to_hr: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct InterviewDetails {
    #[serde(default)]
    pub candidate_answers: Vec<CandidateAnswer>,
    #[serde(default)]
    pub interview_messages: Vec<InterviewMessage>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CandidateAnswer {
    pub id: i64,
    pub question_id: i64,
    #[serde(default)]
    pub response_time: Option<f64>,
    #[serde(default)]
    pub message_ids: Vec<i64>,
    #[serde(default, alias = "llm_comment")]
    pub message_to_hr: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InterviewMessage {
    pub id: i64,
    pub question_id: i64,
    /// "assistant" or "user"
    pub role: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_passes_only_when_both_scores_reach_three() {
        let verdict = |xp: f64, skill: f64| ApplyResponse {
            accordance_xp_vacancy_score: xp,
            accordance_skill_vacancy_score: skill,
            interview_link: None,
        };

        assert!(verdict(3.0, 3.0).passed());
        assert!(verdict(5.0, 4.0).passed());
        assert!(!verdict(2.9, 5.0).passed());
        assert!(!verdict(5.0, 1.0).passed());
    }

    #[test]
    fn interview_id_is_last_link_segment() {
        let response: ApplyResponse = serde_json::from_str(
            r#"{"accordance_xp_vacancy_score":4,"accordance_skill_vacancy_score":3,
                "interview_link":"https://vtb-aihr.ru/interview/abc123/","extra":true}"#,
        )
        .unwrap();
        assert_eq!(response.interview_id(), Some("abc123"));

        let bare = ApplyResponse {
            interview_link: Some("abc123".into()),
            ..response.clone()
        };
        assert_eq!(bare.interview_id(), Some("abc123"));

        let missing = ApplyResponse {
            interview_link: None,
            ..response
        };
        assert_eq!(missing.interview_id(), None);
    }

    #[test]
    fn answer_response_tolerates_missing_fields() {
        let response: AnswerResponse =
            serde_json::from_str(r#"{"interview_result":{}}"#).unwrap();
        assert_eq!(response.interview_result, Some(Map::new()));
        assert_eq!(response.question_id, None);
    }

    #[test]
    fn details_accept_llm_comment_alias() {
        let details: InterviewDetails = serde_json::from_str(
            r#"{"candidate_answers":[{"id":1,"question_id":2,"llm_comment":"Solid","score":8}],
                "interview_messages":[{"id":5,"question_id":2,"role":"user","text":"Hi"}]}"#,
        )
        .unwrap();
        assert_eq!(
            details.candidate_answers[0].message_to_hr.as_deref(),
            Some("Solid")
        );
        assert_eq!(details.interview_messages[0].role, "user");
    }

    #[test]
    fn screening_counts_missing_resumes_as_failed() {
        let report: ScreeningReport = serde_json::from_value(serde_json::json!({
            "evaluation_resumes": [{
                "candidate_name": "Jo Doe",
                "candidate_email": "jo@example.com",
                "candidate_phone": "+7 900 000-00-00",
                "accordance_xp_vacancy_score": 4,
                "accordance_skill_vacancy_score": 3.5
            }]
        }))
        .unwrap();

        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(3), 2);
        assert_eq!(report.failed(0), 0);
        assert_eq!(report.evaluation_resumes[0].accordance_skill_vacancy_score, 3.5);
    }
}

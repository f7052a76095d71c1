//! Interview endpoints: start, answer upload, question list and review details.

use super::types::{AnswerResponse, InterviewDetails, Question, StartResponse};
use super::{ApiClient, ApiError};
use crate::capture::AudioClip;
use crate::interview::{AnswerOutcome, AnswerSubmission, AudioRef, Prompt, QuestionId};
use reqwest::multipart::{Form, Part};
use serde_json::json;

impl ApiClient {
    /// Starts (or resumes) an interview and returns its opening prompt.
    pub async fn start_interview(&self, interview_id: &str) -> Result<Prompt, ApiError> {
        tracing::debug!(
            "Interview API Call:\n  URL: {}\n  Method: POST\n  Body: interview_id={}",
            self.url("/vacancy/interview/start"),
            interview_id
        );

        let response = self
            .send(
                self.http
                    .post(self.url("/vacancy/interview/start"))
                    .json(&json!({ "interview_id": interview_id })),
                "Interview",
            )
            .await?;
        let start: StartResponse = Self::json(response).await?;

        Ok(Prompt {
            audio: self.prompt_audio(start.audio_fid.as_deref(), start.audio_filename.as_deref()),
            text: start.message_to_candidate,
            question: QuestionId(start.question_id),
            total_questions: start.questions_count,
        })
    }

    /// Uploads a recorded answer.
    ///
    /// # Errors
    /// - `Malformed` if the reply carries neither a result nor a next question
    pub async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<AnswerOutcome, ApiError> {
        let audio = Part::bytes(submission.clip.wav_bytes().to_vec())
            .file_name(AudioClip::FILE_NAME)
            .mime_str(AudioClip::MIME_TYPE)
            .map_err(|e| ApiError::Malformed(format!("Failed to create audio part: {e}")))?;

        let form = Form::new()
            .text("vacancy_id", submission.vacancy_id.to_string())
            .text("question_id", submission.question.to_string())
            .text("interview_id", submission.interview_id.clone())
            .part("audio_file", audio);

        tracing::debug!(
            "Interview API Call:\n  URL: {}\n  Method: POST\n  Content-Type: multipart/form-data\n  Body parameters: vacancy_id={} question_id={} interview_id={} audio_file=<{} bytes>",
            self.url("/vacancy/interview/answer"),
            submission.vacancy_id,
            submission.question,
            submission.interview_id,
            submission.clip.wav_bytes().len()
        );

        let response = self
            .send(
                self.http
                    .post(self.url("/vacancy/interview/answer"))
                    .multipart(form),
                "Interview",
            )
            .await?;
        let answer: AnswerResponse = Self::json(response).await?;
        self.answer_outcome(answer)
    }

    fn answer_outcome(&self, answer: AnswerResponse) -> Result<AnswerOutcome, ApiError> {
        if let Some(result) = answer.interview_result.filter(|r| !r.is_empty()) {
            return Ok(AnswerOutcome::Completed(result));
        }

        match (answer.message_to_candidate, answer.question_id) {
            (Some(text), Some(question)) => Ok(AnswerOutcome::Next(Prompt {
                audio: self.prompt_audio(
                    answer.audio_fid.as_deref(),
                    answer.audio_filename.as_deref(),
                ),
                text,
                question: QuestionId(question),
                total_questions: None,
            })),
            _ => Err(ApiError::Malformed(
                "answer reply had neither a result nor a next question".to_string(),
            )),
        }
    }

    fn prompt_audio(&self, fid: Option<&str>, filename: Option<&str>) -> Option<AudioRef> {
        match (fid, filename) {
            (Some(fid), Some(filename)) if !fid.is_empty() && !filename.is_empty() => {
                Some(AudioRef::Remote(self.audio_url(fid, filename)))
            }
            _ => None,
        }
    }

    /// Lists the questions configured for a vacancy.
    pub async fn questions(&self, vacancy_id: i64) -> Result<Vec<Question>, ApiError> {
        let response = self
            .send(
                self.http
                    .get(self.url(&format!("/vacancy/question/all/{vacancy_id}"))),
                "Vacancy",
            )
            .await?;
        Self::json(response).await
    }

    /// Per-answer scores and the message log of a finished interview.
    pub async fn interview_details(&self, interview_id: i64) -> Result<InterviewDetails, ApiError> {
        let response = self
            .send(
                self.http
                    .get(self.url(&format!("/vacancy/interview/{interview_id}/details"))),
                "Interview",
            )
            .await?;
        Self::json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::serve;
    use axum::extract::{Multipart, Path};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    fn submission() -> AnswerSubmission {
        AnswerSubmission {
            interview_id: "abc123".into(),
            vacancy_id: 7,
            question: QuestionId(1),
            clip: Arc::new(AudioClip::from_samples(&[1, 2, 3, 4], 16000).unwrap()),
        }
    }

    fn answering(reply: Value) -> Router {
        Router::new().route(
            "/api/vacancy/interview/answer",
            post(move || async move { Json(reply) }),
        )
    }

    #[tokio::test]
    async fn start_returns_opening_prompt_with_audio() {
        let seen = Arc::new(Mutex::new(None));
        let recorded = Arc::clone(&seen);
        let router = Router::new().route(
            "/api/vacancy/interview/start",
            post(move |Json(body): Json<Value>| async move {
                *recorded.lock().unwrap() = Some(body);
                Json(serde_json::json!({
                    "message_to_candidate": "Tell me about yourself",
                    "question_id": 1,
                    "questions_count": 5,
                    "audio_fid": "f 1",
                    "audio_filename": "intro.mp3"
                }))
            }),
        );
        let client = serve(router).await;

        let prompt = client.start_interview("abc123").await.unwrap();

        assert_eq!(prompt.text, "Tell me about yourself");
        assert_eq!(prompt.question, QuestionId(1));
        assert_eq!(prompt.total_questions, Some(5));
        assert_eq!(
            prompt.audio,
            Some(AudioRef::Remote(format!(
                "{}/file/f%201/intro.mp3",
                client.base_url()
            )))
        );
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some(serde_json::json!({"interview_id": "abc123"}))
        );
    }

    #[tokio::test]
    async fn start_on_unknown_interview_is_not_found() {
        let client = serve(Router::new()).await;

        let err = client.start_interview("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn answer_upload_carries_ids_and_wav() {
        let fields = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&fields);
        let router = Router::new().route(
            "/api/vacancy/interview/answer",
            post(move |mut multipart: Multipart| async move {
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    let file_name = field.file_name().map(str::to_string);
                    let data = field.bytes().await.unwrap();
                    recorded.lock().unwrap().push((name, file_name, data.to_vec()));
                }
                Json(serde_json::json!({
                    "message_to_candidate": "Next question",
                    "question_id": 2,
                    "interview_result": {}
                }))
            }),
        );
        let client = serve(router).await;

        let outcome = client.submit_answer(&submission()).await.unwrap();

        match outcome {
            AnswerOutcome::Next(prompt) => {
                assert_eq!(prompt.text, "Next question");
                assert_eq!(prompt.question, QuestionId(2));
                assert_eq!(prompt.audio, None);
            }
            other => panic!("expected next question, got {other:?}"),
        }

        let fields = fields.lock().unwrap();
        let text = |name: &str| {
            fields
                .iter()
                .find(|(n, _, _)| n == name)
                .map(|(_, _, data)| String::from_utf8(data.clone()).unwrap())
        };
        assert_eq!(text("vacancy_id").as_deref(), Some("7"));
        assert_eq!(text("question_id").as_deref(), Some("1"));
        assert_eq!(text("interview_id").as_deref(), Some("abc123"));
        let (_, file_name, data) = fields
            .iter()
            .find(|(n, _, _)| n == "audio_file")
            .unwrap();
        assert_eq!(file_name.as_deref(), Some("audio.wav"));
        assert_eq!(&data[..4], b"RIFF");
    }

    #[tokio::test]
    async fn non_empty_result_completes_interview() {
        let client = serve(answering(serde_json::json!({
            "interview_result": {"general_score": 8, "general_result": "next"}
        })))
        .await;

        let outcome = client.submit_answer(&submission()).await.unwrap();
        match outcome {
            AnswerOutcome::Completed(result) => assert_eq!(result["general_score"], 8),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reply_without_result_or_question_is_malformed() {
        let client = serve(answering(serde_json::json!({"interview_result": {}}))).await;

        let err = client.submit_answer(&submission()).await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn server_failure_is_reported_as_status() {
        let router = Router::new().route(
            "/api/vacancy/interview/answer",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let client = serve(router).await;

        let err = client.submit_answer(&submission()).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn questions_are_fetched_per_vacancy() {
        let router = Router::new().route(
            "/api/vacancy/question/all/:vacancy_id",
            get(|Path(vacancy_id): Path<i64>| async move {
                Json(serde_json::json!([
                    {"id": 1, "question": format!("Q for {vacancy_id}"), "response_time": 2},
                    {"id": 2, "question": "Other", "response_time": null, "weight": 0.5}
                ]))
            }),
        );
        let client = serve(router).await;

        let questions = client.questions(7).await.unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "Q for 7");
        assert_eq!(questions[0].response_time, Some(2.0));
        assert_eq!(questions[1].response_time, None);
    }
}

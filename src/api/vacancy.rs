//! Vacancy endpoints: listing, applying, resume screening and interview summaries.

use super::types::{ApplyResponse, InterviewSummary, ScreeningReport, Vacancy};
use super::{ApiClient, ApiError};
use reqwest::multipart::{Form, Part};

impl ApiClient {
    pub async fn vacancies(&self) -> Result<Vec<Vacancy>, ApiError> {
        let response = self
            .send(self.http.get(self.url("/vacancy/all")), "Vacancy list")
            .await?;
        Self::json(response).await
    }

    /// Finds one vacancy in the full listing.
    pub async fn vacancy(&self, vacancy_id: i64) -> Result<Vacancy, ApiError> {
        self.vacancies()
            .await?
            .into_iter()
            .find(|v| v.id == vacancy_id)
            .ok_or_else(|| ApiError::NotFound(format!("Vacancy {vacancy_id}")))
    }

    /// Submits a resume for a vacancy and returns the screening verdict.
    pub async fn apply(
        &self,
        vacancy_id: i64,
        candidate_email: &str,
        resume_file_name: &str,
        resume: Vec<u8>,
    ) -> Result<ApplyResponse, ApiError> {
        tracing::debug!(
            "Vacancy API Call:\n  URL: {}\n  Method: POST\n  Content-Type: multipart/form-data\n  Body parameters: vacancy_id={} candidate_email={} candidate_resume_file={} ({} bytes)",
            self.url("/vacancy/respond"),
            vacancy_id,
            candidate_email,
            resume_file_name,
            resume.len()
        );

        let form = Form::new()
            .text("vacancy_id", vacancy_id.to_string())
            .text("candidate_email", candidate_email.to_string())
            .part(
                "candidate_resume_file",
                Part::bytes(resume).file_name(resume_file_name.to_string()),
            );

        let response = self
            .send(
                self.http.post(self.url("/vacancy/respond")).multipart(form),
                "Vacancy",
            )
            .await?;
        Self::json(response).await
    }

    /// Screens a batch of resumes against a vacancy.
    ///
    /// `resumes` holds file names with their contents.
    pub async fn evaluate_resumes(
        &self,
        vacancy_id: i64,
        resumes: Vec<(String, Vec<u8>)>,
    ) -> Result<ScreeningReport, ApiError> {
        tracing::debug!(
            "Vacancy API Call:\n  URL: {}\n  Method: POST\n  Content-Type: multipart/form-data\n  Body parameters: vacancy_id={} candidate_resume_files={:?}",
            self.url("/vacancy/evaluate-resumes"),
            vacancy_id,
            resumes.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>()
        );

        let form = resumes.into_iter().fold(
            Form::new().text("vacancy_id", vacancy_id.to_string()),
            |form, (file_name, bytes)| {
                form.part(
                    "candidate_resume_files",
                    Part::bytes(bytes).file_name(file_name),
                )
            },
        );

        let response = self
            .send(
                self.http
                    .post(self.url("/vacancy/evaluate-resumes"))
                    .multipart(form),
                "Vacancy",
            )
            .await?;
        Self::json(response).await
    }

    /// Interviews held for a vacancy with their overall verdicts.
    pub async fn interview_summaries(
        &self,
        vacancy_id: i64,
    ) -> Result<Vec<InterviewSummary>, ApiError> {
        let response = self
            .send(
                self.http
                    .get(self.url(&format!("/vacancy/interview/vacancy/{vacancy_id}"))),
                "Vacancy",
            )
            .await?;
        Self::json(response).await
    }
}

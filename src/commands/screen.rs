//! Screen a batch of candidate resumes against a vacancy.
//!
//! Candidates whose resumes pass are invited to interview by the backend; the
//! report lists them with their accordance scores.

use super::apply::{expand_home, load_vacancy, validate_resume_path, vacancy_summary};
use super::BANNER;
use crate::api::{ApiClient, ResumeEvaluation};
use crate::config::VivaConfig;
use cliclack::{intro, log, note, outro, outro_cancel, spinner};
use console::style;
use std::path::{Path, PathBuf};

/// Resume formats the screening service reads.
const RESUME_EXTENSIONS: &[&str] = &["pdf", "docx", "doc", "txt", "rtf"];

pub async fn handle_screen(vacancy_id: i64, files: Vec<PathBuf>) -> anyhow::Result<()> {
    tracing::info!("=== viva Screen ===");

    ctrlc::set_handler(move || {})
        .map_err(|e| anyhow::anyhow!("Failed to set Ctrl-C handler: {e}"))?;

    let config = VivaConfig::load()?;
    let api = ApiClient::new(&config.api)?;

    println!("{BANNER}");
    intro(style(" screen ").on_white().black())?;

    let vacancy = load_vacancy(&api, vacancy_id).await?;
    note(&vacancy.name, vacancy_summary(&vacancy))?;

    let mut resumes = Vec::new();
    for file in files {
        let path = expand_home(&file.to_string_lossy());
        if let Err(reason) = validate_resume_path(&path) {
            log::warning(format!("Skipping {}: {reason}", path.display()))?;
            continue;
        }
        if !is_supported_resume(&path) {
            log::warning(format!(
                "Skipping {}: supported formats are {}",
                path.display(),
                RESUME_EXTENSIONS.join(", ")
            ))?;
            continue;
        }
        let bytes = std::fs::read(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        resumes.push((file_name(&path), bytes));
    }

    if resumes.is_empty() {
        outro_cancel("No resumes to screen.")?;
        return Ok(());
    }

    let submitted = resumes.len();
    let screening = spinner();
    screening.start(format!("Screening {submitted} resumes..."));
    let report = match api.evaluate_resumes(vacancy.id, resumes).await {
        Ok(report) => {
            screening.stop("Resumes screened");
            report
        }
        Err(e) => {
            screening.error(e.to_string());
            return Err(e.into());
        }
    };

    tracing::info!(
        "Screened {} resumes for vacancy {}: {} passed",
        submitted,
        vacancy.id,
        report.passed()
    );

    log::success(format!("Passed: {}", report.passed()))?;
    log::warning(format!("Did not pass: {}", report.failed(submitted)))?;

    if report.evaluation_resumes.is_empty() {
        outro("No candidate matched this vacancy.")?;
        return Ok(());
    }

    let lines: Vec<String> = report
        .evaluation_resumes
        .iter()
        .map(evaluation_line)
        .collect();
    note("Passing candidates", lines.join("\n"))?;
    outro("Every passing candidate has been invited to interview.")?;

    Ok(())
}

fn is_supported_resume(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RESUME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "resume".to_string())
}

fn evaluation_line(result: &ResumeEvaluation) -> String {
    let name: &str = if result.candidate_name.is_empty() {
        "Unnamed candidate"
    } else {
        &result.candidate_name
    };
    let mut contact = vec![result.candidate_email.as_str(), result.candidate_phone.as_str()];
    contact.retain(|c| !c.is_empty());
    format!(
        "{name} ({})  xp {:.1} · skill {:.1}",
        contact.join(", "),
        result.accordance_xp_vacancy_score,
        result.accordance_skill_vacancy_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_document_formats_only() {
        assert!(is_supported_resume(Path::new("cv.pdf")));
        assert!(is_supported_resume(Path::new("/tmp/CV.DOCX")));
        assert!(is_supported_resume(Path::new("notes.txt")));
        assert!(!is_supported_resume(Path::new("photo.png")));
        assert!(!is_supported_resume(Path::new("resume")));
    }

    #[test]
    fn evaluation_line_shows_contacts_and_scores() {
        let result = ResumeEvaluation {
            candidate_name: "Jo Doe".into(),
            candidate_email: "jo@example.com".into(),
            candidate_phone: String::new(),
            accordance_xp_vacancy_score: 4.0,
            accordance_skill_vacancy_score: 3.5,
        };
        assert_eq!(
            evaluation_line(&result),
            "Jo Doe (jo@example.com)  xp 4.0 · skill 3.5"
        );
    }
}

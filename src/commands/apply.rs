//! Apply to a vacancy with a resume.
//!
//! Interactive flow: pick a vacancy, enter an email, choose a resume file. A
//! passing screening offers to start the interview right away.

use super::interview::handle_interview;
use super::BANNER;
use crate::api::{ApiClient, ApplyResponse, Vacancy};
use crate::config::VivaConfig;
use cliclack::{confirm, input, intro, log, note, outro, outro_cancel, select, spinner};
use console::style;
use std::path::{Path, PathBuf};

/// Handles the apply flow. Arguments given on the command line skip their prompt.
pub async fn handle_apply(
    vacancy_id: Option<i64>,
    email: Option<String>,
    resume: Option<PathBuf>,
) -> anyhow::Result<()> {
    tracing::info!("=== viva Apply ===");

    // cliclack reports Ctrl-C as a cancelled prompt
    ctrlc::set_handler(move || {})
        .map_err(|e| anyhow::anyhow!("Failed to set Ctrl-C handler: {e}"))?;

    let config = VivaConfig::load()?;
    let api = ApiClient::new(&config.api)?;

    println!("{BANNER}");
    intro(style(" apply ").on_white().black())?;

    let vacancy = match vacancy_id {
        Some(id) => load_vacancy(&api, id).await?,
        None => choose_vacancy(&api).await?,
    };
    note(&vacancy.name, vacancy_summary(&vacancy))?;

    let email = match email {
        Some(email) => {
            validate_email(&email).map_err(|e| anyhow::anyhow!(e))?;
            email
        }
        None => input("Your email")
            .placeholder("name@example.com")
            .validate(|value: &String| validate_email(value))
            .interact()
            .map_err(|e| anyhow::anyhow!("Input cancelled: {e}"))?,
    };

    let resume = match resume {
        Some(path) => path,
        None => {
            let path: String = input("Path to your resume")
                .placeholder("~/Documents/resume.pdf")
                .validate(|value: &String| validate_resume_path(&expand_home(value)))
                .interact()
                .map_err(|e| anyhow::anyhow!("Input cancelled: {e}"))?;
            expand_home(&path)
        }
    };
    validate_resume_path(&resume).map_err(|e| anyhow::anyhow!(e))?;

    let resume_bytes = std::fs::read(&resume)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", resume.display()))?;
    let file_name = resume
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "resume".to_string());

    let screening = spinner();
    screening.start("Screening your resume...");
    let verdict = match api.apply(vacancy.id, &email, &file_name, resume_bytes).await {
        Ok(verdict) => {
            screening.stop("Resume screened");
            verdict
        }
        Err(e) => {
            screening.error(e.to_string());
            return Err(e.into());
        }
    };

    tracing::info!(
        "Application to vacancy {}: xp={} skill={} passed={}",
        vacancy.id,
        verdict.accordance_xp_vacancy_score,
        verdict.accordance_skill_vacancy_score,
        verdict.passed()
    );

    match invitation(&verdict) {
        Some(interview_id) => {
            log::success("We liked your resume and invite you to a voice interview.")?;
            note(
                "Your interview",
                format!("viva interview {interview_id} --vacancy {}", vacancy.id),
            )?;
            let start_now = confirm("Start the interview now?")
                .initial_value(true)
                .interact()
                .map_err(|e| anyhow::anyhow!("Confirmation cancelled: {e}"))?;
            if start_now {
                outro("Good luck!")?;
                return handle_interview(interview_id, vacancy.id).await;
            }
            outro("Run the command above whenever you are ready.")?;
        }
        None => {
            outro_cancel(
                "Unfortunately your resume does not match this vacancy. Thank you for applying.",
            )?;
        }
    }

    Ok(())
}

/// Fetches a vacancy given on the command line.
pub(crate) async fn load_vacancy(api: &ApiClient, vacancy_id: i64) -> anyhow::Result<Vacancy> {
    let loading = spinner();
    loading.start("Loading vacancy...");
    match api.vacancy(vacancy_id).await {
        Ok(vacancy) => {
            loading.stop(format!("Vacancy #{}", vacancy.id));
            Ok(vacancy)
        }
        Err(e) => {
            loading.error(e.to_string());
            Err(e.into())
        }
    }
}

/// Lists open vacancies and lets the user pick one.
pub(crate) async fn choose_vacancy(api: &ApiClient) -> anyhow::Result<Vacancy> {
    let loading = spinner();
    loading.start("Loading vacancies...");
    let mut vacancies = match api.vacancies().await {
        Ok(vacancies) => {
            loading.stop(format!("{} open vacancies", vacancies.len()));
            vacancies
        }
        Err(e) => {
            loading.error(e.to_string());
            return Err(e.into());
        }
    };

    if vacancies.is_empty() {
        return Err(anyhow::anyhow!("There are no open vacancies right now"));
    }

    let mut prompt = select("Select a vacancy:");
    for (i, vacancy) in vacancies.iter().enumerate() {
        prompt = prompt.item(i, &vacancy.name, vacancy.tags.join(", "));
    }
    let index: usize = prompt
        .interact()
        .map_err(|e| anyhow::anyhow!("Selection cancelled: {e}"))?;
    Ok(vacancies.swap_remove(index))
}

pub(crate) fn vacancy_summary(vacancy: &Vacancy) -> String {
    let mut lines = Vec::new();
    if let Some(level) = &vacancy.skill_lvl {
        lines.push(format!("Level: {level}"));
    }
    if !vacancy.tags.is_empty() {
        lines.push(format!("Tags: {}", vacancy.tags.join(", ")));
    }
    if !vacancy.description.is_empty() {
        lines.push(vacancy.description.trim().to_string());
    }
    if lines.is_empty() {
        lines.push(format!("Vacancy #{}", vacancy.id));
    }
    lines.join("\n")
}

/// Interview id to start, when the screening passed and a link came back.
fn invitation(verdict: &ApplyResponse) -> Option<String> {
    if !verdict.passed() {
        return None;
    }
    let id = verdict.interview_id();
    if id.is_none() {
        tracing::warn!("Screening passed but no interview link was returned");
    }
    id.map(str::to_string)
}

fn validate_email(value: &str) -> Result<(), &'static str> {
    let value = value.trim();
    match value.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
        _ => Err("Please enter a valid email address"),
    }
}

pub(crate) fn validate_resume_path(path: &Path) -> Result<(), &'static str> {
    if path.is_file() {
        Ok(())
    } else {
        Err("File not found")
    }
}

pub(crate) fn expand_home(value: &str) -> PathBuf {
    let value = value.trim();
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(value)),
        None => PathBuf::from(value),
    }
}

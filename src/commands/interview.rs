//! Voice interview session.
//!
//! Loads configuration, opens the microphone and hands control to the
//! full-screen session until the interview finishes or is ended early.

use crate::api::ApiClient;
use crate::capture::MicrophoneRecorder;
use crate::config::VivaConfig;
use crate::interview::{ControllerSettings, InterviewController, SessionOutcome, SessionRunner};
use crate::ui::show_error;
use console::style;

/// Runs an interview session.
///
/// # Errors
/// - If the configuration is invalid
/// - If the interview or vacancy does not exist
/// - If the terminal cannot be driven
pub async fn handle_interview(interview_id: String, vacancy_id: i64) -> anyhow::Result<()> {
    let interview_id = interview_id.trim().to_string();
    if interview_id.is_empty() {
        show_error(
            "Interview not found",
            "No interview identifier was given.\n\nUse the link from your invitation.",
        )?;
        return Err(anyhow::anyhow!("Missing interview identifier"));
    }

    let config = match VivaConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            show_error(
                "Configuration Error",
                &format!("{err:#}\n\nPlease check your ~/.config/viva/viva.toml file and try again."),
            )?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: api={}, device={}, sample_rate={}Hz, default_response_time={}s",
        config.api.base_url,
        config.audio.device,
        config.audio.sample_rate,
        config.interview.default_response_time_secs
    );

    let api = ApiClient::new(&config.api)?;
    let recorder = MicrophoneRecorder::new(config.audio.device.clone(), config.audio.sample_rate);
    let controller = InterviewController::new(
        interview_id.clone(),
        vacancy_id,
        recorder,
        ControllerSettings::from(&config.interview),
    );

    let outcome = SessionRunner::new(controller, api, vacancy_id, config.audio.reference_level_db)
        .run()
        .await?;

    match outcome {
        SessionOutcome::Completed => {
            println!(
                "{} {}",
                style("✔").green(),
                config.interview.thank_you_message
            );
        }
        SessionOutcome::EndedEarly => {
            println!(
                "{} Interview {} ended before completion.",
                style("■").yellow(),
                interview_id
            );
        }
        SessionOutcome::NotFound(message) => {
            show_error(
                "Interview not found",
                &format!("{message}\n\nCheck the link from your invitation and try again."),
            )?;
            return Err(anyhow::anyhow!(message));
        }
    }

    Ok(())
}

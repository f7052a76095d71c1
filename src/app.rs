//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::config;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Writes the default config on first run.
fn check_and_run_setup() -> anyhow::Result<()> {
    let config_path = config::config_path()?;
    if crate::setup::ensure_config(&config_path)? {
        tracing::info!(
            "First run of viva {}: created {}",
            env!("CARGO_PKG_VERSION"),
            config_path.display()
        );
    }
    Ok(())
}

/// A terminal client for voice-based job interviews
#[derive(Parser)]
#[command(name = "viva")]
#[command(version)]
#[command(about = "\n\n ┓┏┳┓┏┏┓ \n ┗┛┗┗┛┗┻\n\nVoice interviews in your terminal")]
#[command(long_about = "\n\n ┓┏┳┓┏┏┓ \n ┗┛┗┗┛┗┻\n\nA terminal client for voice-based job interviews. The interviewer's questions\nappear as a chat; you answer by recording your voice, with a countdown per question.\n\nEXAMPLES:\n    # Browse open vacancies\n    $ viva vacancies\n    \n    # Apply with your resume (starts the interview if you are invited)\n    $ viva apply --vacancy 3\n    \n    # Take an interview from your invitation link\n    $ viva interview abc123 --vacancy 3\n    \n    # Screen a batch of resumes for a vacancy\n    $ viva screen 3 ~/resumes/*.pdf\n    \n    # Review finished interviews for a vacancy\n    $ viva results 3\n    $ viva results 3 --interview 17\n    \n    # Edit configuration file\n    $ viva config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/viva/viva.toml\n    Logs:               ~/.local/state/viva/viva.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a voice interview
    ///
    /// Enter or Space starts and stops recording your answer, which is sent as
    /// soon as you stop. Up/Down select a message, p plays its audio, q ends the
    /// interview after confirmation. Sending SIGUSR1 toggles recording too.
    #[command(visible_alias = "i")]
    Interview {
        /// Interview identifier from your invitation link
        #[arg(value_name = "INTERVIEW_ID")]
        interview_id: String,

        /// Vacancy the interview belongs to
        #[arg(short, long, value_name = "ID")]
        vacancy: i64,
    },

    /// Apply to a vacancy with your resume
    ///
    /// Prompts for anything not given as an option. If your resume passes
    /// screening you can start the interview right away.
    #[command(visible_alias = "a")]
    Apply {
        /// Vacancy to apply to
        #[arg(short, long, value_name = "ID")]
        vacancy: Option<i64>,

        /// Contact email
        #[arg(short, long)]
        email: Option<String>,

        /// Resume file to upload
        #[arg(short, long, value_name = "FILE")]
        resume: Option<PathBuf>,
    },

    /// List open vacancies
    #[command(visible_alias = "v")]
    Vacancies,

    /// List a vacancy's interview questions and response times
    Questions {
        /// Vacancy id
        #[arg(value_name = "VACANCY_ID")]
        vacancy: i64,
    },

    /// Screen candidate resumes against a vacancy
    ///
    /// Uploads every resume at once; candidates who pass are invited to
    /// interview. Supported formats: PDF, DOCX, DOC, TXT, RTF.
    Screen {
        /// Vacancy id
        #[arg(value_name = "VACANCY_ID")]
        vacancy: i64,

        /// Resume files to screen
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
    },

    /// Review interview results for a vacancy
    ///
    /// Lists every candidate's verdict, or one interview's answers with scores.
    Results {
        /// Vacancy id
        #[arg(value_name = "VACANCY_ID")]
        vacancy: i64,

        /// Show answers and messages of this interview
        #[arg(short, long, value_name = "ID")]
        interview: Option<i64>,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in viva.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   viva completions bash > viva.bash
    ///   viva completions zsh > _viva
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that need neither logging nor config
    match &cli.command {
        None => {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "viva", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            if let Err(e) = commands::handle_list_devices() {
                eprintln!("Error: {e}");
                process::exit(1);
            }
            return Ok(());
        }
        Some(Commands::Logs) => {
            if let Err(e) = commands::handle_logs() {
                eprintln!("Error: {e}");
                process::exit(1);
            }
            return Ok(());
        }
        _ => {}
    }

    logging::init_logging()?;
    check_and_run_setup()?;

    let result = match cli.command {
        Some(Commands::Interview {
            interview_id,
            vacancy,
        }) => commands::handle_interview(interview_id, vacancy).await,
        Some(Commands::Apply {
            vacancy,
            email,
            resume,
        }) => commands::handle_apply(vacancy, email, resume).await,
        Some(Commands::Vacancies) => commands::handle_vacancies().await,
        Some(Commands::Questions { vacancy }) => commands::handle_questions(vacancy).await,
        Some(Commands::Screen { vacancy, files }) => commands::handle_screen(vacancy, files).await,
        Some(Commands::Results { vacancy, interview }) => {
            commands::handle_results(vacancy, interview).await
        }
        Some(Commands::Config) => commands::handle_config(),
        None
        | Some(Commands::Completions { .. })
        | Some(Commands::ListDevices)
        | Some(Commands::Logs) => unreachable!("These commands are handled earlier"),
    };

    if let Err(e) = &result {
        // cliclack already printed its own cancellation notice
        let message = e.to_string();
        if message.contains("cancelled") || message.contains("interrupted") {
            process::exit(0);
        }
        tracing::error!("Command failed: {e:#}");
    }
    result
}

//! Application command handlers for viva.
//!
//! # Commands
//! - `interview`: Voice interview session (the core of the application)
//! - `apply`: Submit a resume for a vacancy and optionally start the interview
//! - `vacancies`: List open vacancies
//! - `questions`: List a vacancy's questions and response times
//! - `results`: Review finished interviews for a vacancy
//! - `screen`: Screen a batch of candidate resumes against a vacancy
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod apply;
pub mod config;
pub mod interview;
pub mod list_devices;
pub mod logs;
pub mod questions;
pub mod results;
pub mod screen;
pub mod vacancies;

pub use apply::handle_apply;
pub use config::handle_config;
pub use interview::handle_interview;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use questions::handle_questions;
pub use results::handle_results;
pub use screen::handle_screen;
pub use vacancies::handle_vacancies;

/// Banner printed above command output.
pub const BANNER: &str = "\n ┓┏┳┓┏┏┓ \n ┗┛┗┗┛┗┻ \n";

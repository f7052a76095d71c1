//! List open vacancies.

use super::BANNER;
use crate::api::{ApiClient, Vacancy};
use crate::config::VivaConfig;
use console::style;

/// Prints every open vacancy with its id, level and tags.
pub async fn handle_vacancies() -> anyhow::Result<()> {
    let config = VivaConfig::load()?;
    let api = ApiClient::new(&config.api)?;

    let vacancies = api.vacancies().await?;
    tracing::info!("Listed {} vacancies", vacancies.len());

    if vacancies.is_empty() {
        println!("There are no open vacancies right now.");
        return Ok(());
    }

    println!("{BANNER}");
    println!("Open vacancies:");
    println!();
    for vacancy in &vacancies {
        println!("{}", vacancy_line(vacancy));
        if !vacancy.tags.is_empty() {
            println!("    {}", style(vacancy.tags.join(", ")).dim());
        }
        println!();
    }
    println!("Apply with: viva apply --vacancy <ID>");

    Ok(())
}

fn vacancy_line(vacancy: &Vacancy) -> String {
    let level = vacancy
        .skill_lvl
        .as_deref()
        .map(|level| format!(" [{level}]"))
        .unwrap_or_default();
    format!("  {:>4}  {}{}", style(vacancy.id).bold(), vacancy.name, level)
}

//! List a vacancy's interview questions and their response-time allowances.

use crate::api::{ApiClient, Question};
use crate::config::VivaConfig;
use crate::interview::{format_mm_ss, QuestionCatalog, QuestionId};
use console::style;

pub async fn handle_questions(vacancy_id: i64) -> anyhow::Result<()> {
    let config = VivaConfig::load()?;
    let api = ApiClient::new(&config.api)?;

    let questions = api.questions(vacancy_id).await?;
    tracing::info!("Vacancy {} has {} questions", vacancy_id, questions.len());

    if questions.is_empty() {
        println!("Vacancy {vacancy_id} has no interview questions yet.");
        return Ok(());
    }

    let catalog = QuestionCatalog::from_questions(&questions);
    println!();
    println!("Interview questions for vacancy {vacancy_id}:");
    println!();
    for (number, question) in questions.iter().enumerate() {
        println!(
            "{}",
            question_line(
                number + 1,
                question,
                &catalog,
                config.interview.default_response_time_secs
            )
        );
        if let Some(hint) = question.hint_for_evaluation.as_deref().filter(|h| !h.is_empty()) {
            println!("      {}", style(format!("Evaluation: {hint}")).dim());
        }
    }
    println!();

    Ok(())
}

fn question_line(
    number: usize,
    question: &Question,
    catalog: &QuestionCatalog,
    default_secs: u32,
) -> String {
    let allowance = match catalog.allowance_secs(QuestionId(question.id)) {
        Some(secs) => format_mm_ss(secs),
        None => format!("{} (default)", format_mm_ss(default_secs)),
    };
    let kind = question
        .question_type
        .as_deref()
        .map(|kind| format!(" [{kind}]"))
        .unwrap_or_default();
    format!("  {number:>2}. {}{kind}  {allowance}", question.question)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, response_time: Option<f64>) -> Question {
        Question {
            id,
            question: "Tell me about yourself".into(),
            question_type: Some("soft".into()),
            weight: None,
            hint_for_evaluation: None,
            response_time,
        }
    }

    #[test]
    fn shows_allowance_or_default() {
        let timed = question(1, Some(2.0));
        let untimed = question(2, None);
        let catalog = QuestionCatalog::from_questions(&[timed.clone(), untimed.clone()]);

        assert_eq!(
            question_line(1, &timed, &catalog, 90),
            "   1. Tell me about yourself [soft]  02:00"
        );
        assert_eq!(
            question_line(2, &untimed, &catalog, 90),
            "   2. Tell me about yourself [soft]  01:30 (default)"
        );
    }
}

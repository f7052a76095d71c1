//! Recruiter review of interviews held for a vacancy.
//!
//! Without an interview id this lists every candidate's overall verdict. With
//! one it walks through the answers question by question, with the score and
//! comment the backend assigned and the conversation that led to them.

use crate::api::{
    ApiClient, CandidateAnswer, InterviewDetails, InterviewMessage, InterviewSummary, Question,
};
use crate::config::VivaConfig;
use console::style;

pub async fn handle_results(vacancy_id: i64, interview_id: Option<i64>) -> anyhow::Result<()> {
    let config = VivaConfig::load()?;
    let api = ApiClient::new(&config.api)?;

    let summaries = api.interview_summaries(vacancy_id).await?;

    let Some(interview_id) = interview_id else {
        print_summaries(vacancy_id, &summaries);
        return Ok(());
    };

    let summary = summaries.iter().find(|s| s.id == interview_id);
    let (details, questions) = tokio::try_join!(
        api.interview_details(interview_id),
        api.questions(vacancy_id)
    )?;
    tracing::info!(
        "Interview {}: {} answers, {} messages",
        interview_id,
        details.candidate_answers.len(),
        details.interview_messages.len()
    );

    println!();
    match summary {
        Some(summary) => print_summary(summary),
        None => println!("{}", style(format!("Interview #{interview_id}")).bold()),
    }

    for review in answer_reviews(&details, &questions) {
        println!();
        println!(
            "{} {}",
            style(format!("Q{}", review.number)).bold(),
            review.question
        );
        let score = review
            .answer
            .score
            .map(|s| format!("{s}"))
            .unwrap_or_else(|| "–".to_string());
        println!("    Score: {}", style(score).cyan());
        if let Some(comment) = review.answer.message_to_hr.as_deref() {
            println!("    {}", style(comment).dim());
        }
        for message in review.messages {
            let speaker = if message.role == "user" {
                style("Candidate").green()
            } else {
                style("Interviewer").blue()
            };
            println!("      {speaker}: {}", message.text);
        }
    }
    println!();

    Ok(())
}

fn print_summaries(vacancy_id: i64, summaries: &[InterviewSummary]) {
    if summaries.is_empty() {
        println!("No interviews have been held for vacancy {vacancy_id} yet.");
        return;
    }

    println!();
    println!("Interviews for vacancy {vacancy_id}:");
    for summary in summaries {
        println!();
        print_summary(summary);
    }
    println!();
    println!("Details: viva results {vacancy_id} --interview <ID>");
}

fn print_summary(summary: &InterviewSummary) {
    let verdict = summary.general_result.as_deref().unwrap_or("pending");
    let verdict = match verdict {
        "next" => style(verdict).green(),
        "rejected" => style(verdict).red(),
        _ => style(verdict).yellow(),
    };
    let score = summary
        .general_score
        .map(|s| format!("  score {s}"))
        .unwrap_or_default();
    println!(
        "  {:>4}  {}  {verdict}{score}",
        style(summary.id).bold(),
        summary.candidate_email
    );
    for (label, text) in [
        ("Strong", &summary.strong_areas),
        ("Weak", &summary.weak_areas),
        ("Recommendation", &summary.general_recommendation),
        ("For HR", &summary.message_to_hr),
    ] {
        if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
            println!("        {}: {}", style(label).dim(), text);
        }
    }
}

/// One answered question with its scoring and messages.
struct AnswerReview<'a> {
    number: usize,
    question: &'a str,
    answer: &'a CandidateAnswer,
    messages: Vec<&'a InterviewMessage>,
}

fn answer_reviews<'a>(
    details: &'a InterviewDetails,
    questions: &'a [Question],
) -> Vec<AnswerReview<'a>> {
    details
        .candidate_answers
        .iter()
        .enumerate()
        .map(|(i, answer)| AnswerReview {
            number: i + 1,
            question: questions
                .iter()
                .find(|q| q.id == answer.question_id)
                .map(|q| q.question.as_str())
                .unwrap_or("(question text unavailable)"),
            answer,
            messages: details
                .interview_messages
                .iter()
                .filter(|m| m.question_id == answer.question_id)
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reviews_follow_answer_order_and_group_messages() {
        let details: InterviewDetails = serde_json::from_value(serde_json::json!({
            "candidate_answers": [
                {"id": 1, "question_id": 20, "score": 6},
                {"id": 2, "question_id": 10, "score": 9, "message_to_hr": "Strong"}
            ],
            "interview_messages": [
                {"id": 1, "question_id": 10, "role": "assistant", "text": "Q ten"},
                {"id": 2, "question_id": 20, "role": "assistant", "text": "Q twenty"},
                {"id": 3, "question_id": 10, "role": "user", "text": "A ten"}
            ]
        }))
        .unwrap();
        let questions: Vec<Question> = serde_json::from_value(serde_json::json!([
            {"id": 10, "question": "Ten?"}
        ]))
        .unwrap();

        let reviews = answer_reviews(&details, &questions);

        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].question, "(question text unavailable)");
        assert_eq!(reviews[0].messages.len(), 1);
        assert_eq!(reviews[1].number, 2);
        assert_eq!(reviews[1].question, "Ten?");
        let texts: Vec<&str> = reviews[1].messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Q ten", "A ten"]);
    }
}

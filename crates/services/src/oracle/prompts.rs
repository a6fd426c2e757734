//! Prompt builders for the HTTP oracle. Each prompt instructs the model to
//! return bare JSON; [`strip_json_fences`] cleans up models that wrap their
//! output in markdown fences anyway.

use std::fmt::Write as _;

use interview_core::model::{CandidateProfile, Question};

use super::SessionContext;

pub(crate) const INTERVIEWER_SYSTEM: &str = "You are a senior software engineer conducting a \
     technical interview. Return ONLY valid JSON. No markdown, no code fences.";

pub(crate) const EVALUATOR_SYSTEM: &str = "You are a strict but fair technical interviewer \
     evaluating answers. Return ONLY valid JSON. No markdown, no code fences.";

/// Prompt for the opening question of a fresh session.
pub(crate) fn first_question(profile: &CandidateProfile) -> String {
    format!(
        "Based on this candidate profile, generate the first question of a \
         technical interview. Choose a conceptual or a coding question \
         appropriate to the candidate's experience level; include a hint for \
         coding questions.\n\n\
         Return JSON in this exact format:\n\
         {{\"type\": \"conceptual\" | \"coding\", \"question\": \"...\", \"hint\": \"...\"}}\n\n\
         Candidate profile:\n{}",
        profile_block(profile)
    )
}

/// Prompt for a follow-up question given the session so far.
pub(crate) fn next_question(context: &SessionContext) -> String {
    format!(
        "You are partway through a technical interview. Generate the next \
         question. Mix conceptual and coding questions, avoid repeating \
         topics already covered, and include a hint for coding questions.\n\n\
         Return JSON in this exact format:\n\
         {{\"type\": \"conceptual\" | \"coding\", \"question\": \"...\", \"hint\": \"...\"}}\n\n\
         Candidate profile:\n{}\n\nInterview so far:\n{}",
        profile_block(&context.profile),
        history_block(context)
    )
}

/// Prompt scoring one answer along the three axes.
pub(crate) fn evaluation(question: &Question, answer_text: &str) -> String {
    format!(
        "Evaluate this technical interview answer against what an ideal \
         answer would contain.\n\n\
         Question ({kind}):\n{question}\n\n\
         Candidate answer:\n{answer}\n\n\
         Provide scores from 0 to 100 for correctness (accuracy), depth \
         (thoroughness), and clarity (how well it is explained), plus \
         constructive feedback.\n\n\
         Return JSON in this exact format:\n\
         {{\"correctness\": 85, \"depth\": 75, \"clarity\": 90, \"feedback\": \"...\"}}",
        kind = question.kind().as_str(),
        question = question.text(),
        answer = answer_text,
    )
}

/// Prompt summarizing a finished session.
pub(crate) fn final_report(context: &SessionContext) -> String {
    format!(
        "The technical interview below is finished. Summarize the \
         candidate's performance: an overall score from 0 to 100, their \
         strengths, and their weak areas.\n\n\
         Return JSON in this exact format:\n\
         {{\"average_score\": 72, \"strengths\": [\"...\"], \"weak_areas\": [\"...\"]}}\n\n\
         Candidate profile:\n{}\n\nInterview transcript:\n{}",
        profile_block(&context.profile),
        history_block(context)
    )
}

fn profile_block(profile: &CandidateProfile) -> String {
    let mut block = format!("- Name: {}\n- Skills: {}", profile.name, profile.skills.join(", "));
    if let Some(years) = profile.experience_years {
        let _ = write!(block, "\n- Experience: {years} years");
    }
    for project in &profile.projects {
        let _ = write!(
            block,
            "\n- Project: {} ({}): {}",
            project.name, project.tech, project.description
        );
    }
    block
}

fn history_block(context: &SessionContext) -> String {
    let mut block = String::new();
    for (index, exchange) in context.history.iter().enumerate() {
        let _ = write!(
            block,
            "Q{n} ({kind}): {question}\nA{n}: {answer}\nScores: correctness {c}, depth {d}, clarity {cl}\n",
            n = index + 1,
            kind = exchange.kind.as_str(),
            question = exchange.question,
            answer = exchange.answer,
            c = exchange.scores.correctness(),
            d = exchange.scores.depth(),
            cl = exchange.scores.clarity(),
        );
    }
    block
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::model::{AxisScores, QuestionKind};
    use crate::oracle::Exchange;

    #[test]
    fn strips_fences_with_json_tag() {
        let input = "```json\n{\"question\": \"Q\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"question\": \"Q\"}");
    }

    #[test]
    fn strips_bare_fences() {
        let input = "```\n{\"question\": \"Q\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"question\": \"Q\"}");
    }

    #[test]
    fn leaves_plain_json_untouched() {
        let input = "{\"question\": \"Q\"}";
        assert_eq!(strip_json_fences(input), input);
    }

    #[test]
    fn first_question_prompt_mentions_profile() {
        let profile = CandidateProfile {
            name: "Ada".to_string(),
            skills: vec!["Rust".to_string(), "Postgres".to_string()],
            experience_years: Some(5),
            projects: Vec::new(),
        };
        let prompt = first_question(&profile);
        assert!(prompt.contains("Ada"));
        assert!(prompt.contains("Rust, Postgres"));
        assert!(prompt.contains("5 years"));
    }

    #[test]
    fn next_question_prompt_includes_history() {
        let context = SessionContext {
            profile: CandidateProfile::default(),
            history: vec![Exchange {
                question: "What is a mutex?".to_string(),
                kind: QuestionKind::Conceptual,
                answer: "A lock.".to_string(),
                scores: AxisScores::new(60, 40, 70).unwrap(),
            }],
        };
        let prompt = next_question(&context);
        assert!(prompt.contains("What is a mutex?"));
        assert!(prompt.contains("correctness 60, depth 40, clarity 70"));
    }
}

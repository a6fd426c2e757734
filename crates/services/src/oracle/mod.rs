//! The scoring oracle: the external AI capability that generates questions,
//! scores answers, and summarizes sessions. The engine treats it as a black
//! box behind [`ScoringOracle`]; the HTTP implementation lives in [`groq`].

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use interview_core::model::{
    Answer, AxisScores, CandidateProfile, Question, QuestionId, QuestionKind,
};

mod groq;
pub mod prompts;

pub use groq::{GroqOracle, OracleConfig};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors emitted by scoring-oracle implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OracleError {
    #[error("scoring oracle is not configured")]
    Disabled,

    #[error("oracle request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("oracle returned an empty response")]
    EmptyResponse,

    #[error("oracle returned invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("oracle payload rejected: {0}")]
    Malformed(String),
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// A generated question before it is given an identity and appended to a
/// session's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub kind: QuestionKind,
    pub hint: Option<String>,
}

/// Per-axis scores plus free-text feedback for one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub scores: AxisScores,
    pub feedback: String,
}

/// Oracle-authored session summary, used preferentially over the local
/// aggregation when the oracle can produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDraft {
    pub average_score: u8,
    pub strengths: Vec<String>,
    pub weak_areas: Vec<String>,
}

//
// ─── SESSION CONTEXT ───────────────────────────────────────────────────────────
//

/// One completed question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub question: String,
    pub kind: QuestionKind,
    pub answer: String,
    pub scores: AxisScores,
}

/// Everything the oracle needs to continue or summarize a session: the
/// candidate profile and the prior exchanges in question order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub profile: CandidateProfile,
    pub history: Vec<Exchange>,
}

impl SessionContext {
    /// Pair questions with their recorded answers by question identity.
    /// Unanswered questions are omitted.
    #[must_use]
    pub fn from_records(
        profile: CandidateProfile,
        questions: &[Question],
        answers: &[Answer],
    ) -> Self {
        let by_question: HashMap<QuestionId, &Answer> =
            answers.iter().map(|a| (a.question_id(), a)).collect();

        let history = questions
            .iter()
            .filter_map(|q| {
                by_question.get(&q.id()).map(|a| Exchange {
                    question: q.text().to_owned(),
                    kind: q.kind(),
                    answer: a.text().to_owned(),
                    scores: a.scores(),
                })
            })
            .collect();

        Self { profile, history }
    }
}

//
// ─── CONTRACT ──────────────────────────────────────────────────────────────────
//

/// External question-generation and scoring capability.
///
/// Implementations are fallible and network-bound; callers decide what a
/// failure means (the state machine records nothing on scoring failures).
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Generate the opening question for a fresh session.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` when generation fails.
    async fn first_question(
        &self,
        profile: &CandidateProfile,
    ) -> Result<QuestionDraft, OracleError>;

    /// Score one answer against its question.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` when the request fails, times out, or the
    /// payload cannot be validated.
    async fn score_answer(
        &self,
        question: &Question,
        answer_text: &str,
    ) -> Result<Evaluation, OracleError>;

    /// Generate the next question given the session so far.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` when generation fails.
    async fn next_question(
        &self,
        context: &SessionContext,
    ) -> Result<QuestionDraft, OracleError>;

    /// Summarize a finished session. Callers fall back to local
    /// aggregation when this fails.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` when summarization fails.
    async fn final_report(&self, context: &SessionContext) -> Result<ReportDraft, OracleError>;
}

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{QuestionId, SessionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while constructing questions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("invalid question kind: {0}")]
    InvalidKind(String),
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// The two categories of prompt an interview can pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Theory or design question answered in prose.
    Conceptual,
    /// Question answered with a code snippet.
    Coding,
}

impl QuestionKind {
    /// Storage/wire representation of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Conceptual => "conceptual",
            QuestionKind::Coding => "coding",
        }
    }

    /// Parses the storage/wire representation back into a kind.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidKind` for unknown values.
    pub fn parse(value: &str) -> Result<Self, QuestionError> {
        match value {
            "conceptual" => Ok(Self::Conceptual),
            "coding" => Ok(Self::Coding),
            other => Err(QuestionError::InvalidKind(other.to_string())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One prompt within a session. Immutable once created.
///
/// A question's position in the interview is not stored on the question
/// itself; it is derived from creation order via [`QuestionLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: QuestionId,
    session_id: SessionId,
    text: String,
    kind: QuestionKind,
    hint: Option<String>,
    created_at: DateTime<Utc>,
}

impl Question {
    /// Create a question, validating that the text is non-empty.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the text is blank.
    pub fn new(
        id: QuestionId,
        session_id: SessionId,
        text: impl Into<String>,
        kind: QuestionKind,
        hint: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        Ok(Self {
            id,
            session_id,
            text,
            kind,
            hint,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── QUESTION LOG ──────────────────────────────────────────────────────────────
//

/// Time-ordered view over one session's questions.
///
/// Sequence indices are positions in this log: for N questions they are
/// exactly 0..N-1, assigned by creation order. Lookups go through question
/// identity, never through text, so repeated question text cannot be
/// confused.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestionLog {
    questions: Vec<Question>,
}

impl QuestionLog {
    /// Wrap a list of questions already ordered by creation time.
    #[must_use]
    pub fn from_ordered(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The most recently created question, if any.
    #[must_use]
    pub fn tail(&self) -> Option<&Question> {
        self.questions.last()
    }

    /// Derived 0-based sequence index of the given question.
    #[must_use]
    pub fn index_of(&self, id: QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| q.id() == id)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

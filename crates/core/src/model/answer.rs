use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{AnswerId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while validating scores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("{axis} score {value} is out of range (0-100)")]
    OutOfRange { axis: &'static str, value: u8 },
}

//
// ─── AXIS SCORES ───────────────────────────────────────────────────────────────
//

/// Per-axis evaluation of a single answer, each axis in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisScores {
    correctness: u8,
    depth: u8,
    clarity: u8,
}

impl AxisScores {
    pub const MAX: u8 = 100;

    /// Build validated scores.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` if any axis exceeds 100.
    pub fn new(correctness: u8, depth: u8, clarity: u8) -> Result<Self, ScoreError> {
        for (axis, value) in [
            ("correctness", correctness),
            ("depth", depth),
            ("clarity", clarity),
        ] {
            if value > Self::MAX {
                return Err(ScoreError::OutOfRange { axis, value });
            }
        }
        Ok(Self {
            correctness,
            depth,
            clarity,
        })
    }

    #[must_use]
    pub fn correctness(&self) -> u8 {
        self.correctness
    }

    #[must_use]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    #[must_use]
    pub fn clarity(&self) -> u8 {
        self.clarity
    }

    /// Unweighted mean of the three axes.
    #[must_use]
    pub fn overall(&self) -> f64 {
        f64::from(u16::from(self.correctness) + u16::from(self.depth) + u16::from(self.clarity))
            / 3.0
    }
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// One response to one question. Immutable once created.
///
/// A question has at most one answer; the first recorded answer wins and
/// later submissions are rejected by storage and the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    id: AnswerId,
    question_id: QuestionId,
    text: String,
    scores: AxisScores,
    feedback: String,
    created_at: DateTime<Utc>,
}

impl Answer {
    #[must_use]
    pub fn new(
        id: AnswerId,
        question_id: QuestionId,
        text: impl Into<String>,
        scores: AxisScores,
        feedback: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            question_id,
            text: text.into(),
            scores,
            feedback: feedback.into(),
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> AnswerId {
        self.id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn scores(&self) -> AxisScores {
        self.scores
    }

    #[must_use]
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

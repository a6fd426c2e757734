use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::answer::{Answer, ScoreError};
use crate::model::ids::{SessionId, UserId};
use crate::model::profile::CandidateProfile;

/// Number of questions in a standard practice interview.
pub const DEFAULT_SESSION_LENGTH: u32 = 5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("session is already completed")]
    AlreadyCompleted,

    #[error("completed session is missing its report")]
    MissingReport,

    #[error("in-progress session cannot carry a report")]
    UnexpectedReport,

    #[error("invalid session status: {0}")]
    InvalidStatus(String),

    #[error("session length must be at least 1")]
    ZeroLength,
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a session. The transition is monotonic: once completed a
/// session never goes back to in-progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    /// Storage/wire representation of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }

    /// Parses the storage/wire representation back into a status.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::InvalidStatus` for unknown values.
    pub fn parse(value: &str) -> Result<Self, SessionStateError> {
        match value {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(SessionStateError::InvalidStatus(other.to_string())),
        }
    }
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// Session-level aggregate produced exactly once at completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    average_score: u8,
    strengths: Vec<String>,
    weak_areas: Vec<String>,
    completed_at: DateTime<Utc>,
}

impl Report {
    /// Build a report from already-aggregated values.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` if the average exceeds 100.
    pub fn new(
        average_score: u8,
        strengths: Vec<String>,
        weak_areas: Vec<String>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ScoreError> {
        if average_score > 100 {
            return Err(ScoreError::OutOfRange {
                axis: "average_score",
                value: average_score,
            });
        }
        Ok(Self {
            average_score,
            strengths,
            weak_areas,
            completed_at,
        })
    }

    /// Aggregate a report locally from recorded answers.
    ///
    /// Computes the mean of each axis over all answers, then the unweighted
    /// mean of the three axis means, rounded to the nearest integer. A
    /// session with zero answers aggregates to an average of 0 with empty
    /// strength/weak-area lists. Deterministic: the same answers always
    /// produce the same report.
    #[must_use]
    pub fn from_answers(answers: &[Answer], completed_at: DateTime<Utc>) -> Self {
        if answers.is_empty() {
            return Self {
                average_score: 0,
                strengths: Vec::new(),
                weak_areas: Vec::new(),
                completed_at,
            };
        }

        let mut correctness = 0_u32;
        let mut depth = 0_u32;
        let mut clarity = 0_u32;
        for answer in answers {
            let scores = answer.scores();
            correctness += u32::from(scores.correctness());
            depth += u32::from(scores.depth());
            clarity += u32::from(scores.clarity());
        }

        let count = answers.len() as f64;
        let correctness_mean = f64::from(correctness) / count;
        let depth_mean = f64::from(depth) / count;
        let clarity_mean = f64::from(clarity) / count;
        let overall = (correctness_mean + depth_mean + clarity_mean) / 3.0;

        let mut strengths = Vec::new();
        let mut weak_areas = Vec::new();
        for (label, mean) in [
            ("Technical accuracy", correctness_mean),
            ("Depth of detail", depth_mean),
            ("Clear communication", clarity_mean),
        ] {
            if mean >= overall {
                strengths.push(label.to_string());
            } else {
                weak_areas.push(label.to_string());
            }
        }

        Self {
            // Axis values are capped at 100, so the rounded mean fits in u8.
            average_score: overall.round() as u8,
            strengths,
            weak_areas,
            completed_at,
        }
    }

    #[must_use]
    pub fn average_score(&self) -> u8 {
        self.average_score
    }

    #[must_use]
    pub fn strengths(&self) -> &[String] {
        &self.strengths
    }

    #[must_use]
    pub fn weak_areas(&self) -> &[String] {
        &self.weak_areas
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One practice-interview attempt by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    owner: UserId,
    profile: CandidateProfile,
    status: SessionStatus,
    fixed_length: u32,
    report: Option<Report>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh in-progress session.
    ///
    /// The target length is fixed here for the session's whole lifetime.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::ZeroLength` for a zero-question target.
    pub fn new(
        id: SessionId,
        owner: UserId,
        profile: CandidateProfile,
        fixed_length: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SessionStateError> {
        if fixed_length == 0 {
            return Err(SessionStateError::ZeroLength);
        }
        Ok(Self {
            id,
            owner,
            profile,
            status: SessionStatus::InProgress,
            fixed_length,
            report: None,
            created_at,
        })
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` if the report presence does not match
    /// the status, or the length is zero.
    pub fn from_persisted(
        id: SessionId,
        owner: UserId,
        profile: CandidateProfile,
        status: SessionStatus,
        fixed_length: u32,
        report: Option<Report>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SessionStateError> {
        if fixed_length == 0 {
            return Err(SessionStateError::ZeroLength);
        }
        match (status, &report) {
            (SessionStatus::Completed, None) => return Err(SessionStateError::MissingReport),
            (SessionStatus::InProgress, Some(_)) => {
                return Err(SessionStateError::UnexpectedReport);
            }
            _ => {}
        }
        Ok(Self {
            id,
            owner,
            profile,
            status,
            fixed_length,
            report,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn owner(&self) -> UserId {
        self.owner
    }

    #[must_use]
    pub fn profile(&self) -> &CandidateProfile {
        &self.profile
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn fixed_length(&self) -> u32 {
        self.fixed_length
    }

    #[must_use]
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Transition the session to completed with its final report.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::AlreadyCompleted` if the session has
    /// already been completed; the existing report is left untouched.
    pub fn complete(&mut self, report: Report) -> Result<(), SessionStateError> {
        if self.is_completed() {
            return Err(SessionStateError::AlreadyCompleted);
        }
        self.status = SessionStatus::Completed;
        self.report = Some(report);
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

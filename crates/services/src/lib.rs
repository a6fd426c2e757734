#![forbid(unsafe_code)]

pub mod error;
pub mod interview;
pub mod oracle;

pub use interview_core::Clock;

pub use error::InterviewError;
pub use interview::{InterviewService, ResumeState, StartedSession, SubmitOutcome};
pub use oracle::{
    Evaluation, GroqOracle, OracleConfig, OracleError, QuestionDraft, ReportDraft, ScoringOracle,
    SessionContext,
};

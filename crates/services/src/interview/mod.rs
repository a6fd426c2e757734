mod locks;
mod report;
mod service;

// Public API of the interview subsystem.
pub use crate::error::InterviewError;
pub use service::{InterviewService, ResumeState, StartedSession, SubmitOutcome};

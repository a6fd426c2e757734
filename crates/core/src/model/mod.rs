mod answer;
mod ids;
mod profile;
mod question;
mod session;

pub use ids::{AnswerId, ParseIdError, QuestionId, SessionId, UserId};

pub use answer::{Answer, AxisScores, ScoreError};
pub use profile::{CandidateProfile, ProjectHighlight};
pub use question::{Question, QuestionError, QuestionKind, QuestionLog};
pub use session::{
    DEFAULT_SESSION_LENGTH, Report, Session, SessionStateError, SessionStatus,
};

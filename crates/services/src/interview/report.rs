use chrono::{DateTime, Utc};
use tracing::warn;

use interview_core::model::{Answer, Question, Report, Session};

use crate::oracle::{ScoringOracle, SessionContext};

/// Build the final report for a session with every question answered.
///
/// Prefers the oracle-authored summary; any oracle failure (or an invalid
/// payload) falls back to local aggregation over the recorded scores, so
/// completion always succeeds once the last answer is in.
pub(crate) async fn build_final_report(
    oracle: &dyn ScoringOracle,
    session: &Session,
    questions: &[Question],
    answers: &[Answer],
    completed_at: DateTime<Utc>,
) -> Report {
    let context = SessionContext::from_records(session.profile().clone(), questions, answers);

    match oracle.final_report(&context).await {
        Ok(draft) => {
            match Report::new(draft.average_score, draft.strengths, draft.weak_areas, completed_at)
            {
                Ok(report) => return report,
                Err(e) => warn!(
                    session = %session.id(),
                    error = %e,
                    "oracle report rejected, aggregating locally"
                ),
            }
        }
        Err(e) => warn!(
            session = %session.id(),
            error = %e,
            "oracle report generation failed, aggregating locally"
        ),
    }

    Report::from_answers(answers, completed_at)
}

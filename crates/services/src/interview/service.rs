use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use interview_core::Clock;
use interview_core::model::{
    Answer, AnswerId, CandidateProfile, DEFAULT_SESSION_LENGTH, Question, QuestionId, QuestionLog,
    Report, Session, SessionId, UserId,
};
use storage::repository::{
    AnswerRepository, QuestionRepository, SessionRepository, StorageError,
};

use super::locks::SessionLocks;
use super::report::build_final_report;
use crate::error::InterviewError;
use crate::oracle::{Evaluation, QuestionDraft, ScoringOracle, SessionContext};

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// A freshly created session together with its opening question.
#[derive(Debug, Clone, PartialEq)]
pub struct StartedSession {
    pub session: Session,
    pub question: Question,
}

/// Outcome of a successful answer submission: either the interview moves to
/// the next question or it is finished and carries the final report. The
/// score for the just-submitted answer is returned either way, in one
/// atomic response.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Next {
        question: Question,
        last_score: Evaluation,
    },
    Completed {
        report: Report,
        last_score: Evaluation,
    },
}

/// Where an interrupted session stands after recovery.
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeState {
    Question(Question),
    Completed(Report),
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// The session state machine.
///
/// Owns the authoritative notion of "current question" (the tail of the
/// question log, keyed by identity), accepts each answer exactly once,
/// invokes the scoring oracle, and decides completion. Submissions for one
/// session are serialized by a per-session lock; reads take no lock.
pub struct InterviewService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
    oracle: Arc<dyn ScoringOracle>,
    locks: SessionLocks,
    session_length: u32,
}

impl InterviewService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionRepository>,
        questions: Arc<dyn QuestionRepository>,
        answers: Arc<dyn AnswerRepository>,
        oracle: Arc<dyn ScoringOracle>,
    ) -> Self {
        Self {
            clock,
            sessions,
            questions,
            answers,
            oracle,
            locks: SessionLocks::new(),
            session_length: DEFAULT_SESSION_LENGTH,
        }
    }

    /// Override the per-session question target (fixed at creation time for
    /// each session this service starts).
    #[must_use]
    pub fn with_session_length(mut self, session_length: u32) -> Self {
        self.session_length = session_length;
        self
    }

    /// Start a new session for the given owner and candidate profile.
    ///
    /// The oracle is consulted before anything is written, and the session
    /// row and question #0 are created atomically, so a generation failure
    /// leaves no partial session behind.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::OracleUnavailable` if question generation
    /// fails, or storage errors.
    pub async fn start_session(
        &self,
        owner: UserId,
        profile: CandidateProfile,
    ) -> Result<StartedSession, InterviewError> {
        let draft = self
            .oracle
            .first_question(&profile)
            .await
            .map_err(InterviewError::OracleUnavailable)?;

        let now = self.clock.now();
        let session = Session::new(
            SessionId::generate(),
            owner,
            profile,
            self.session_length,
            now,
        )?;
        let question = question_from_draft(session.id(), draft, now)?;

        self.sessions.create_session(&session, &question).await?;
        info!(session = %session.id(), "interview session started");

        Ok(StartedSession { session, question })
    }

    /// The current question: the most recently created question of a live
    /// session that has no answer yet.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for unknown ids, `SessionCompleted` once the
    /// session is finished, `Invariant` if the log is empty (a live session
    /// always has at least one question), and `NoCurrentQuestion` when the
    /// tail is already answered: the state a session is left in when a
    /// submission was interrupted after scoring; `resume_session` clears it.
    pub async fn get_current_question(
        &self,
        session_id: SessionId,
    ) -> Result<Question, InterviewError> {
        let _session = self.fetch_live_session(session_id).await?;
        let log = self.question_log(session_id).await?;
        let tail = log
            .tail()
            .ok_or_else(|| self.invariant(session_id, "question log is empty for a live session"))?;

        match self.answers.get_answer(tail.id()).await? {
            None => Ok(tail.clone()),
            Some(_) => Err(InterviewError::NoCurrentQuestion),
        }
    }

    /// Submit an answer for the current question.
    ///
    /// The per-session lock spans the whole call, so concurrent submissions
    /// for one session resolve deterministically: the loser sees
    /// `StaleQuestion` or `AlreadyAnswered` instead of silently clobbering
    /// data. Side effects are strictly ordered (the answer is recorded
    /// before the next question is requested), so an interruption between
    /// the two leaves the scored answer durable and the session
    /// recoverable.
    ///
    /// # Errors
    ///
    /// Precondition failures (`SessionNotFound`, `SessionCompleted`,
    /// `StaleQuestion`, `AlreadyAnswered`) write nothing. `ScoringFailed`
    /// (including timeouts) also writes nothing. `OracleUnavailable` after
    /// the answer was recorded leaves the session in the recoverable state
    /// handled by [`InterviewService::resume_session`].
    pub async fn submit_answer(
        &self,
        session_id: SessionId,
        question_id: QuestionId,
        answer_text: &str,
    ) -> Result<SubmitOutcome, InterviewError> {
        let _guard = self.locks.acquire(session_id).await;

        let mut session = self.fetch_live_session(session_id).await?;
        let log = self.question_log(session_id).await?;
        let tail = log
            .tail()
            .ok_or_else(|| self.invariant(session_id, "question log is empty for a live session"))?;

        if question_id != tail.id() {
            return Err(InterviewError::StaleQuestion {
                submitted: question_id,
                current: tail.id(),
            });
        }
        if self.answers.get_answer(tail.id()).await?.is_some() {
            return Err(InterviewError::AlreadyAnswered(tail.id()));
        }

        // Score first: an oracle failure must leave no trace.
        let evaluation = self
            .oracle
            .score_answer(tail, answer_text)
            .await
            .map_err(InterviewError::ScoringFailed)?;

        // Linearization point: once this write lands the question counts as
        // answered.
        let answer = Answer::new(
            AnswerId::generate(),
            tail.id(),
            answer_text,
            evaluation.scores,
            evaluation.feedback.clone(),
            self.clock.now(),
        );
        match self.answers.append_answer(&answer).await {
            Ok(()) => {}
            Err(StorageError::Conflict) => {
                return Err(InterviewError::AlreadyAnswered(tail.id()));
            }
            Err(e) => return Err(e.into()),
        }

        // Every earlier question already had an answer (tail was the only
        // pending one), so the answered count now equals the log length.
        let answered = log.len() as u32;
        if answered >= session.fixed_length() {
            let report = self.finalize(&mut session, &log).await?;
            Ok(SubmitOutcome::Completed {
                report,
                last_score: evaluation,
            })
        } else {
            let question = self.advance(&session, &log).await?;
            Ok(SubmitOutcome::Next {
                question,
                last_score: evaluation,
            })
        }
    }

    /// Bring an interrupted session back to a serviceable state.
    ///
    /// Idempotent: a completed session returns its persisted report; a
    /// session with a pending question returns that question; a session
    /// whose tail was answered but that never advanced gets the missing
    /// next question (or its report) derived now.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown ids, oracle errors when the
    /// next question must be re-requested, or storage errors.
    pub async fn resume_session(
        &self,
        session_id: SessionId,
    ) -> Result<ResumeState, InterviewError> {
        let _guard = self.locks.acquire(session_id).await;

        let mut session = match self.sessions.get_session(session_id).await {
            Ok(session) => session,
            Err(StorageError::NotFound) => return Err(InterviewError::SessionNotFound),
            Err(e) => return Err(e.into()),
        };

        if session.is_completed() {
            let report = session
                .report()
                .cloned()
                .ok_or_else(|| self.invariant(session_id, "completed session has no report"))?;
            return Ok(ResumeState::Completed(report));
        }

        let log = self.question_log(session_id).await?;
        let tail = log
            .tail()
            .ok_or_else(|| self.invariant(session_id, "question log is empty for a live session"))?;

        if self.answers.get_answer(tail.id()).await?.is_none() {
            return Ok(ResumeState::Question(tail.clone()));
        }

        // Interrupted between recording the answer and advancing.
        if log.len() as u32 >= session.fixed_length() {
            let report = self.finalize(&mut session, &log).await?;
            Ok(ResumeState::Completed(report))
        } else {
            let question = self.advance(&session, &log).await?;
            Ok(ResumeState::Question(question))
        }
    }

    /// The persisted report of a completed session.
    ///
    /// Idempotent: the report is computed exactly once at completion and
    /// read thereafter; the oracle is never re-queried.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown ids and `SessionInProgress`
    /// before completion.
    pub async fn report(&self, session_id: SessionId) -> Result<Report, InterviewError> {
        let session = match self.sessions.get_session(session_id).await {
            Ok(session) => session,
            Err(StorageError::NotFound) => return Err(InterviewError::SessionNotFound),
            Err(e) => return Err(e.into()),
        };

        if !session.is_completed() {
            return Err(InterviewError::SessionInProgress);
        }
        session
            .report()
            .cloned()
            .ok_or_else(|| self.invariant(session_id, "completed session has no report"))
    }

    //
    // ─── INTERNAL ──────────────────────────────────────────────────────────────
    //

    /// Build and persist the final report, transitioning the session to
    /// completed. Must be called with the session lock held.
    async fn finalize(
        &self,
        session: &mut Session,
        log: &QuestionLog,
    ) -> Result<Report, InterviewError> {
        let answers = self.answers.list_answers(session.id()).await?;
        let completed_at = self.clock.now();
        let report = build_final_report(
            self.oracle.as_ref(),
            session,
            log.questions(),
            &answers,
            completed_at,
        )
        .await;

        session.complete(report.clone())?;
        match self.sessions.complete_session(session.id(), &report).await {
            Ok(()) => {}
            // Someone completed it already (e.g. an earlier interrupted
            // finalize): the persisted report wins.
            Err(StorageError::Conflict) => {
                let persisted = match self.sessions.get_session(session.id()).await {
                    Ok(session) => session,
                    Err(StorageError::NotFound) => return Err(InterviewError::SessionNotFound),
                    Err(e) => return Err(e.into()),
                };
                return persisted.report().cloned().ok_or_else(|| {
                    self.invariant(session.id(), "completed session has no report")
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            session = %session.id(),
            average_score = report.average_score(),
            "interview session completed"
        );
        Ok(report)
    }

    /// Request the next question from the oracle and append it to the log.
    /// Must be called with the session lock held.
    async fn advance(
        &self,
        session: &Session,
        log: &QuestionLog,
    ) -> Result<Question, InterviewError> {
        let answers = self.answers.list_answers(session.id()).await?;
        let context =
            SessionContext::from_records(session.profile().clone(), log.questions(), &answers);
        let draft = self
            .oracle
            .next_question(&context)
            .await
            .map_err(InterviewError::OracleUnavailable)?;

        let question = question_from_draft(session.id(), draft, self.clock.now())?;
        self.questions.append_question(&question).await?;
        Ok(question)
    }

    async fn fetch_live_session(&self, id: SessionId) -> Result<Session, InterviewError> {
        let session = match self.sessions.get_session(id).await {
            Ok(session) => session,
            Err(StorageError::NotFound) => return Err(InterviewError::SessionNotFound),
            Err(e) => return Err(e.into()),
        };
        if session.is_completed() {
            return Err(InterviewError::SessionCompleted);
        }
        Ok(session)
    }

    async fn question_log(&self, id: SessionId) -> Result<QuestionLog, InterviewError> {
        Ok(QuestionLog::from_ordered(
            self.questions.list_questions(id).await?,
        ))
    }

    fn invariant(&self, session: SessionId, message: &str) -> InterviewError {
        error!(session = %session, "{message}");
        InterviewError::Invariant(message.to_string())
    }
}

/// Assign an identity and a creation time to an oracle draft.
fn question_from_draft(
    session_id: SessionId,
    draft: QuestionDraft,
    created_at: DateTime<Utc>,
) -> Result<Question, InterviewError> {
    Question::new(
        QuestionId::generate(),
        session_id,
        draft.text,
        draft.kind,
        draft.hint,
        created_at,
    )
    .map_err(|e| InterviewError::OracleUnavailable(crate::oracle::OracleError::Malformed(
        e.to_string(),
    )))
}

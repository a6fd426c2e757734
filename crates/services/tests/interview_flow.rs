use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use interview_core::model::{
    AxisScores, CandidateProfile, Question, QuestionId, QuestionKind, SessionStatus, UserId,
};
use interview_core::time::fixed_clock;
use services::oracle::{
    Evaluation, OracleError, QuestionDraft, ReportDraft, ScoringOracle, SessionContext,
};
use services::{InterviewError, InterviewService, ResumeState, SubmitOutcome};
use storage::repository::{
    AnswerRepository, InMemoryRepository, QuestionRepository, SessionRepository,
};

//
// ─── SCRIPTED ORACLE ───────────────────────────────────────────────────────────
//

/// Oracle double that serves questions and evaluations from queues and can
/// be told to fail individual capabilities.
#[derive(Default)]
struct ScriptedOracle {
    questions: Mutex<VecDeque<QuestionDraft>>,
    evaluations: Mutex<VecDeque<Evaluation>>,
    report: Mutex<Option<ReportDraft>>,
    fail_scoring: AtomicBool,
    fail_next_question: AtomicBool,
}

impl ScriptedOracle {
    fn with_questions(texts: &[&str]) -> Self {
        let oracle = Self::default();
        oracle.push_questions(texts);
        oracle
    }

    fn push_questions(&self, texts: &[&str]) {
        let mut queue = self.questions.lock().unwrap();
        for text in texts {
            queue.push_back(QuestionDraft {
                text: (*text).to_string(),
                kind: QuestionKind::Conceptual,
                hint: None,
            });
        }
    }

    fn push_evaluation(&self, correctness: u8, depth: u8, clarity: u8) {
        self.evaluations.lock().unwrap().push_back(Evaluation {
            scores: AxisScores::new(correctness, depth, clarity).unwrap(),
            feedback: "scripted feedback".to_string(),
        });
    }

    fn set_report(&self, draft: Option<ReportDraft>) {
        *self.report.lock().unwrap() = draft;
    }

    fn pop_question(&self) -> Result<QuestionDraft, OracleError> {
        self.questions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(OracleError::EmptyResponse)
    }

    fn default_evaluation() -> Evaluation {
        Evaluation {
            scores: AxisScores::new(70, 70, 70).unwrap(),
            feedback: "scripted feedback".to_string(),
        }
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    async fn first_question(
        &self,
        _profile: &CandidateProfile,
    ) -> Result<QuestionDraft, OracleError> {
        self.pop_question()
    }

    async fn score_answer(
        &self,
        _question: &Question,
        _answer_text: &str,
    ) -> Result<Evaluation, OracleError> {
        if self.fail_scoring.load(Ordering::SeqCst) {
            return Err(OracleError::EmptyResponse);
        }
        Ok(self
            .evaluations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Self::default_evaluation))
    }

    async fn next_question(
        &self,
        _context: &SessionContext,
    ) -> Result<QuestionDraft, OracleError> {
        if self.fail_next_question.load(Ordering::SeqCst) {
            return Err(OracleError::EmptyResponse);
        }
        self.pop_question()
    }

    async fn final_report(&self, _context: &SessionContext) -> Result<ReportDraft, OracleError> {
        self.report
            .lock()
            .unwrap()
            .clone()
            .ok_or(OracleError::EmptyResponse)
    }
}

fn build_service(oracle: Arc<ScriptedOracle>) -> (InterviewService, InMemoryRepository) {
    let repo = InMemoryRepository::new();
    let service = InterviewService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        oracle,
    );
    (service, repo)
}

fn profile() -> CandidateProfile {
    CandidateProfile {
        name: "Test Candidate".to_string(),
        skills: vec!["Rust".to_string()],
        experience_years: Some(2),
        projects: Vec::new(),
    }
}

//
// ─── SCENARIOS ─────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn starting_a_session_creates_exactly_one_question() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&["Q0"]));
    let (service, repo) = build_service(oracle);

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();

    assert_eq!(started.session.status(), SessionStatus::InProgress);
    assert_eq!(started.question.text(), "Q0");

    let log = repo.list_questions(started.session.id()).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].id(), started.question.id());

    let current = service
        .get_current_question(started.session.id())
        .await
        .unwrap();
    assert_eq!(current.id(), started.question.id());
}

#[tokio::test]
async fn start_failure_leaves_nothing_behind() {
    // Empty script: first-question generation fails.
    let oracle = Arc::new(ScriptedOracle::default());
    let (service, _repo) = build_service(oracle);

    let err = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap_err();
    assert!(matches!(err, InterviewError::OracleUnavailable(_)));
}

#[tokio::test]
async fn submitting_an_answer_appends_the_next_question() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&["Q0", "Q1"]));
    oracle.push_evaluation(85, 75, 90);
    let (service, repo) = build_service(oracle);

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();
    let session_id = started.session.id();

    let outcome = service
        .submit_answer(session_id, started.question.id(), "my answer")
        .await
        .unwrap();

    let SubmitOutcome::Next {
        question,
        last_score,
    } = outcome
    else {
        panic!("expected Next outcome");
    };
    assert_eq!(question.text(), "Q1");
    assert_eq!(last_score.scores.correctness(), 85);

    let log = repo.list_questions(session_id).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].id(), question.id());

    let answer = repo.get_answer(started.question.id()).await.unwrap();
    assert!(answer.is_some());
    assert_eq!(answer.unwrap().text(), "my answer");

    let current = service.get_current_question(session_id).await.unwrap();
    assert_eq!(current.id(), question.id());
}

#[tokio::test]
async fn fifth_answer_completes_the_session() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&[
        "Q0", "Q1", "Q2", "Q3", "Q4",
    ]));
    oracle.set_report(Some(ReportDraft {
        average_score: 81,
        strengths: vec!["System design".to_string()],
        weak_areas: vec!["Testing".to_string()],
    }));
    let (service, repo) = build_service(oracle);

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();
    let session_id = started.session.id();

    let mut current = started.question;
    let mut completions = 0;
    for _ in 0..5 {
        match service
            .submit_answer(session_id, current.id(), "answer")
            .await
            .unwrap()
        {
            SubmitOutcome::Next { question, .. } => current = question,
            SubmitOutcome::Completed { report, .. } => {
                completions += 1;
                assert_eq!(report.average_score(), 81);
                assert_eq!(report.strengths(), ["System design".to_string()]);
            }
        }
    }
    assert_eq!(completions, 1);

    let session = repo.get_session(session_id).await.unwrap();
    assert!(session.is_completed());

    // Submissions against a completed session are rejected.
    let err = service
        .submit_answer(session_id, current.id(), "late answer")
        .await
        .unwrap_err();
    assert!(matches!(err, InterviewError::SessionCompleted));

    let err = service.get_current_question(session_id).await.unwrap_err();
    assert!(matches!(err, InterviewError::SessionCompleted));

    // Report reads are idempotent.
    let first = service.report(session_id).await.unwrap();
    let second = service.report(session_id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn stale_question_submission_is_rejected_without_writes() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&["Q0"]));
    let (service, repo) = build_service(oracle);

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();
    let session_id = started.session.id();

    let stale = QuestionId::generate();
    let err = service
        .submit_answer(session_id, stale, "answer")
        .await
        .unwrap_err();
    match err {
        InterviewError::StaleQuestion { submitted, current } => {
            assert_eq!(submitted, stale);
            assert_eq!(current, started.question.id());
        }
        other => panic!("expected StaleQuestion, got {other:?}"),
    }

    assert!(repo.get_answer(started.question.id()).await.unwrap().is_none());
    let listed = repo.list_answers(session_id).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn scoring_failure_leaves_the_session_untouched() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&["Q0", "Q1"]));
    let (service, repo) = build_service(oracle.clone());

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();
    let session_id = started.session.id();

    oracle.fail_scoring.store(true, Ordering::SeqCst);
    let err = service
        .submit_answer(session_id, started.question.id(), "answer")
        .await
        .unwrap_err();
    assert!(matches!(err, InterviewError::ScoringFailed(_)));

    // Nothing written, current question unchanged, session still live.
    assert!(repo.get_answer(started.question.id()).await.unwrap().is_none());
    let current = service.get_current_question(session_id).await.unwrap();
    assert_eq!(current.id(), started.question.id());
    let session = repo.get_session(session_id).await.unwrap();
    assert_eq!(session.status(), SessionStatus::InProgress);

    // The retry is the caller's: the same submission succeeds once the
    // oracle recovers.
    oracle.fail_scoring.store(false, Ordering::SeqCst);
    let outcome = service
        .submit_answer(session_id, started.question.id(), "answer")
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Next { .. }));
}

#[tokio::test]
async fn fallback_report_averages_recorded_scores() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&["Q0", "Q1"]));
    oracle.push_evaluation(80, 70, 90);
    oracle.push_evaluation(60, 80, 70);
    oracle.set_report(None);
    let (service, _repo) = build_service(oracle);
    let service = service.with_session_length(2);

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();
    let session_id = started.session.id();

    let SubmitOutcome::Next { question, .. } = service
        .submit_answer(session_id, started.question.id(), "first")
        .await
        .unwrap()
    else {
        panic!("expected Next outcome");
    };

    let SubmitOutcome::Completed { report, .. } = service
        .submit_answer(session_id, question.id(), "second")
        .await
        .unwrap()
    else {
        panic!("expected Completed outcome");
    };

    // Axis means (70, 75, 80) average to 75.
    assert_eq!(report.average_score(), 75);
    assert_eq!(service.report(session_id).await.unwrap(), report);
}

#[tokio::test]
async fn interrupted_advance_is_recoverable() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&["Q0"]));
    let (service, repo) = build_service(oracle.clone());

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();
    let session_id = started.session.id();

    // The answer is scored and recorded, then next-question generation
    // fails: the submission errors but the scored answer survives.
    oracle.fail_next_question.store(true, Ordering::SeqCst);
    let err = service
        .submit_answer(session_id, started.question.id(), "answer")
        .await
        .unwrap_err();
    assert!(matches!(err, InterviewError::OracleUnavailable(_)));
    assert!(repo.get_answer(started.question.id()).await.unwrap().is_some());

    // A second submission for the same question cannot double-record.
    let err = service
        .submit_answer(session_id, started.question.id(), "answer again")
        .await
        .unwrap_err();
    assert!(matches!(err, InterviewError::AlreadyAnswered(_)));
    assert_eq!(repo.list_answers(session_id).await.unwrap().len(), 1);

    // No pending question until the session is resumed.
    let err = service.get_current_question(session_id).await.unwrap_err();
    assert!(matches!(err, InterviewError::NoCurrentQuestion));

    oracle.fail_next_question.store(false, Ordering::SeqCst);
    oracle.push_questions(&["Q1"]);
    let resumed = service.resume_session(session_id).await.unwrap();
    let ResumeState::Question(question) = resumed else {
        panic!("expected a question after resume");
    };
    assert_eq!(question.text(), "Q1");

    let current = service.get_current_question(session_id).await.unwrap();
    assert_eq!(current.id(), question.id());
}

#[tokio::test]
async fn resume_is_idempotent_on_a_healthy_session() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&["Q0"]));
    let (service, _repo) = build_service(oracle);

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();

    let first = service.resume_session(started.session.id()).await.unwrap();
    let second = service.resume_session(started.session.id()).await.unwrap();
    assert_eq!(first, second);
    assert!(matches!(first, ResumeState::Question(q) if q.id() == started.question.id()));
}

#[tokio::test]
async fn resume_rederives_the_report_after_an_interrupted_finish() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&["Q0"]));
    oracle.push_evaluation(80, 70, 90);
    oracle.set_report(None);
    let (service, repo) = build_service(oracle);
    let service = service.with_session_length(1);

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();
    let session_id = started.session.id();

    // Simulate a crash after the final answer landed but before the
    // session was marked completed.
    let answer = interview_core::model::Answer::new(
        interview_core::model::AnswerId::generate(),
        started.question.id(),
        "final answer",
        AxisScores::new(80, 70, 90).unwrap(),
        "feedback",
        interview_core::time::fixed_now(),
    );
    repo.append_answer(&answer).await.unwrap();

    let resumed = service.resume_session(session_id).await.unwrap();
    let ResumeState::Completed(report) = resumed else {
        panic!("expected completion on resume");
    };
    assert_eq!(report.average_score(), 80);

    let session = repo.get_session(session_id).await.unwrap();
    assert!(session.is_completed());

    // Resuming again returns the same persisted report.
    let again = service.resume_session(session_id).await.unwrap();
    assert_eq!(again, ResumeState::Completed(report));
}

#[tokio::test]
async fn unknown_sessions_are_not_found() {
    let oracle = Arc::new(ScriptedOracle::default());
    let (service, _repo) = build_service(oracle);
    let missing = interview_core::model::SessionId::generate();

    assert!(matches!(
        service.get_current_question(missing).await.unwrap_err(),
        InterviewError::SessionNotFound
    ));
    assert!(matches!(
        service
            .submit_answer(missing, QuestionId::generate(), "answer")
            .await
            .unwrap_err(),
        InterviewError::SessionNotFound
    ));
    assert!(matches!(
        service.report(missing).await.unwrap_err(),
        InterviewError::SessionNotFound
    ));
}

#[tokio::test]
async fn report_before_completion_is_rejected() {
    let oracle = Arc::new(ScriptedOracle::with_questions(&["Q0"]));
    let (service, _repo) = build_service(oracle);

    let started = service
        .start_session(UserId::generate(), profile())
        .await
        .unwrap();

    let err = service.report(started.session.id()).await.unwrap_err();
    assert!(matches!(err, InterviewError::SessionInProgress));
}

use interview_core::model::{
    Answer, AnswerId, AxisScores, CandidateProfile, DEFAULT_SESSION_LENGTH, Question, QuestionId,
    QuestionKind, Report, Session, SessionId, SessionStatus, UserId,
};
use interview_core::time::fixed_now;
use storage::repository::{AnswerRepository, QuestionRepository, SessionRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn build_session() -> Session {
    let profile = CandidateProfile {
        name: "Test Candidate".to_string(),
        skills: vec!["Rust".to_string()],
        experience_years: Some(3),
        projects: Vec::new(),
    };
    Session::new(
        SessionId::generate(),
        UserId::generate(),
        profile,
        DEFAULT_SESSION_LENGTH,
        fixed_now(),
    )
    .unwrap()
}

fn build_question(session_id: SessionId, text: &str, kind: QuestionKind) -> Question {
    Question::new(
        QuestionId::generate(),
        session_id,
        text,
        kind,
        Some("a hint".to_string()),
        fixed_now(),
    )
    .unwrap()
}

fn build_answer(question_id: QuestionId) -> Answer {
    Answer::new(
        AnswerId::generate(),
        question_id,
        "an answer",
        AxisScores::new(80, 70, 90).unwrap(),
        "solid reasoning",
        fixed_now(),
    )
}

#[tokio::test]
async fn sqlite_roundtrips_session_and_first_question() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let session = build_session();
    let question = build_question(session.id(), "Explain ownership", QuestionKind::Conceptual);
    repo.create_session(&session, &question).await.unwrap();

    let fetched = repo.get_session(session.id()).await.unwrap();
    assert_eq!(fetched.id(), session.id());
    assert_eq!(fetched.status(), SessionStatus::InProgress);
    assert_eq!(fetched.fixed_length(), DEFAULT_SESSION_LENGTH);
    assert_eq!(fetched.profile().name, "Test Candidate");
    assert!(fetched.report().is_none());

    let questions = repo.list_questions(session.id()).await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].id(), question.id());
    assert_eq!(questions[0].kind(), QuestionKind::Conceptual);
    assert_eq!(questions[0].hint(), Some("a hint"));
}

#[tokio::test]
async fn sqlite_missing_session_is_not_found() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_missing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let err = repo.get_session(SessionId::generate()).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_orders_questions_by_creation() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_order?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let session = build_session();
    let first = build_question(session.id(), "Q0", QuestionKind::Conceptual);
    repo.create_session(&session, &first).await.unwrap();

    // Same created_at on purpose: rowid must break the tie in insert order.
    let second = build_question(session.id(), "Q1", QuestionKind::Coding);
    let third = build_question(session.id(), "Q2", QuestionKind::Conceptual);
    repo.append_question(&second).await.unwrap();
    repo.append_question(&third).await.unwrap();

    let listed = repo.list_questions(session.id()).await.unwrap();
    let ids: Vec<_> = listed.iter().map(Question::id).collect();
    assert_eq!(ids, vec![first.id(), second.id(), third.id()]);
}

#[tokio::test]
async fn sqlite_rejects_second_answer_for_question() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_answers?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let session = build_session();
    let question = build_question(session.id(), "Q0", QuestionKind::Coding);
    repo.create_session(&session, &question).await.unwrap();

    repo.append_answer(&build_answer(question.id())).await.unwrap();
    let err = repo
        .append_answer(&build_answer(question.id()))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let stored = repo.get_answer(question.id()).await.unwrap().unwrap();
    assert_eq!(stored.scores().correctness(), 80);

    let listed = repo.list_answers(session.id()).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn sqlite_completes_session_once() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_complete?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let session = build_session();
    let question = build_question(session.id(), "Q0", QuestionKind::Conceptual);
    repo.create_session(&session, &question).await.unwrap();

    let report = Report::new(
        75,
        vec!["Depth of detail".to_string()],
        vec!["Technical accuracy".to_string()],
        fixed_now(),
    )
    .unwrap();
    repo.complete_session(session.id(), &report).await.unwrap();

    let fetched = repo.get_session(session.id()).await.unwrap();
    assert!(fetched.is_completed());
    let stored = fetched.report().expect("report persisted");
    assert_eq!(stored.average_score(), 75);
    assert_eq!(stored.strengths(), ["Depth of detail".to_string()]);
    assert_eq!(stored.completed_at(), fixed_now());

    let err = repo
        .complete_session(session.id(), &report)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let err = repo
        .complete_session(SessionId::generate(), &report)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

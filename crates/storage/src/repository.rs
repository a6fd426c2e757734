use async_trait::async_trait;
use interview_core::model::{Answer, Question, QuestionId, Report, Session, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session together with its first question.
    ///
    /// Creation is atomic: either both rows exist afterwards or neither
    /// does.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the session id already exists,
    /// or other storage errors.
    async fn create_session(
        &self,
        session: &Session,
        first_question: &Question,
    ) -> Result<(), StorageError>;

    /// Fetch a session by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_session(&self, id: SessionId) -> Result<Session, StorageError>;

    /// Mark a session completed and attach its report.
    ///
    /// The write only applies to an in-progress row, which enforces the
    /// monotonic status transition at the storage layer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist and
    /// `StorageError::Conflict` if it is already completed.
    async fn complete_session(&self, id: SessionId, report: &Report) -> Result<(), StorageError>;
}

/// Repository contract for the append-only question log.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Append a question to its session's log.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the question id already exists,
    /// or other storage errors.
    async fn append_question(&self, question: &Question) -> Result<(), StorageError>;

    /// All questions of a session ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_questions(&self, session_id: SessionId) -> Result<Vec<Question>, StorageError>;
}

/// Repository contract for the append-only answer log.
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Record an answer. First write wins.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the question already has an
    /// answer, or other storage errors.
    async fn append_answer(&self, answer: &Answer) -> Result<(), StorageError>;

    /// The answer for a question, if one has been recorded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_answer(&self, question_id: QuestionId) -> Result<Option<Answer>, StorageError>;

    /// All answers of a session, in question order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_answers(&self, session_id: SessionId) -> Result<Vec<Answer>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
    questions: Arc<Mutex<HashMap<SessionId, Vec<Question>>>>,
    answers: Arc<Mutex<HashMap<QuestionId, Answer>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn create_session(
        &self,
        session: &Session,
        first_question: &Question,
    ) -> Result<(), StorageError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut questions = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if sessions.contains_key(&session.id()) {
            return Err(StorageError::Conflict);
        }
        sessions.insert(session.id(), session.clone());
        questions
            .entry(session.id())
            .or_default()
            .push(first_question.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Session, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn complete_session(&self, id: SessionId, report: &Report) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let session = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        session
            .complete(report.clone())
            .map_err(|_| StorageError::Conflict)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn append_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let log = guard.entry(question.session_id()).or_default();
        if log.iter().any(|q| q.id() == question.id()) {
            return Err(StorageError::Conflict);
        }
        log.push(question.clone());
        Ok(())
    }

    async fn list_questions(&self, session_id: SessionId) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&session_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl AnswerRepository for InMemoryRepository {
    async fn append_answer(&self, answer: &Answer) -> Result<(), StorageError> {
        let mut guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&answer.question_id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(answer.question_id(), answer.clone());
        Ok(())
    }

    async fn get_answer(&self, question_id: QuestionId) -> Result<Option<Answer>, StorageError> {
        let guard = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&question_id).cloned())
    }

    async fn list_answers(&self, session_id: SessionId) -> Result<Vec<Answer>, StorageError> {
        let questions = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let answers = self
            .answers
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(log) = questions.get(&session_id) else {
            return Ok(Vec::new());
        };
        Ok(log
            .iter()
            .filter_map(|q| answers.get(&q.id()).cloned())
            .collect())
    }
}

/// Aggregates the interview repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let answers: Arc<dyn AnswerRepository> = Arc::new(repo);
        Self {
            sessions,
            questions,
            answers,
        }
    }
}

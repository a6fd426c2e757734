use interview_core::model::{Answer, QuestionId, SessionId};

use super::{SqliteRepository, mapping};
use crate::repository::{AnswerRepository, StorageError};

#[async_trait::async_trait]
impl AnswerRepository for SqliteRepository {
    async fn append_answer(&self, answer: &Answer) -> Result<(), StorageError> {
        // The UNIQUE constraint on question_id turns a second write for the
        // same question into a Conflict.
        sqlx::query(
            r"
            INSERT INTO answers (
                id, question_id, answer_text, correctness, depth, clarity,
                feedback, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(answer.id().to_string())
        .bind(answer.question_id().to_string())
        .bind(answer.text().to_owned())
        .bind(i64::from(answer.scores().correctness()))
        .bind(i64::from(answer.scores().depth()))
        .bind(i64::from(answer.scores().clarity()))
        .bind(answer.feedback().to_owned())
        .bind(answer.created_at())
        .execute(self.pool())
        .await
        .map_err(mapping::map_sqlx_err)?;

        Ok(())
    }

    async fn get_answer(&self, question_id: QuestionId) -> Result<Option<Answer>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, question_id, answer_text, correctness, depth, clarity,
                   feedback, created_at
            FROM answers
            WHERE question_id = ?1
            ",
        )
        .bind(question_id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(mapping::map_answer_row).transpose()
    }

    async fn list_answers(&self, session_id: SessionId) -> Result<Vec<Answer>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT a.id, a.question_id, a.answer_text, a.correctness, a.depth,
                   a.clarity, a.feedback, a.created_at
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.session_id = ?1
            ORDER BY q.created_at ASC, q.rowid ASC
            ",
        )
        .bind(session_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut answers = Vec::with_capacity(rows.len());
        for row in rows {
            answers.push(mapping::map_answer_row(&row)?);
        }
        Ok(answers)
    }
}

use interview_core::model::{Question, SessionId};

use super::{SqliteRepository, mapping};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn append_question(&self, question: &Question) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO questions (
                id, session_id, question_text, kind, hint, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(question.id().to_string())
        .bind(question.session_id().to_string())
        .bind(question.text().to_owned())
        .bind(question.kind().as_str())
        .bind(question.hint().map(str::to_owned))
        .bind(question.created_at())
        .execute(self.pool())
        .await
        .map_err(mapping::map_sqlx_err)?;

        Ok(())
    }

    async fn list_questions(&self, session_id: SessionId) -> Result<Vec<Question>, StorageError> {
        // rowid breaks ties for questions created within the same instant,
        // keeping the derived sequence indices stable.
        let rows = sqlx::query(
            r"
            SELECT id, session_id, question_text, kind, hint, created_at
            FROM questions
            WHERE session_id = ?1
            ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(session_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(mapping::map_question_row(&row)?);
        }
        Ok(questions)
    }
}

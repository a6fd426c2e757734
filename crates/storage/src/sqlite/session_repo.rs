use interview_core::model::{Question, Report, Session, SessionId};

use super::{SqliteRepository, mapping};
use crate::repository::{SessionRepository, StorageError};

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn create_session(
        &self,
        session: &Session,
        first_question: &Question,
    ) -> Result<(), StorageError> {
        let profile = serde_json::to_string(session.profile()).map_err(mapping::ser)?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO sessions (
                id, owner, profile, status, fixed_length, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(session.id().to_string())
        .bind(session.owner().to_string())
        .bind(profile)
        .bind(session.status().as_str())
        .bind(i64::from(session.fixed_length()))
        .bind(session.created_at())
        .execute(&mut *tx)
        .await
        .map_err(mapping::map_sqlx_err)?;

        sqlx::query(
            r"
            INSERT INTO questions (
                id, session_id, question_text, kind, hint, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(first_question.id().to_string())
        .bind(first_question.session_id().to_string())
        .bind(first_question.text().to_owned())
        .bind(first_question.kind().as_str())
        .bind(first_question.hint().map(str::to_owned))
        .bind(first_question.created_at())
        .execute(&mut *tx)
        .await
        .map_err(mapping::map_sqlx_err)?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    async fn get_session(&self, id: SessionId) -> Result<Session, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                id, owner, profile, status, fixed_length,
                average_score, strengths, weak_areas, completed_at, created_at
            FROM sessions
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        mapping::map_session_row(&row)
    }

    async fn complete_session(&self, id: SessionId, report: &Report) -> Result<(), StorageError> {
        let strengths = serde_json::to_string(report.strengths()).map_err(mapping::ser)?;
        let weak_areas = serde_json::to_string(report.weak_areas()).map_err(mapping::ser)?;

        let res = sqlx::query(
            r"
            UPDATE sessions
            SET status = 'completed',
                average_score = ?2,
                strengths = ?3,
                weak_areas = ?4,
                completed_at = ?5
            WHERE id = ?1 AND status = 'in_progress'
            ",
        )
        .bind(id.to_string())
        .bind(i64::from(report.average_score()))
        .bind(strengths)
        .bind(weak_areas)
        .bind(report.completed_at())
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing updated: distinguish a missing row from an already
        // completed one.
        let row = sqlx::query("SELECT status FROM sessions WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            None => Err(StorageError::NotFound),
            Some(_) => Err(StorageError::Conflict),
        }
    }
}

use interview_core::model::{
    Answer, AnswerId, AxisScores, CandidateProfile, Question, QuestionId, QuestionKind, Report,
    Session, SessionId, SessionStatus, UserId,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps a sqlx error, distinguishing unique-constraint violations so the
/// first-write-wins contracts surface as `Conflict`.
pub(crate) fn map_sqlx_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn session_id_from_str(s: &str) -> Result<SessionId, StorageError> {
    s.parse::<SessionId>().map_err(ser)
}

pub(crate) fn question_id_from_str(s: &str) -> Result<QuestionId, StorageError> {
    s.parse::<QuestionId>().map_err(ser)
}

fn axis_u8(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<Session, StorageError> {
    let id = session_id_from_str(row.try_get::<String, _>("id").map_err(ser)?.as_str())?;
    let owner = row
        .try_get::<String, _>("owner")
        .map_err(ser)?
        .parse::<UserId>()
        .map_err(ser)?;
    let profile: CandidateProfile =
        serde_json::from_str(row.try_get::<String, _>("profile").map_err(ser)?.as_str())
            .map_err(ser)?;
    let status = SessionStatus::parse(row.try_get::<String, _>("status").map_err(ser)?.as_str())
        .map_err(ser)?;
    let fixed_length_i64: i64 = row.try_get("fixed_length").map_err(ser)?;
    let fixed_length = u32::try_from(fixed_length_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid fixed_length: {fixed_length_i64}"))
    })?;

    let average_score: Option<i64> = row.try_get("average_score").map_err(ser)?;
    let report = match average_score {
        None => None,
        Some(avg) => {
            let strengths: Vec<String> = serde_json::from_str(
                row.try_get::<Option<String>, _>("strengths")
                    .map_err(ser)?
                    .ok_or_else(|| StorageError::Serialization("missing strengths".into()))?
                    .as_str(),
            )
            .map_err(ser)?;
            let weak_areas: Vec<String> = serde_json::from_str(
                row.try_get::<Option<String>, _>("weak_areas")
                    .map_err(ser)?
                    .ok_or_else(|| StorageError::Serialization("missing weak_areas".into()))?
                    .as_str(),
            )
            .map_err(ser)?;
            let completed_at = row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>("completed_at")
                .map_err(ser)?
                .ok_or_else(|| StorageError::Serialization("missing completed_at".into()))?;
            Some(
                Report::new(
                    axis_u8("average_score", avg)?,
                    strengths,
                    weak_areas,
                    completed_at,
                )
                .map_err(ser)?,
            )
        }
    };

    Session::from_persisted(
        id,
        owner,
        profile,
        status,
        fixed_length,
        report,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_str(row.try_get::<String, _>("id").map_err(ser)?.as_str())?;
    let session_id =
        session_id_from_str(row.try_get::<String, _>("session_id").map_err(ser)?.as_str())?;
    let kind = QuestionKind::parse(row.try_get::<String, _>("kind").map_err(ser)?.as_str())
        .map_err(ser)?;

    Question::new(
        id,
        session_id,
        row.try_get::<String, _>("question_text").map_err(ser)?,
        kind,
        row.try_get::<Option<String>, _>("hint").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<Answer, StorageError> {
    let id = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse::<AnswerId>()
        .map_err(ser)?;
    let question_id =
        question_id_from_str(row.try_get::<String, _>("question_id").map_err(ser)?.as_str())?;
    let scores = AxisScores::new(
        axis_u8("correctness", row.try_get::<i64, _>("correctness").map_err(ser)?)?,
        axis_u8("depth", row.try_get::<i64, _>("depth").map_err(ser)?)?,
        axis_u8("clarity", row.try_get::<i64, _>("clarity").map_err(ser)?)?,
    )
    .map_err(ser)?;

    Ok(Answer::new(
        id,
        question_id,
        row.try_get::<String, _>("answer_text").map_err(ser)?,
        scores,
        row.try_get::<String, _>("feedback").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    ))
}

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use interview_core::model::{AxisScores, CandidateProfile, Question, QuestionKind};

use super::{
    Evaluation, OracleError, QuestionDraft, ReportDraft, ScoringOracle, SessionContext, prompts,
};

/// Hard ceiling on a single oracle round trip. A timed-out call surfaces as
/// a request error and is treated like any other scoring failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Low temperature keeps the JSON payloads stable.
const JSON_TEMPERATURE: f32 = 0.1;

#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl OracleConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("INTERVIEW_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("INTERVIEW_AI_BASE_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1".into());
        let model =
            env::var("INTERVIEW_AI_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Scoring oracle backed by an OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct GroqOracle {
    client: Client,
    config: Option<OracleConfig>,
}

impl GroqOracle {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(OracleConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<OracleConfig>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn chat(&self, system: &'static str, prompt: String) -> Result<String, OracleError> {
        let config = self.config.as_ref().ok_or(OracleError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: JSON_TEMPERATURE,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OracleError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(OracleError::EmptyResponse)?;

        debug!(model = %config.model, bytes = content.len(), "oracle round trip");
        Ok(content)
    }

    async fn chat_json<T: DeserializeOwned>(
        &self,
        system: &'static str,
        prompt: String,
    ) -> Result<T, OracleError> {
        let raw = self.chat(system, prompt).await?;
        let clean = prompts::strip_json_fences(&raw);
        serde_json::from_str(clean).map_err(OracleError::Parse)
    }
}

#[async_trait]
impl ScoringOracle for GroqOracle {
    async fn first_question(
        &self,
        profile: &CandidateProfile,
    ) -> Result<QuestionDraft, OracleError> {
        let payload: QuestionPayload = self
            .chat_json(prompts::INTERVIEWER_SYSTEM, prompts::first_question(profile))
            .await?;
        payload.into_draft()
    }

    async fn score_answer(
        &self,
        question: &Question,
        answer_text: &str,
    ) -> Result<Evaluation, OracleError> {
        let payload: EvaluationPayload = self
            .chat_json(
                prompts::EVALUATOR_SYSTEM,
                prompts::evaluation(question, answer_text),
            )
            .await?;
        payload.into_evaluation()
    }

    async fn next_question(
        &self,
        context: &SessionContext,
    ) -> Result<QuestionDraft, OracleError> {
        let payload: QuestionPayload = self
            .chat_json(prompts::INTERVIEWER_SYSTEM, prompts::next_question(context))
            .await?;
        payload.into_draft()
    }

    async fn final_report(&self, context: &SessionContext) -> Result<ReportDraft, OracleError> {
        let payload: ReportPayload = self
            .chat_json(prompts::EVALUATOR_SYSTEM, prompts::final_report(context))
            .await?;
        payload.into_draft()
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionPayload {
    question: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    hint: Option<String>,
}

impl QuestionPayload {
    fn into_draft(self) -> Result<QuestionDraft, OracleError> {
        if self.question.trim().is_empty() {
            return Err(OracleError::Malformed("empty question text".into()));
        }
        let kind = QuestionKind::parse(&self.kind)
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        Ok(QuestionDraft {
            text: self.question,
            kind,
            hint: self.hint.filter(|h| !h.trim().is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct EvaluationPayload {
    correctness: f64,
    depth: f64,
    clarity: f64,
    feedback: String,
}

impl EvaluationPayload {
    fn into_evaluation(self) -> Result<Evaluation, OracleError> {
        let scores = AxisScores::new(
            axis_score("correctness", self.correctness)?,
            axis_score("depth", self.depth)?,
            axis_score("clarity", self.clarity)?,
        )
        .map_err(|e| OracleError::Malformed(e.to_string()))?;
        Ok(Evaluation {
            scores,
            feedback: self.feedback,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReportPayload {
    average_score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weak_areas: Vec<String>,
}

impl ReportPayload {
    fn into_draft(self) -> Result<ReportDraft, OracleError> {
        Ok(ReportDraft {
            average_score: axis_score("average_score", self.average_score)?,
            strengths: self.strengths,
            weak_areas: self.weak_areas,
        })
    }
}

/// Rounds a model-supplied score and rejects anything outside 0..=100.
fn axis_score(axis: &'static str, value: f64) -> Result<u8, OracleError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(OracleError::Malformed(format!(
            "{axis} score {value} is out of range"
        )));
    }
    // In range, so the cast is lossless after rounding.
    Ok(value.round() as u8)
}

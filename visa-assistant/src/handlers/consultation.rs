//! Consultation endpoints. Each visitor's state lives in their session and
//! is loaded, changed and written back by every request.

use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use tower_sessions::Session;
use validator::Validate;

use crate::models::{ChecklistEntry, Message, SessionState, Theme};
use crate::services::conversation::TurnOutcome;
use crate::services::export::{render_pdf, CHECKLIST_FILENAME, PDF_CONTENT_TYPE};
use crate::startup::AppState;

const SESSION_KEY: &str = "consultation";

async fn load_state(session: &Session) -> Result<SessionState, AppError> {
    Ok(session
        .get::<SessionState>(SESSION_KEY)
        .await?
        .unwrap_or_default())
}

async fn save_state(session: &Session, state: &SessionState) -> Result<(), AppError> {
    session.insert(SESSION_KEY, state).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ConsultationSnapshot {
    pub transcript: Vec<Message>,
    pub checklist: Vec<ChecklistEntry>,
    pub theme: Theme,
}

impl From<&SessionState> for ConsultationSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            transcript: state.transcript().to_vec(),
            checklist: state.checklist().entries().to_vec(),
            theme: state.theme(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(
        min = 1,
        max = 4000,
        message = "Message must be between 1 and 4000 characters"
    ))]
    pub message: String,
}

/// Result of one question: either the answer fields or `error`.
///
/// A failed model call is still a 200. The session layer drops every change
/// made while producing a 5xx response, including the stored question.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub outcome: Option<TurnOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checklist: Vec<ChecklistEntry>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ToggleItemRequest {
    #[validate(length(min = 1, message = "Item cannot be empty"))]
    pub item: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleItemResponse {
    pub item: String,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

pub async fn get_consultation(session: Session) -> Result<Json<ConsultationSnapshot>, AppError> {
    let consultation = load_state(&session).await?;
    Ok(Json(ConsultationSnapshot::from(&consultation)))
}

/// Answer one question. The question is stored before the model is asked, so
/// it stays in the transcript when the model call fails; the visitor can
/// submit it again.
#[tracing::instrument(skip(state, session, request))]
pub async fn send_message(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    request.validate()?;

    if request.message.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Message cannot be blank"
        )));
    }

    let mut consultation = load_state(&session).await?;
    state
        .conversation
        .begin_turn(&mut consultation, &request.message);
    save_state(&session, &consultation).await?;

    let (outcome, error) = match state
        .conversation
        .request_answer(consultation.history())
        .await
    {
        Ok(response) => {
            let outcome = state.conversation.complete_turn(&mut consultation, response);
            save_state(&session, &consultation).await?;
            (Some(outcome), None)
        }
        Err(e) => (None, Some(format!("Generation failed: {}", e))),
    };

    Ok(Json(ChatResponse {
        outcome,
        error,
        checklist: consultation.checklist().entries().to_vec(),
    }))
}

pub async fn summarize(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SummaryResponse>, AppError> {
    let consultation = load_state(&session).await?;
    let summary = state.conversation.summarize(&consultation).await;
    Ok(Json(SummaryResponse { summary }))
}

pub async fn reset(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ConsultationSnapshot>, AppError> {
    let mut consultation = load_state(&session).await?;
    state.conversation.reset(&mut consultation);
    save_state(&session, &consultation).await?;
    Ok(Json(ConsultationSnapshot::from(&consultation)))
}

pub async fn toggle_item(
    session: Session,
    Json(request): Json<ToggleItemRequest>,
) -> Result<Json<ToggleItemResponse>, AppError> {
    request.validate()?;

    let mut consultation = load_state(&session).await?;
    let completed = consultation
        .checklist_mut()
        .toggle(&request.item)
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Checklist item not found: {}", request.item))
        })?;
    save_state(&session, &consultation).await?;

    Ok(Json(ToggleItemResponse {
        item: request.item,
        completed,
    }))
}

pub async fn download_checklist(session: Session) -> Result<impl IntoResponse, AppError> {
    let consultation = load_state(&session).await?;
    let labels: Vec<&str> = consultation.checklist().labels().collect();
    let pdf = render_pdf(&labels)?;

    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CHECKLIST_FILENAME),
            ),
        ],
        pdf,
    ))
}

pub async fn toggle_theme(session: Session) -> Result<Json<ThemeResponse>, AppError> {
    let mut consultation = load_state(&session).await?;
    let theme = consultation.toggle_theme();
    save_state(&session, &consultation).await?;
    Ok(Json(ThemeResponse { theme }))
}

//! /api/sessions: session-scoped intake flow.
//!
//! Per-session locks are held only around state transitions. The lookup race
//! and the submission sink run unlocked, so a second submission arriving
//! meanwhile sees the pending ticket and is refused with 409.
//!
//! Once a transition has begun, the work and its `complete_*` call run in a
//! spawned task that the handler awaits. A client that disconnects mid-flight
//! drops only the handler; the task still completes the transition.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use intake_core::{DetailsUpdate, SessionError, SessionView};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, SharedSession};

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

async fn session(state: &AppState, id: Uuid) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or(AppError::SessionNotFound(id))
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.create().await;
    let view = session.lock().await.view();
    tracing::debug!(session_id = %view.session_id, "session created");
    (StatusCode::CREATED, Json(view))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = session(&state, id).await?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

pub async fn submit_email(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = session(&state, id).await?;

    let (ticket, email) = {
        let mut s = session.lock().await;
        let ticket = s.begin_lookup(&req.email)?;
        (ticket, s.draft().email.clone())
    };

    let coordinator = state.coordinator.clone();
    let completion = tokio::spawn(async move {
        let resolution = coordinator.resolve(&email).await;
        tracing::info!(
            session_id = %id,
            outcome = resolution.outcome.as_str(),
            elapsed_ms = resolution.elapsed.as_millis() as u64,
            "email step resolved"
        );

        let mut s = session.lock().await;
        s.complete_lookup(ticket, &resolution.result)?;
        Ok::<_, SessionError>(s.view())
    });

    Ok(Json(completion.await??))
}

pub async fn update_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<DetailsUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let session = session(&state, id).await?;
    let mut s = session.lock().await;
    s.update_details(update)?;
    Ok(Json(s.view()))
}

pub async fn submit_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = session(&state, id).await?;

    let (ticket, draft) = {
        let mut s = session.lock().await;
        let ticket = s.begin_submit()?;
        (ticket, s.draft().clone())
    };

    let sink = Arc::clone(&state.sink);
    let completion = tokio::spawn(async move {
        let outcome = sink.submit(&draft).await;
        let mut s = session.lock().await;
        s.complete_submit(ticket, outcome)?;
        Ok::<_, SessionError>(s.view())
    });

    Ok(Json(completion.await??))
}

use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
};

use crate::errors::AppError;
use crate::models::AuthContext;
use crate::render::ShellOptions;
use crate::state::AppState;

// The unguessable session id is the capability; sessions are served without an owner filter.

/// GET /resume/preview/:session_id
pub async fn preview_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let auth = AuthContext::local();
    let session = state.repo.get_preview_session(&auth, &session_id).await?;
    let record = state.repo.get_resume_record(&auth, session.resume_id).await?;
    let html = state.renderer.render_html(
        &session.template_body,
        &session.css,
        &record,
        &ShellOptions::with_download(state.urls.download(&session.id)),
    )?;
    Ok(Html(html))
}

/// GET /resume/download/:session_id
pub async fn download_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let auth = AuthContext::local();
    let session = state.repo.get_preview_session(&auth, &session_id).await?;
    let record = state.repo.get_resume_record(&auth, session.resume_id).await?;
    let pdf = state
        .renderer
        .render_pdf(&session.template_body, &session.css, &record)
        .await?;
    tracing::info!(session_id, bytes = pdf.len(), "PDF generated");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"resume.pdf\""),
        ],
        pdf,
    ))
}

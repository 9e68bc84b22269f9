use tracing::info;
use uuid::Uuid;

use super::{now, RepoResult, Repository, Statement};
use crate::errors::AppError;
use crate::models::{AuthContext, PreviewSessionRow};

impl Repository {
    /// Snapshots a template body and CSS under a fresh opaque session id.
    pub async fn create_preview_session(
        &self,
        auth: &AuthContext,
        resume_id: i64,
        template_body: &str,
        css: &str,
    ) -> RepoResult<PreviewSessionRow> {
        self.require_resume(auth, resume_id).await?;
        let row = sqlx::query_as::<_, PreviewSessionRow>(
            "INSERT INTO preview_sessions (id, resume_id, template_body, css, owner_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(resume_id)
        .bind(template_body.to_string())
        .bind(css.to_string())
        .bind(auth.owner_id().unwrap_or_default().to_string())
        .bind(now())
        .fetch_one(&self.pool)
        .await?;
        info!(session_id = %row.id, resume_id, "Preview session created");
        Ok(row)
    }

    pub async fn get_preview_session(
        &self,
        auth: &AuthContext,
        session_id: &str,
    ) -> RepoResult<PreviewSessionRow> {
        let mut stmt = Statement::new("SELECT s.* FROM preview_sessions s WHERE s.id = ");
        stmt.bind_text(session_id).owned_by(auth, "s.owner_id");
        stmt.query_as::<PreviewSessionRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Preview session", session_id))
    }

    /// Replaces the session's CSS. An unknown session is an error, not a silent no-op.
    pub async fn update_preview_css(
        &self,
        auth: &AuthContext,
        session_id: &str,
        css: &str,
    ) -> RepoResult<PreviewSessionRow> {
        let mut stmt = Statement::new("UPDATE preview_sessions SET css = ");
        stmt.bind_text(css).push(" WHERE id = ").bind_text(session_id);
        stmt.owned_by(auth, "owner_id").push(" RETURNING *");

        let row = stmt
            .query_as::<PreviewSessionRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Preview session", session_id))?;
        info!(session_id, "Preview style updated");
        Ok(row)
    }
}

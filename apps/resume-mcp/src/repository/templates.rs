use tracing::info;

use super::resumes::{fetch_resume, load_record};
use super::{copy, now, RepoResult, Repository, Statement};
use crate::errors::AppError;
use crate::models::{AuthContext, NewTemplate, ResumeRecord, TemplatePatch, TemplateRow};

impl Repository {
    /// Inserts a template. With `copy_from`, the source resume's contents are
    /// first copied into the template's resume.
    ///
    /// `validate` sees the template body and the resume as it will be after
    /// the copy. Copy, validation and insert share one transaction, so a
    /// rejected template leaves nothing behind.
    pub async fn create_template<F>(
        &self,
        auth: &AuthContext,
        new: NewTemplate,
        copy_from: Option<i64>,
        validate: F,
    ) -> RepoResult<TemplateRow>
    where
        F: FnOnce(&str, &ResumeRecord) -> Result<(), AppError>,
    {
        let mut tx = self.pool.begin().await?;

        let resume = fetch_resume(&mut tx, auth, new.resume_id)
            .await?
            .ok_or_else(|| AppError::not_found("Resume", new.resume_id))?;

        if let Some(source_id) = copy_from {
            copy::copy_contents(&mut tx, auth, source_id, new.resume_id).await?;
        }

        let record = load_record(&mut tx, resume).await?;
        validate(&new.template_body, &record)?;

        let ts = now();
        let row = sqlx::query_as::<_, TemplateRow>(
            "INSERT INTO templates (resume_id, name, description, template_body, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(new.resume_id)
        .bind(new.name)
        .bind(new.description)
        .bind(new.template_body)
        .bind(ts.clone())
        .bind(ts)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(template_id = row.id, resume_id = row.resume_id, "Template created");
        Ok(row)
    }

    pub async fn get_template(&self, auth: &AuthContext, id: i64) -> RepoResult<TemplateRow> {
        let mut stmt = Statement::new(
            "SELECT t.* FROM templates t JOIN resumes r ON r.id = t.resume_id WHERE t.id = ",
        );
        stmt.bind_int(id).owned_by(auth, "r.owner_id");
        stmt.query_as::<TemplateRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Template", id))
    }

    pub async fn list_templates(
        &self,
        auth: &AuthContext,
        resume_id: i64,
    ) -> RepoResult<Vec<TemplateRow>> {
        self.require_resume(auth, resume_id).await?;
        Ok(
            sqlx::query_as("SELECT * FROM templates WHERE resume_id = $1 ORDER BY id")
                .bind(resume_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn update_template(
        &self,
        auth: &AuthContext,
        id: i64,
        patch: TemplatePatch,
    ) -> RepoResult<TemplateRow> {
        let existing = self.get_template(auth, id).await?;

        if patch.is_empty() {
            return Ok(existing);
        }

        let mut stmt = Statement::new("UPDATE templates SET ");
        stmt.set_present(&[
            ("name", patch.name.as_ref()),
            ("description", patch.description.as_ref()),
            ("template_body", patch.template_body.as_ref()),
        ]);
        stmt.push(", updated_at = ").bind_text(now());
        stmt.push(" WHERE id = ").bind_int(id).push(" RETURNING *");

        let row = stmt.query_as::<TemplateRow>().fetch_one(&self.pool).await?;
        info!(template_id = id, "Template updated");
        Ok(row)
    }

    pub async fn delete_template(&self, auth: &AuthContext, id: i64) -> RepoResult<()> {
        self.get_template(auth, id).await?;
        sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(template_id = id, "Template deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::NewResume;
    use crate::render::RenderError;

    fn accept(_: &str, _: &ResumeRecord) -> Result<(), AppError> {
        Ok(())
    }

    async fn setup() -> (Repository, tempfile::TempDir, i64) {
        let (pool, dir) = test_pool().await;
        let repo = Repository::new(pool);
        let resume = repo
            .create_resume(
                &AuthContext::local(),
                NewResume {
                    name: "John Doe".into(),
                    description: "Engineer".into(),
                    photo: String::new(),
                },
            )
            .await
            .unwrap();
        (repo, dir, resume.id)
    }

    fn template(resume_id: i64) -> NewTemplate {
        NewTemplate {
            resume_id,
            name: "Basic".into(),
            description: String::new(),
            template_body: "<h1>{{name}}</h1>".into(),
        }
    }

    #[tokio::test]
    async fn test_template_crud() {
        let (repo, _dir, resume_id) = setup().await;
        let auth = AuthContext::local();

        let created = repo
            .create_template(&auth, template(resume_id), None, accept)
            .await
            .unwrap();
        assert_eq!(repo.get_template(&auth, created.id).await.unwrap().name, "Basic");

        let updated = repo
            .update_template(
                &auth,
                created.id,
                TemplatePatch {
                    template_body: Some("<h2>{{name}}</h2>".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Basic");
        assert_eq!(updated.template_body, "<h2>{{name}}</h2>");

        assert_eq!(repo.list_templates(&auth, resume_id).await.unwrap().len(), 1);
        repo.delete_template(&auth, created.id).await.unwrap();
        assert!(repo.list_templates(&auth, resume_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_resume_removes_templates() {
        let (repo, _dir, resume_id) = setup().await;
        let auth = AuthContext::local();
        let created = repo
            .create_template(&auth, template(resume_id), None, accept)
            .await
            .unwrap();

        repo.delete_resume(&auth, resume_id).await.unwrap();

        assert!(matches!(
            repo.get_template(&auth, created.id).await,
            Err(AppError::NotFound(_))
        ));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM templates")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_create_template_with_copy_fills_target_resume() {
        let (repo, _dir, source_id) = setup().await;
        let auth = AuthContext::local();
        repo.add_contact(&auth, source_id, "email", "john@example.com").await.unwrap();
        let target = repo
            .create_resume(
                &auth,
                NewResume {
                    name: "Target".into(),
                    description: String::new(),
                    photo: String::new(),
                },
            )
            .await
            .unwrap();

        let mut seen_contacts = 0;
        repo.create_template(&auth, template(target.id), Some(source_id), |_, record| {
            seen_contacts = record.contacts.len();
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(seen_contacts, 1);

        let record = repo.get_resume_record(&auth, target.id).await.unwrap();
        assert_eq!(record.contacts.len(), 1);
        assert_eq!(record.contacts[0].value, "john@example.com");
        assert_eq!(record.resume.name, "Target");
    }

    #[tokio::test]
    async fn test_rejected_template_rolls_back_copy() {
        let (repo, _dir, source_id) = setup().await;
        let auth = AuthContext::local();
        repo.add_contact(&auth, source_id, "email", "john@example.com").await.unwrap();
        let target = repo
            .create_resume(
                &auth,
                NewResume {
                    name: "Target".into(),
                    description: String::new(),
                    photo: String::new(),
                },
            )
            .await
            .unwrap();

        let result = repo
            .create_template(&auth, template(target.id), Some(source_id), |_, _| {
                Err(RenderError::Parse("unclosed block".into()).into())
            })
            .await;

        assert!(matches!(result, Err(AppError::Render(_))));
        let record = repo.get_resume_record(&auth, target.id).await.unwrap();
        assert!(record.contacts.is_empty());
        assert!(repo.list_templates(&auth, target.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_template_copy_from_missing_source_persists_nothing() {
        let (repo, _dir, resume_id) = setup().await;
        let auth = AuthContext::local();

        let result = repo
            .create_template(&auth, template(resume_id), Some(999), accept)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(repo.list_templates(&auth, resume_id).await.unwrap().is_empty());
    }
}

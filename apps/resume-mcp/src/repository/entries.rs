use sqlx::AnyConnection;
use tracing::info;

use super::resumes::{feature_map_columns, FEATURE_MAP_SCOPE};
use super::{RepoResult, Repository, Statement};
use crate::errors::AppError;
use crate::models::{
    format_date, AuthContext, ContactRow, EducationRow, ExperienceKind, ExperienceRef, FeatureMap,
    FeatureMapPatch, FeatureMapRow, NewEducation, NewFeatureMap, NewWorkExperience,
    OtherExperienceRow, WorkExperienceRow,
};

fn experience_label(kind: ExperienceKind) -> &'static str {
    match kind {
        ExperienceKind::Work => "Work experience",
        ExperienceKind::Education => "Education",
        ExperienceKind::Other => "Other experience",
    }
}

impl Repository {
    // ── Contacts ───────────────────────────────────────────────────────────

    pub async fn add_contact(
        &self,
        auth: &AuthContext,
        resume_id: i64,
        key: &str,
        value: &str,
    ) -> RepoResult<ContactRow> {
        self.require_resume(auth, resume_id).await?;
        let row = sqlx::query_as::<_, ContactRow>(
            "INSERT INTO contacts (resume_id, key, value) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(resume_id)
        .bind(key.to_string())
        .bind(value.to_string())
        .fetch_one(&self.pool)
        .await?;
        info!(resume_id, contact_id = row.id, "Contact added");
        Ok(row)
    }

    pub async fn delete_contact(&self, auth: &AuthContext, contact_id: i64) -> RepoResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::owning_resume_id(&mut conn, auth, "contacts", contact_id)
            .await?
            .ok_or_else(|| AppError::not_found("Contact", contact_id))?;
        sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(contact_id)
            .execute(&mut *conn)
            .await?;
        info!(contact_id, "Contact deleted");
        Ok(())
    }

    // ── Experiences ────────────────────────────────────────────────────────

    pub async fn add_work_experience(
        &self,
        auth: &AuthContext,
        resume_id: i64,
        new: NewWorkExperience,
    ) -> RepoResult<WorkExperienceRow> {
        self.require_resume(auth, resume_id).await?;
        let row = sqlx::query_as::<_, WorkExperienceRow>(
            "INSERT INTO work_experiences \
                (resume_id, company, job_title, employment_type, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(resume_id)
        .bind(new.company)
        .bind(new.job_title)
        .bind(new.employment_type.as_str().to_string())
        .bind(format_date(new.start_date))
        .bind(new.end_date.map(format_date).unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;
        info!(resume_id, work_experience_id = row.id, "Work experience added");
        Ok(row)
    }

    pub async fn add_education(
        &self,
        auth: &AuthContext,
        resume_id: i64,
        new: NewEducation,
    ) -> RepoResult<EducationRow> {
        self.require_resume(auth, resume_id).await?;
        let row = sqlx::query_as::<_, EducationRow>(
            "INSERT INTO educations (resume_id, school_name, employment_type, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(resume_id)
        .bind(new.school_name)
        .bind(new.employment_type.as_str().to_string())
        .bind(format_date(new.start_date))
        .bind(new.end_date.map(format_date).unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;
        info!(resume_id, education_id = row.id, "Education added");
        Ok(row)
    }

    pub async fn add_other_experience(
        &self,
        auth: &AuthContext,
        resume_id: i64,
        category: &str,
    ) -> RepoResult<OtherExperienceRow> {
        self.require_resume(auth, resume_id).await?;
        let row = sqlx::query_as::<_, OtherExperienceRow>(
            "INSERT INTO other_experiences (resume_id, category) VALUES ($1, $2) RETURNING *",
        )
        .bind(resume_id)
        .bind(category.to_string())
        .fetch_one(&self.pool)
        .await?;
        info!(resume_id, other_experience_id = row.id, "Other experience added");
        Ok(row)
    }

    /// Deletes an experience of any kind. Its feature maps go with it via the FK cascade.
    pub async fn delete_experience(
        &self,
        auth: &AuthContext,
        experience: ExperienceRef,
    ) -> RepoResult<()> {
        let kind = experience.kind();
        let mut conn = self.pool.acquire().await?;
        Self::owning_resume_id(&mut conn, auth, kind.table(), experience.id())
            .await?
            .ok_or_else(|| AppError::not_found(experience_label(kind), experience.id()))?;
        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
            .bind(experience.id())
            .execute(&mut *conn)
            .await?;
        info!(%experience, "Experience deleted");
        Ok(())
    }

    // ── Feature maps ───────────────────────────────────────────────────────

    pub async fn add_feature_map(
        &self,
        auth: &AuthContext,
        new: NewFeatureMap,
    ) -> RepoResult<FeatureMap> {
        let kind = new.experience.kind();
        let mut conn = self.pool.acquire().await?;
        Self::owning_resume_id(&mut conn, auth, kind.table(), new.experience.id())
            .await?
            .ok_or_else(|| AppError::not_found(experience_label(kind), new.experience.id()))?;

        let map = insert_feature_map(&mut conn, &new).await?;
        info!(feature_map_id = map.id, experience = %map.experience, "Feature map added");
        Ok(map)
    }

    pub async fn get_feature_map(&self, auth: &AuthContext, id: i64) -> RepoResult<FeatureMap> {
        let mut stmt = Statement::new(&format!(
            "SELECT {} {FEATURE_MAP_SCOPE} WHERE fm.id = ",
            feature_map_columns("fm.")
        ));
        stmt.bind_int(id).owned_by(auth, "r.owner_id");
        stmt.query_as::<FeatureMapRow>()
            .fetch_optional(&self.pool)
            .await?
            .and_then(FeatureMapRow::into_feature_map)
            .ok_or_else(|| AppError::not_found("Feature map", id))
    }

    /// Partial update: absent fields keep their value.
    pub async fn update_feature_map(
        &self,
        auth: &AuthContext,
        id: i64,
        patch: FeatureMapPatch,
    ) -> RepoResult<FeatureMap> {
        let existing = self.get_feature_map(auth, id).await?;

        let mut stmt = Statement::new("UPDATE feature_maps SET ");
        let changed = stmt.set_present(&[
            ("key", patch.key.as_ref()),
            ("value", patch.value.as_ref()),
            ("category", patch.category.as_ref()),
        ]);
        if !changed {
            return Ok(existing);
        }
        stmt.push(" WHERE id = ").bind_int(id);
        stmt.push(&format!(" RETURNING {}", feature_map_columns("")));

        let map = stmt
            .query_as::<FeatureMapRow>()
            .fetch_one(&self.pool)
            .await?
            .into_feature_map()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("feature map {id} has no owner")))?;
        info!(feature_map_id = id, "Feature map updated");
        Ok(map)
    }

    pub async fn delete_feature_map(&self, auth: &AuthContext, id: i64) -> RepoResult<()> {
        self.get_feature_map(auth, id).await?;
        sqlx::query("DELETE FROM feature_maps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(feature_map_id = id, "Feature map deleted");
        Ok(())
    }
}

pub(super) async fn insert_feature_map(
    conn: &mut AnyConnection,
    new: &NewFeatureMap,
) -> Result<FeatureMap, AppError> {
    // Only the owning FK column is named; the other two default to NULL.
    let row = sqlx::query_as::<_, FeatureMapRow>(&format!(
        "INSERT INTO feature_maps ({}, key, value, category) VALUES ($1, $2, $3, $4) RETURNING {}",
        new.experience.kind().feature_map_column(),
        feature_map_columns("")
    ))
    .bind(new.experience.id())
    .bind(new.key.clone())
    .bind(new.value.clone())
    .bind(new.category.clone())
    .fetch_one(conn)
    .await?;

    row.into_feature_map()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("inserted feature map has no owner")))
}

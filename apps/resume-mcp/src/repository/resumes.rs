use std::collections::HashMap;

use sqlx::AnyConnection;
use tracing::info;

use super::{now, RepoResult, Repository, Statement};
use crate::errors::AppError;
use crate::models::{
    AuthContext, ContactRow, EducationRow, ExperienceRecord, ExperienceRef, FeatureMap,
    FeatureMapRow, NewResume, OtherExperienceRow, ResumePatch, ResumeRecord, ResumeRow,
    WorkExperienceRow,
};

/// Joins a feature map to the resume owning its experience, whichever kind it is.
pub(super) const FEATURE_MAP_SCOPE: &str = "FROM feature_maps fm \
     LEFT JOIN work_experiences w ON w.id = fm.work_experience_id \
     LEFT JOIN educations e ON e.id = fm.education_id \
     LEFT JOIN other_experiences o ON o.id = fm.other_experience_id \
     JOIN resumes r ON r.id = COALESCE(w.resume_id, e.resume_id, o.resume_id)";

/// Select list for [`FeatureMapRow`]: the three nullable FK columns collapse
/// into `experience_type` and `experience_id`. `alias` is `"fm."` inside
/// [`FEATURE_MAP_SCOPE`] and empty for `RETURNING` clauses.
pub(super) fn feature_map_columns(alias: &str) -> String {
    format!(
        "{alias}id, \
         CASE WHEN {alias}work_experience_id IS NOT NULL THEN 'work' \
              WHEN {alias}education_id IS NOT NULL THEN 'education' \
              ELSE 'other' END AS experience_type, \
         COALESCE({alias}work_experience_id, {alias}education_id, {alias}other_experience_id) \
             AS experience_id, \
         {alias}key, {alias}value, {alias}category"
    )
}

impl Repository {
    pub async fn create_resume(&self, auth: &AuthContext, new: NewResume) -> RepoResult<ResumeRow> {
        let mut conn = self.pool.acquire().await?;
        let row = insert_resume(&mut conn, auth, &new).await?;
        info!(resume_id = row.id, name = %row.name, "Resume created");
        Ok(row)
    }

    pub async fn get_resume(&self, auth: &AuthContext, id: i64) -> RepoResult<Option<ResumeRow>> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_resume(&mut conn, auth, id).await?)
    }

    /// Like [`Repository::get_resume`] but absent rows become `AppError::NotFound`.
    pub async fn require_resume(&self, auth: &AuthContext, id: i64) -> RepoResult<ResumeRow> {
        self.get_resume(auth, id)
            .await?
            .ok_or_else(|| AppError::not_found("Resume", id))
    }

    /// First resume with exactly this name (lowest id wins on duplicates).
    pub async fn get_resume_by_name(
        &self,
        auth: &AuthContext,
        name: &str,
    ) -> RepoResult<Option<ResumeRow>> {
        let mut stmt = Statement::new("SELECT r.* FROM resumes r WHERE r.name = ");
        stmt.bind_text(name).owned_by(auth, "r.owner_id");
        stmt.push(" ORDER BY r.id LIMIT 1");
        Ok(stmt.query_as::<ResumeRow>().fetch_optional(&self.pool).await?)
    }

    pub async fn list_resumes(&self, auth: &AuthContext) -> RepoResult<Vec<ResumeRow>> {
        let mut stmt = Statement::new("SELECT r.* FROM resumes r WHERE 1 = 1");
        stmt.owned_by(auth, "r.owner_id").push(" ORDER BY r.id");
        Ok(stmt.query_as::<ResumeRow>().fetch_all(&self.pool).await?)
    }

    /// The resume with all children and feature maps.
    pub async fn get_resume_record(&self, auth: &AuthContext, id: i64) -> RepoResult<ResumeRecord> {
        let mut conn = self.pool.acquire().await?;
        let resume = fetch_resume(&mut conn, auth, id)
            .await?
            .ok_or_else(|| AppError::not_found("Resume", id))?;
        Ok(load_record(&mut conn, resume).await?)
    }

    pub async fn update_basic_info(
        &self,
        auth: &AuthContext,
        id: i64,
        patch: ResumePatch,
    ) -> RepoResult<ResumeRow> {
        let existing = self.require_resume(auth, id).await?;

        let mut stmt = Statement::new("UPDATE resumes SET ");
        let changed = stmt.set_present(&[
            ("name", patch.name.as_ref()),
            ("photo", patch.photo.as_ref()),
            ("description", patch.description.as_ref()),
        ]);
        if !changed {
            return Ok(existing);
        }
        stmt.push(", updated_at = ").bind_text(now());
        stmt.push(" WHERE id = ").bind_int(id);
        stmt.push(" RETURNING *");

        let row = stmt.query_as::<ResumeRow>().fetch_one(&self.pool).await?;
        info!(resume_id = id, "Resume basic info updated");
        Ok(row)
    }

    /// Deletes the resume; the schema cascades to every child row.
    pub async fn delete_resume(&self, auth: &AuthContext, id: i64) -> RepoResult<ResumeRow> {
        let existing = self.require_resume(auth, id).await?;
        sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(resume_id = id, "Resume deleted");
        Ok(existing)
    }
}

pub(super) async fn insert_resume(
    conn: &mut AnyConnection,
    auth: &AuthContext,
    new: &NewResume,
) -> Result<ResumeRow, sqlx::Error> {
    let ts = now();
    sqlx::query_as::<_, ResumeRow>(
        "INSERT INTO resumes (name, photo, description, owner_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(new.name.clone())
    .bind(new.photo.clone())
    .bind(new.description.clone())
    .bind(auth.owner_id().unwrap_or_default().to_string())
    .bind(ts.clone())
    .bind(ts)
    .fetch_one(conn)
    .await
}

pub(super) async fn fetch_resume(
    conn: &mut AnyConnection,
    auth: &AuthContext,
    id: i64,
) -> Result<Option<ResumeRow>, sqlx::Error> {
    let mut stmt = Statement::new("SELECT r.* FROM resumes r WHERE r.id = ");
    stmt.bind_int(id).owned_by(auth, "r.owner_id");
    stmt.query_as::<ResumeRow>().fetch_optional(conn).await
}

/// Loads every child of `resume` and groups feature maps under their experience.
pub(super) async fn load_record(
    conn: &mut AnyConnection,
    resume: ResumeRow,
) -> Result<ResumeRecord, sqlx::Error> {
    let id = resume.id;

    let contacts: Vec<ContactRow> =
        sqlx::query_as("SELECT * FROM contacts WHERE resume_id = $1 ORDER BY id")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let work: Vec<WorkExperienceRow> =
        sqlx::query_as("SELECT * FROM work_experiences WHERE resume_id = $1 ORDER BY id")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let educations: Vec<EducationRow> =
        sqlx::query_as("SELECT * FROM educations WHERE resume_id = $1 ORDER BY id")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let others: Vec<OtherExperienceRow> =
        sqlx::query_as("SELECT * FROM other_experiences WHERE resume_id = $1 ORDER BY id")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let feature_rows: Vec<FeatureMapRow> = sqlx::query_as(&format!(
        "SELECT {} {FEATURE_MAP_SCOPE} WHERE r.id = $1 ORDER BY fm.id",
        feature_map_columns("fm.")
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_experience: HashMap<ExperienceRef, Vec<FeatureMap>> = HashMap::new();
    for map in feature_rows.into_iter().filter_map(FeatureMapRow::into_feature_map) {
        by_experience.entry(map.experience).or_default().push(map);
    }
    let mut take = |reference: ExperienceRef| by_experience.remove(&reference).unwrap_or_default();

    let work_experiences = work
        .into_iter()
        .map(|entry| ExperienceRecord {
            feature_maps: take(ExperienceRef::Work(entry.id)),
            entry,
        })
        .collect();
    let educations = educations
        .into_iter()
        .map(|entry| ExperienceRecord {
            feature_maps: take(ExperienceRef::Education(entry.id)),
            entry,
        })
        .collect();
    let other_experiences = others
        .into_iter()
        .map(|entry| ExperienceRecord {
            feature_maps: take(ExperienceRef::Other(entry.id)),
            entry,
        })
        .collect();

    Ok(ResumeRecord {
        resume,
        contacts,
        work_experiences,
        educations,
        other_experiences,
    })
}

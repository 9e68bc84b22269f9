use serde::Serialize;
use sqlx::AnyConnection;
use tracing::{debug, info};

use super::entries::insert_feature_map;
use super::resumes::{fetch_resume, insert_resume, load_record};
use super::{RepoResult, Repository};
use crate::errors::AppError;
use crate::models::{AuthContext, ExperienceRef, FeatureMap, NewFeatureMap, NewResume, ResumeRow};

/// Row counts produced by a copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopyStats {
    pub contacts: usize,
    pub work_experiences: usize,
    pub educations: usize,
    pub other_experiences: usize,
    pub feature_maps: usize,
    pub templates: usize,
}

impl Repository {
    /// Creates a resume and copies every child of `source_id` into it,
    /// templates included. Either all rows are written or none are.
    pub async fn create_resume_from(
        &self,
        auth: &AuthContext,
        new: NewResume,
        source_id: i64,
    ) -> RepoResult<(ResumeRow, CopyStats)> {
        let mut tx = self.pool.begin().await?;

        let resume = insert_resume(&mut tx, auth, &new).await?;
        let mut stats = copy_contents(&mut tx, auth, source_id, resume.id).await?;
        stats.templates = sqlx::query(
            "INSERT INTO templates (resume_id, name, description, template_body, created_at, updated_at) \
             SELECT $1, name, description, template_body, $2, $3 FROM templates \
             WHERE resume_id = $4 ORDER BY id",
        )
        .bind(resume.id)
        .bind(resume.created_at.clone())
        .bind(resume.created_at.clone())
        .bind(source_id)
        .execute(&mut *tx)
        .await?
        .rows_affected() as usize;

        tx.commit().await?;
        info!(resume_id = resume.id, source_id, ?stats, "Resume created from copy");
        Ok((resume, stats))
    }
}

/// Copies contacts, experiences and their feature maps from one resume into
/// another. Runs on the caller's connection so it joins the caller's transaction.
pub(super) async fn copy_contents(
    conn: &mut AnyConnection,
    auth: &AuthContext,
    source_id: i64,
    target_id: i64,
) -> Result<CopyStats, AppError> {
    let source = fetch_resume(conn, auth, source_id)
        .await?
        .ok_or_else(|| AppError::not_found("Source resume", source_id))?;
    let record = load_record(conn, source).await?;
    debug!(
        source_id,
        target_id,
        feature_maps = record.feature_map_count(),
        "Copying resume contents"
    );
    let mut stats = CopyStats::default();

    for contact in &record.contacts {
        sqlx::query("INSERT INTO contacts (resume_id, key, value) VALUES ($1, $2, $3)")
            .bind(target_id)
            .bind(contact.key.clone())
            .bind(contact.value.clone())
            .execute(&mut *conn)
            .await?;
        stats.contacts += 1;
    }

    for work in &record.work_experiences {
        let new_id: i64 = sqlx::query_scalar(
            "INSERT INTO work_experiences \
                (resume_id, company, job_title, employment_type, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(target_id)
        .bind(work.entry.company.clone())
        .bind(work.entry.job_title.clone())
        .bind(work.entry.employment_type.clone())
        .bind(work.entry.start_date.clone())
        .bind(work.entry.end_date.clone())
        .fetch_one(&mut *conn)
        .await?;
        stats.work_experiences += 1;
        stats.feature_maps +=
            copy_feature_maps(conn, &work.feature_maps, ExperienceRef::Work(new_id)).await?;
    }

    for education in &record.educations {
        let new_id: i64 = sqlx::query_scalar(
            "INSERT INTO educations (resume_id, school_name, employment_type, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(target_id)
        .bind(education.entry.school_name.clone())
        .bind(education.entry.employment_type.clone())
        .bind(education.entry.start_date.clone())
        .bind(education.entry.end_date.clone())
        .fetch_one(&mut *conn)
        .await?;
        stats.educations += 1;
        stats.feature_maps +=
            copy_feature_maps(conn, &education.feature_maps, ExperienceRef::Education(new_id))
                .await?;
    }

    for other in &record.other_experiences {
        let new_id: i64 = sqlx::query_scalar(
            "INSERT INTO other_experiences (resume_id, category) VALUES ($1, $2) RETURNING id",
        )
        .bind(target_id)
        .bind(other.entry.category.clone())
        .fetch_one(&mut *conn)
        .await?;
        stats.other_experiences += 1;
        stats.feature_maps +=
            copy_feature_maps(conn, &other.feature_maps, ExperienceRef::Other(new_id)).await?;
    }

    Ok(stats)
}

async fn copy_feature_maps(
    conn: &mut AnyConnection,
    maps: &[FeatureMap],
    target: ExperienceRef,
) -> Result<usize, AppError> {
    for map in maps {
        insert_feature_map(
            conn,
            &NewFeatureMap {
                experience: target,
                key: map.key.clone(),
                value: map.value.clone(),
                category: map.category.clone(),
            },
        )
        .await?;
    }
    Ok(maps.len())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::NaiveDate;

    use super::*;
    use crate::db::test_pool;
    use crate::models::{EmploymentType, NewWorkExperience};

    fn new_resume(name: &str) -> NewResume {
        NewResume {
            name: name.into(),
            description: "desc".into(),
            photo: String::new(),
        }
    }

    async fn seed_source(repo: &Repository, works: usize, maps_per_work: usize, key: &str) -> i64 {
        let auth = AuthContext::local();
        let source = repo.create_resume(&auth, new_resume("Source")).await.unwrap();
        repo.add_contact(&auth, source.id, "email", "src@example.com").await.unwrap();
        for i in 0..works {
            let work = repo
                .add_work_experience(
                    &auth,
                    source.id,
                    NewWorkExperience {
                        company: format!("Company {i}"),
                        job_title: "Engineer".into(),
                        employment_type: EmploymentType::Parttime,
                        start_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
                        end_date: NaiveDate::from_ymd_opt(2021, 6, 30),
                    },
                )
                .await
                .unwrap();
            for j in 0..maps_per_work {
                repo.add_feature_map(
                    &auth,
                    NewFeatureMap {
                        experience: ExperienceRef::Work(work.id),
                        key: if j + 1 == maps_per_work { key.to_string() } else { format!("k{j}") },
                        value: format!("v{j}"),
                        category: String::new(),
                    },
                )
                .await
                .unwrap();
            }
        }
        source.id
    }

    #[tokio::test]
    async fn test_copy_duplicates_every_feature_map_with_new_ids() {
        let (pool, _dir) = test_pool().await;
        let repo = Repository::new(pool);
        let auth = AuthContext::local();
        let source_id = seed_source(&repo, 3, 2, "last").await;
        repo.create_template(
            &auth,
            crate::models::NewTemplate {
                resume_id: source_id,
                name: "Basic".into(),
                description: String::new(),
                template_body: "<h1>{{name}}</h1>".into(),
            },
            None,
            |_, _| Ok(()),
        )
        .await
        .unwrap();

        let (copy, stats) = repo
            .create_resume_from(&auth, new_resume("Copy"), source_id)
            .await
            .unwrap();

        assert_eq!(stats.work_experiences, 3);
        assert_eq!(stats.feature_maps, 6);
        assert_eq!(stats.contacts, 1);
        assert_eq!(stats.templates, 1);

        let source = repo.get_resume_record(&auth, source_id).await.unwrap();
        let copied = repo.get_resume_record(&auth, copy.id).await.unwrap();
        assert_eq!(copied.feature_map_count(), 6);
        assert_eq!(copied.work_experiences[0].entry.end_date, "2021-06-30");
        assert_eq!(copied.work_experiences[0].entry.employment_type, "parttime");
        let templates = repo.list_templates(&auth, copy.id).await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].template_body, "<h1>{{name}}</h1>");

        let source_ids: HashSet<i64> = source
            .work_experiences
            .iter()
            .flat_map(|w| w.feature_maps.iter().map(|m| m.id))
            .collect();
        for work in &copied.work_experiences {
            for map in &work.feature_maps {
                assert!(!source_ids.contains(&map.id));
                assert_eq!(map.experience, ExperienceRef::Work(work.entry.id));
            }
        }
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_no_partial_resume() {
        let (pool, _dir) = test_pool().await;
        let repo = Repository::new(pool);
        let auth = AuthContext::local();
        let source_id = seed_source(&repo, 2, 2, "explode").await;

        sqlx::query(
            "CREATE TRIGGER reject_explode BEFORE INSERT ON feature_maps \
             WHEN NEW.key = 'explode' \
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(repo.pool())
        .await
        .unwrap();

        let result = repo
            .create_resume_from(&auth, new_resume("Broken copy"), source_id)
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));

        let resumes = repo.list_resumes(&auth).await.unwrap();
        assert_eq!(resumes.len(), 1);
        assert_eq!(resumes[0].id, source_id);
        let works: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM work_experiences")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(works, 2);
    }

    #[tokio::test]
    async fn test_copy_from_missing_source_is_not_found() {
        let (pool, _dir) = test_pool().await;
        let repo = Repository::new(pool);
        let auth = AuthContext::local();

        let result = repo.create_resume_from(&auth, new_resume("Orphan"), 77).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(repo.list_resumes(&auth).await.unwrap().is_empty());
    }
}

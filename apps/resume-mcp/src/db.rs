use anyhow::{Context, Result};
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Executor};
use tracing::info;

/// Which engine a connection URL points at. Only the DDL differs between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    pub fn from_url(database_url: &str) -> Result<Self> {
        if database_url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else if database_url.starts_with("postgres:") || database_url.starts_with("postgresql:") {
            Ok(Backend::Postgres)
        } else {
            anyhow::bail!("Unsupported DATABASE_URL scheme (expected sqlite: or postgres:)")
        }
    }

    fn primary_key(self) -> &'static str {
        match self {
            Backend::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Backend::Postgres => "BIGSERIAL PRIMARY KEY",
        }
    }
}

/// Creates a connection pool for either backend and makes sure the schema exists.
pub async fn create_pool(database_url: &str) -> Result<AnyPool> {
    let backend = Backend::from_url(database_url)?;
    info!(?backend, "Connecting to database...");

    sqlx::any::install_default_drivers();

    let mut options = AnyPoolOptions::new().max_connections(10);
    if backend == Backend::Sqlite {
        options = options.after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("PRAGMA foreign_keys = ON").await?;
                Ok(())
            })
        });
    }

    let pool = options
        .connect(database_url)
        .await
        .context("failed to connect to database")?;

    migrate(&pool, backend).await?;

    info!("Database connection pool established");
    Ok(pool)
}

/// Creates every table if absent. There is no migration versioning beyond this.
///
/// Columns read back through the `Any` driver are `NOT NULL`: it cannot decode
/// a NULL into `Option<T>`. Only the feature map FK columns are nullable, and
/// those are never selected directly.
pub async fn migrate(pool: &AnyPool, backend: Backend) -> Result<()> {
    for statement in schema(backend) {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .with_context(|| format!("schema statement failed: {statement}"))?;
    }
    Ok(())
}

fn schema(backend: Backend) -> Vec<String> {
    let pk = backend.primary_key();
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS resumes (
                id {pk},
                name TEXT NOT NULL,
                photo TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                owner_id TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS contacts (
                id {pk},
                resume_id BIGINT NOT NULL REFERENCES resumes(id) ON DELETE CASCADE,
                key TEXT NOT NULL,
                value TEXT NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS work_experiences (
                id {pk},
                resume_id BIGINT NOT NULL REFERENCES resumes(id) ON DELETE CASCADE,
                company TEXT NOT NULL,
                job_title TEXT NOT NULL,
                employment_type TEXT NOT NULL DEFAULT 'fulltime',
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL DEFAULT ''
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS educations (
                id {pk},
                resume_id BIGINT NOT NULL REFERENCES resumes(id) ON DELETE CASCADE,
                school_name TEXT NOT NULL,
                employment_type TEXT NOT NULL DEFAULT 'fulltime',
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL DEFAULT ''
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS other_experiences (
                id {pk},
                resume_id BIGINT NOT NULL REFERENCES resumes(id) ON DELETE CASCADE,
                category TEXT NOT NULL
            )"
        ),
        // Exactly one owning experience per feature map, each kind cascading on delete.
        format!(
            "CREATE TABLE IF NOT EXISTS feature_maps (
                id {pk},
                work_experience_id BIGINT REFERENCES work_experiences(id) ON DELETE CASCADE,
                education_id BIGINT REFERENCES educations(id) ON DELETE CASCADE,
                other_experience_id BIGINT REFERENCES other_experiences(id) ON DELETE CASCADE,
                key TEXT NOT NULL,
                value TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT '',
                CHECK (
                    (CASE WHEN work_experience_id IS NULL THEN 0 ELSE 1 END)
                    + (CASE WHEN education_id IS NULL THEN 0 ELSE 1 END)
                    + (CASE WHEN other_experience_id IS NULL THEN 0 ELSE 1 END) = 1
                )
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS templates (
                id {pk},
                resume_id BIGINT NOT NULL REFERENCES resumes(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                template_body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        ),
        "CREATE TABLE IF NOT EXISTS preview_sessions (
            id TEXT PRIMARY KEY,
            resume_id BIGINT NOT NULL REFERENCES resumes(id) ON DELETE CASCADE,
            template_body TEXT NOT NULL,
            css TEXT NOT NULL DEFAULT '',
            owner_id TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )"
        .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_resumes_owner ON resumes (owner_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_contacts_resume ON contacts (resume_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_work_resume ON work_experiences (resume_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_education_resume ON educations (resume_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_other_resume ON other_experiences (resume_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_templates_resume ON templates (resume_id)".to_string(),
    ]
}

/// File-backed SQLite pool in a temp dir. Keep the `TempDir` alive for the test's duration.
#[cfg(test)]
pub async fn test_pool() -> (AnyPool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let pool = create_pool(&url).await.unwrap();
    (pool, dir)
}

/// Pool on the Postgres database named by `TEST_DATABASE_URL`, or `None` when it is unset.
#[cfg(test)]
pub async fn postgres_test_pool() -> Option<AnyPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    assert_eq!(Backend::from_url(&url).unwrap(), Backend::Postgres);
    Some(create_pool(&url).await.unwrap())
}

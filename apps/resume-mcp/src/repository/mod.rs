//! Persistence for resumes and everything hanging off them.
//!
//! Every public method takes an [`AuthContext`]. When it carries an owner,
//! reads and writes are restricted to resumes with that `owner_id`; the
//! local context is unrestricted. Rows outside the caller's scope are
//! reported as not found, never as forbidden.

mod copy;
mod entries;
mod previews;
mod resumes;
mod templates;

pub use copy::CopyStats;

use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{Any, AnyConnection, AnyPool, FromRow};

use crate::errors::AppError;
use crate::models::AuthContext;

pub type RepoResult<T> = Result<T, AppError>;

#[derive(Clone)]
pub struct Repository {
    pool: AnyPool,
}

impl Repository {
    pub fn new(pool: AnyPool) -> Self {
        Repository { pool }
    }

    #[cfg(test)]
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Resolves the `resume_id` of a child row, checking that its resume is visible to `auth`.
    async fn owning_resume_id(
        conn: &mut AnyConnection,
        auth: &AuthContext,
        table: &str,
        id: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let mut stmt = Statement::new(&format!(
            "SELECT t.resume_id FROM {table} t JOIN resumes r ON r.id = t.resume_id WHERE t.id = "
        ));
        stmt.bind_int(id).owned_by(auth, "r.owner_id");
        stmt.query_scalar::<i64>().fetch_optional(conn).await
    }
}

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ────────────────────────────────────────────────────────────────────────────
// Statement builder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Bind {
    Int(i64),
    Text(String),
}

/// SQL text plus positional `$n` binds, for statements whose shape depends
/// on the caller (owner filter, partial updates).
#[derive(Debug, Clone)]
pub(crate) struct Statement {
    sql: String,
    binds: Vec<Bind>,
}

impl Statement {
    pub fn new(sql: &str) -> Self {
        Statement {
            sql: sql.to_string(),
            binds: Vec::new(),
        }
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    fn placeholder(&mut self, bind: Bind) -> &mut Self {
        self.binds.push(bind);
        let n = self.binds.len();
        self.sql.push_str(&format!("${n}"));
        self
    }

    pub fn bind_int(&mut self, value: i64) -> &mut Self {
        self.placeholder(Bind::Int(value))
    }

    pub fn bind_text(&mut self, value: impl Into<String>) -> &mut Self {
        self.placeholder(Bind::Text(value.into()))
    }

    /// Appends `AND <column> = $n` when `auth` is scoped to an owner.
    pub fn owned_by(&mut self, auth: &AuthContext, column: &str) -> &mut Self {
        if let Some(owner) = auth.owner_id() {
            self.push(&format!(" AND {column} = "));
            self.bind_text(owner);
        }
        self
    }

    /// Appends `col = $n` assignments for the present values, comma separated.
    /// Returns false when nothing was present.
    pub fn set_present(&mut self, columns: &[(&str, Option<&String>)]) -> bool {
        let mut first = true;
        for (column, value) in columns {
            if let Some(value) = value {
                if !first {
                    self.push(", ");
                }
                first = false;
                self.push(&format!("{column} = "));
                self.bind_text(value.as_str());
            }
        }
        !first
    }

    #[cfg(test)]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn query_as<T>(&self) -> QueryAs<'_, Any, T, AnyArguments<'_>>
    where
        T: for<'r> FromRow<'r, AnyRow>,
    {
        let mut query = sqlx::query_as::<_, T>(&self.sql);
        for bind in &self.binds {
            query = match bind {
                Bind::Int(v) => query.bind(*v),
                Bind::Text(v) => query.bind(v.clone()),
            };
        }
        query
    }

    pub fn query_scalar<O>(&self) -> QueryScalar<'_, Any, O, AnyArguments<'_>>
    where
        (O,): for<'r> FromRow<'r, AnyRow>,
    {
        let mut query = sqlx::query_scalar::<_, O>(&self.sql);
        for bind in &self.binds {
            query = match bind {
                Bind::Int(v) => query.bind(*v),
                Bind::Text(v) => query.bind(v.clone()),
            };
        }
        query
    }
}

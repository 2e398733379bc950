//! `PostgreSQL` [`JobRepository`] backed by a `sqlx` connection pool.
//!
//! Queries are assembled per call with [`QueryBuilder`]. Identifiers reach the
//! SQL text only through [`JobColumn`] and [`OrderBy`], both parsed against the
//! column allow-list; every value travels as a bound parameter.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jobboard_core::{Job, JobColumn, ListFilter};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{debug_span, info, Instrument};

use super::repository::{JobRepository, RepositoryError};
use crate::config::DatabaseConfig;

const JOBS_TABLE: &str = "jobs";

const SELECT_COLUMNS: &str =
    "id, title, description, owner_id, price, created_at, updated_at, deleted_at, from_date, to_date";

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS jobs (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    owner_id    TEXT NOT NULL DEFAULT '',
    price       DOUBLE PRECISION NOT NULL DEFAULT 0,
    from_date   TEXT NOT NULL DEFAULT '',
    to_date     TEXT NOT NULL DEFAULT '',
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ,
    deleted_at  TIMESTAMPTZ
)";

/// Job repository over a shared `PgPool`.
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from the database configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection options are malformed or the
    /// database is unreachable.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let options = match &config.url {
            Some(url) => PgConnectOptions::from_str(url)?,
            None => PgConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.user)
                .password(&config.password)
                .database(&config.name)
                .ssl_mode(PgSslMode::from_str(&config.ssl_mode)?),
        };

        info!(max_connections = config.max_connections, "Connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }
}

// ---------------------------------------------------------------------------
// Query construction
// ---------------------------------------------------------------------------

fn select_prefix() -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(SELECT_COLUMNS).push(" FROM ").push(JOBS_TABLE);
    qb
}

fn get_query(field: JobColumn, value: &str) -> QueryBuilder<'static, Postgres> {
    let mut qb = select_prefix();
    qb.push(" WHERE ")
        .push(field.as_str())
        .push(" = ")
        .push_bind(value.to_owned())
        .push(" AND deleted_at IS NULL LIMIT 1");
    qb
}

/// Projection, then the deleted-exclusion predicate, then ORDER BY, then
/// LIMIT/OFFSET for bounded listings.
fn list_query(filter: &ListFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = select_prefix();

    if !filter.include_deleted {
        qb.push(" WHERE deleted_at IS NULL");
    }

    if !filter.order_by.is_empty() {
        qb.push(" ORDER BY ").push(&filter.order_by);
    }

    if let Some((limit, offset)) = filter.window() {
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
    }
    qb
}

fn insert_query(job: &Job) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("INSERT INTO ");
    qb.push(JOBS_TABLE)
        .push(" (id, title, description, owner_id, price, created_at, from_date, to_date) ");
    qb.push_values(std::iter::once(job.clone()), |mut row, job| {
        row.push_bind(job.id)
            .push_bind(job.title)
            .push_bind(job.description)
            .push_bind(job.owner_id)
            .push_bind(job.price)
            .push_bind(job.created_at)
            .push_bind(job.from_date)
            .push_bind(job.to_date);
    });
    qb
}

fn update_query(job: &Job) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(JOBS_TABLE).push(" SET ");
    {
        let mut set = qb.separated(", ");
        set.push("title = ").push_bind_unseparated(job.title.clone());
        set.push("description = ")
            .push_bind_unseparated(job.description.clone());
        set.push("owner_id = ").push_bind_unseparated(job.owner_id.clone());
        set.push("price = ").push_bind_unseparated(job.price);
        set.push("from_date = ").push_bind_unseparated(job.from_date.clone());
        set.push("to_date = ").push_bind_unseparated(job.to_date.clone());
        set.push("updated_at = ").push_bind_unseparated(Utc::now());
    }
    qb.push(" WHERE id = ").push_bind(job.id.clone());
    qb
}

fn soft_delete_query(field: JobColumn, value: &str) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(JOBS_TABLE)
        .push(" SET deleted_at = ")
        .push_bind(Utc::now())
        .push(" WHERE ")
        .push(field.as_str())
        .push(" = ")
        .push_bind(value.to_owned());
    qb
}

fn job_from_row(row: &PgRow) -> Result<Job, sqlx::Error> {
    Ok(Job {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        owner_id: row.try_get("owner_id")?,
        price: row.try_get("price")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
        from_date: row.try_get("from_date")?,
        to_date: row.try_get("to_date")?,
    })
}

// ---------------------------------------------------------------------------
// JobRepository
// ---------------------------------------------------------------------------

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        let span = debug_span!("job_repo", op = "create", id = %job.id);
        insert_query(job)
            .build()
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(job.clone())
    }

    async fn get(&self, field: JobColumn, value: &str) -> Result<Job, RepositoryError> {
        let span = debug_span!("job_repo", op = "get", field = %field);
        let row = get_query(field, value)
            .build()
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        match row {
            Some(row) => Ok(job_from_row(&row)?),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Job>, RepositoryError> {
        let span = debug_span!(
            "job_repo",
            op = "list",
            page = filter.page,
            limit = filter.limit,
            include_deleted = filter.include_deleted,
        );
        let rows = list_query(filter)
            .build()
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;
        rows.iter()
            .map(|row| job_from_row(row).map_err(RepositoryError::from))
            .collect()
    }

    async fn update(&self, job: &Job) -> Result<(), RepositoryError> {
        let span = debug_span!("job_repo", op = "update", id = %job.id);
        let result = update_query(job)
            .build()
            .execute(&self.pool)
            .instrument(span)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, field: JobColumn, value: &str) -> Result<(), RepositoryError> {
        let span = debug_span!("job_repo", op = "soft_delete", field = %field);
        soft_delete_query(field, value)
            .build()
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!("jobs table ready");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

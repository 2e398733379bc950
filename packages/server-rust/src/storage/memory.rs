//! In-memory [`JobRepository`] backed by [`DashMap`].
//!
//! Mirrors the `PostgreSQL` repository's contract, including soft deletes and
//! ordering semantics (`NULL` timestamps sort after all values ascending).
//! Used by the `memory` storage backend and by tests.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jobboard_core::{Job, JobColumn, ListFilter, OrderBy, SortDirection};

use super::repository::{JobRepository, RepositoryError};

/// Stored row: insertion sequence plus the job itself.
#[derive(Debug, Clone)]
struct Row {
    seq: u64,
    job: Job,
}

/// Job repository held entirely in memory.
pub struct InMemoryJobRepository {
    rows: DashMap<String, Row>,
    next_seq: AtomicU64,
}

impl InMemoryJobRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Number of stored rows, including soft-deleted ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Snapshot of the rows in insertion order.
    fn snapshot(&self) -> Vec<Row> {
        let mut rows: Vec<Row> = self.rows.iter().map(|r| r.value().clone()).collect();
        rows.sort_by_key(|r| r.seq);
        rows
    }
}

impl Default for InMemoryJobRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(job: &Job, field: JobColumn, value: &str) -> bool {
    field.text_value(job) == Some(value)
}

/// Orders two optional values the way `PostgreSQL` does by default: `NULL`
/// is larger than any value.
fn cmp_nullable<T: Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_column(a: &Job, b: &Job, column: JobColumn) -> Ordering {
    match column {
        JobColumn::Price => a.price.total_cmp(&b.price),
        JobColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        JobColumn::UpdatedAt => cmp_nullable(a.updated_at.as_ref(), b.updated_at.as_ref()),
        JobColumn::DeletedAt => cmp_nullable(a.deleted_at.as_ref(), b.deleted_at.as_ref()),
        text => text.text_value(a).cmp(&text.text_value(b)),
    }
}

fn cmp_jobs(a: &Job, b: &Job, order_by: &OrderBy) -> Ordering {
    order_by
        .terms()
        .iter()
        .map(|term| {
            let ord = cmp_column(a, b, term.column);
            match term.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        match self.rows.entry(job.id.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::Storage(anyhow::anyhow!(
                "duplicate key value violates unique constraint: id={}",
                job.id
            ))),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, AtomicOrdering::Relaxed);
                slot.insert(Row {
                    seq,
                    job: job.clone(),
                });
                Ok(job.clone())
            }
        }
    }

    async fn get(&self, field: JobColumn, value: &str) -> Result<Job, RepositoryError> {
        self.snapshot()
            .into_iter()
            .map(|r| r.job)
            .find(|job| !job.is_deleted() && matches(job, field, value))
            .ok_or(RepositoryError::NotFound)
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Job>, RepositoryError> {
        let mut jobs: Vec<Job> = self
            .snapshot()
            .into_iter()
            .map(|r| r.job)
            .filter(|job| filter.include_deleted || !job.is_deleted())
            .collect();

        // Stable sort keeps insertion order among equal keys.
        jobs.sort_by(|a, b| cmp_jobs(a, b, &filter.order_by));

        if let Some((limit, offset)) = filter.window() {
            let offset = usize::try_from(offset).unwrap_or(usize::MAX);
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            jobs = jobs.into_iter().skip(offset).take(limit).collect();
        }
        Ok(jobs)
    }

    async fn update(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut row = self.rows.get_mut(&job.id).ok_or(RepositoryError::NotFound)?;
        let stored = &mut row.job;
        stored.title.clone_from(&job.title);
        stored.description.clone_from(&job.description);
        stored.owner_id.clone_from(&job.owner_id);
        stored.price = job.price;
        stored.from_date.clone_from(&job.from_date);
        stored.to_date.clone_from(&job.to_date);
        stored.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete(&self, field: JobColumn, value: &str) -> Result<(), RepositoryError> {
        let now = Utc::now();
        for mut row in self.rows.iter_mut() {
            if matches(&row.job, field, value) {
                row.job.deleted_at = Some(now);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

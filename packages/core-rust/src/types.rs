use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A posted job listing. The aggregate root of the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque identifier, assigned before the record is first stored.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Reference to an external owner. Not validated locally.
    pub owner_id: String,
    pub price: f64,
    /// Free-form date string; callers own its format.
    pub from_date: String,
    /// Free-form date string; callers own its format.
    pub to_date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Presence marks the record as soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Generates a fresh identifier for a job that has not been stored yet.
    #[must_use]
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Whether the record has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Checks the structural invariants that hold for every stored job.
    ///
    /// # Errors
    ///
    /// Returns `InvalidJob::Price` when the price is negative or not finite.
    pub fn validate(&self) -> Result<(), InvalidJob> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(InvalidJob::Price(self.price));
        }
        Ok(())
    }
}

impl Default for Job {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            owner_id: String::new(),
            price: 0.0,
            from_date: String::new(),
            to_date: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: None,
            deleted_at: None,
        }
    }
}

/// A job that violates one of the entity invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidJob {
    #[error("price must be a finite, non-negative number, got {0}")]
    Price(f64),
}

// ---------------------------------------------------------------------------
// JobColumn
// ---------------------------------------------------------------------------

/// Columns of the `jobs` table.
///
/// This is the only source of identifiers that may reach a query string:
/// lookups and sort expressions are parsed into `JobColumn` values first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobColumn {
    Id,
    Title,
    Description,
    OwnerId,
    Price,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    FromDate,
    ToDate,
}

impl JobColumn {
    /// All columns in projection order.
    pub const ALL: [JobColumn; 10] = [
        JobColumn::Id,
        JobColumn::Title,
        JobColumn::Description,
        JobColumn::OwnerId,
        JobColumn::Price,
        JobColumn::CreatedAt,
        JobColumn::UpdatedAt,
        JobColumn::DeletedAt,
        JobColumn::FromDate,
        JobColumn::ToDate,
    ];

    /// The column name as it appears in SQL.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Description => "description",
            Self::OwnerId => "owner_id",
            Self::Price => "price",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::DeletedAt => "deleted_at",
            Self::FromDate => "from_date",
            Self::ToDate => "to_date",
        }
    }

    /// Text columns can be matched against a caller-supplied string value.
    #[must_use]
    pub fn is_lookup_key(self) -> bool {
        matches!(
            self,
            Self::Id | Self::Title | Self::Description | Self::OwnerId | Self::FromDate | Self::ToDate
        )
    }

    /// Parses a column name and checks that it can be used as a lookup key.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` for names outside the table, and
    /// `NotALookupKey` for non-text columns.
    pub fn lookup_key(name: &str) -> Result<Self, ColumnError> {
        let column: Self = name.parse()?;
        if column.is_lookup_key() {
            Ok(column)
        } else {
            Err(ColumnError::NotALookupKey(column.as_str()))
        }
    }

    /// Reads this column's value from a job as text, for lookup matching.
    ///
    /// Returns `None` for non-text columns.
    #[must_use]
    pub fn text_value(self, job: &Job) -> Option<&str> {
        match self {
            Self::Id => Some(&job.id),
            Self::Title => Some(&job.title),
            Self::Description => Some(&job.description),
            Self::OwnerId => Some(&job.owner_id),
            Self::FromDate => Some(&job.from_date),
            Self::ToDate => Some(&job.to_date),
            Self::Price | Self::CreatedAt | Self::UpdatedAt | Self::DeletedAt => None,
        }
    }
}

impl fmt::Display for JobColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobColumn {
    type Err = ColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ColumnError::UnknownColumn(name.to_string()))
    }
}

/// A caller-supplied column name that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnError {
    #[error("unknown column: {0:?}")]
    UnknownColumn(String),
    #[error("column {0} cannot be used as a lookup key")]
    NotALookupKey(&'static str),
}

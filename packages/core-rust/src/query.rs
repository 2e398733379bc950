//! List filtering and ordering.
//!
//! Sort expressions arrive from callers as raw text (`"price desc, title"`).
//! They are parsed here against the [`JobColumn`] allow-list so that storage
//! backends only ever see typed columns and directions.

use std::fmt;
use std::str::FromStr;

use crate::types::{ColumnError, JobColumn};

/// Sort direction for a single ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One `column [ASC|DESC]` item of a sort expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: JobColumn,
    pub direction: SortDirection,
}

/// A parsed, validated sort expression. Empty means "storage order".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderBy {
    terms: Vec<OrderTerm>,
}

impl OrderBy {
    #[must_use]
    pub fn new(terms: Vec<OrderTerm>) -> Self {
        Self { terms }
    }

    /// Single ascending term on `column`.
    #[must_use]
    pub fn asc(column: JobColumn) -> Self {
        Self::new(vec![OrderTerm {
            column,
            direction: SortDirection::Asc,
        }])
    }

    #[must_use]
    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl FromStr for OrderBy {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut terms = Vec::new();
        for item in s.split(',') {
            let mut words = item.split_whitespace();
            let column = words
                .next()
                .ok_or_else(|| FilterError::InvalidOrderBy(s.to_string()))?
                .parse::<JobColumn>()?;
            let direction = match words.next() {
                None => SortDirection::Asc,
                Some(w) if w.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                Some(w) if w.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                Some(_) => return Err(FilterError::InvalidOrderBy(s.to_string())),
            };
            if words.next().is_some() {
                return Err(FilterError::InvalidOrderBy(s.to_string()));
            }
            terms.push(OrderTerm { column, direction });
        }
        Ok(Self { terms })
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", term.column, term.direction.as_sql())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ListFilter
// ---------------------------------------------------------------------------

/// Describes one page of a job listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListFilter {
    /// 1-based page number. Ignored when `limit` is 0.
    pub page: u64,
    /// Page size. 0 means unbounded.
    pub limit: u64,
    pub order_by: OrderBy,
    pub include_deleted: bool,
}

impl ListFilter {
    /// Builds a filter, rejecting page 0 for bounded listings.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidPage` when `limit > 0` and `page == 0`.
    pub fn new(
        page: u64,
        limit: u64,
        order_by: OrderBy,
        include_deleted: bool,
    ) -> Result<Self, FilterError> {
        if limit > 0 && page == 0 {
            return Err(FilterError::InvalidPage);
        }
        Ok(Self {
            page,
            limit,
            order_by,
            include_deleted,
        })
    }

    /// Row offset of the first record on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// `Some((limit, offset))` for bounded listings.
    #[must_use]
    pub fn window(&self) -> Option<(u64, u64)> {
        (self.limit != 0).then(|| (self.limit, self.offset()))
    }
}

/// A list request that cannot be turned into a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("page must be >= 1 when limit is set")]
    InvalidPage,
    #[error("malformed order_by expression: {0:?}")]
    InvalidOrderBy(String),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_order_by_parses_to_no_terms() {
        assert!("".parse::<OrderBy>().unwrap().is_empty());
        assert!("   ".parse::<OrderBy>().unwrap().is_empty());
    }

    #[test]
    fn order_by_parses_multiple_terms() {
        let order: OrderBy = "price DESC, title".parse().unwrap();
        assert_eq!(
            order.terms(),
            &[
                OrderTerm {
                    column: JobColumn::Price,
                    direction: SortDirection::Desc
                },
                OrderTerm {
                    column: JobColumn::Title,
                    direction: SortDirection::Asc
                },
            ]
        );
        assert_eq!(order.to_string(), "price DESC, title ASC");
    }

    #[test]
    fn order_by_rejects_injection_attempts() {
        assert!("title; DELETE FROM jobs".parse::<OrderBy>().is_err());
        assert!("title desc nulls".parse::<OrderBy>().is_err());
        assert!("title sideways".parse::<OrderBy>().is_err());
        assert!("title,".parse::<OrderBy>().is_err());
        assert!(matches!(
            "salary".parse::<OrderBy>(),
            Err(FilterError::Column(ColumnError::UnknownColumn(_)))
        ));
    }

    #[test]
    fn page_zero_with_limit_is_rejected() {
        assert_eq!(
            ListFilter::new(0, 10, OrderBy::default(), false),
            Err(FilterError::InvalidPage)
        );
        // Unbounded listings ignore the page.
        assert!(ListFilter::new(0, 0, OrderBy::default(), false).is_ok());
    }

    #[test]
    fn unbounded_filter_has_no_window() {
        let filter = ListFilter::new(3, 0, OrderBy::default(), false).unwrap();
        assert_eq!(filter.window(), None);
    }

    proptest! {
        #[test]
        fn offset_is_page_minus_one_times_limit(page in 1u64..10_000, limit in 1u64..1_000) {
            let filter = ListFilter::new(page, limit, OrderBy::default(), false).unwrap();
            prop_assert_eq!(filter.window(), Some((limit, (page - 1) * limit)));
        }

        #[test]
        fn consecutive_pages_do_not_overlap(page in 1u64..10_000, limit in 1u64..1_000) {
            let this = ListFilter::new(page, limit, OrderBy::default(), false).unwrap();
            let next = ListFilter::new(page + 1, limit, OrderBy::default(), false).unwrap();
            prop_assert_eq!(this.offset() + limit, next.offset());
        }
    }
}

//! Job service core: the `Job` entity, list filters, and wire message schemas.

pub mod messages;
pub mod query;
pub mod types;

pub use messages::{Empty, GetListFilter, JobList, JobMessage, JobRequest};
pub use query::{FilterError, ListFilter, OrderBy, OrderTerm, SortDirection};
pub use types::{ColumnError, InvalidJob, Job, JobColumn};


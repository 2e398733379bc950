//! The job RPC facade.
//!
//! Translates wire messages into domain values, calls the [`JobService`],
//! and turns the outcome back into a wire message or an [`RpcStatus`].

use std::sync::Arc;

use jobboard_core::{
    Empty, GetListFilter, Job, JobColumn, JobList, JobMessage, JobRequest, ListFilter, OrderBy,
};
use tracing::{debug, error, instrument};

use super::status::RpcStatus;
use crate::service::{JobError, JobService};

/// Stateless per-call adapter between the RPC surface and the domain service.
#[derive(Clone)]
pub struct JobRpc {
    service: Arc<dyn JobService>,
}

impl JobRpc {
    #[must_use]
    pub fn new(service: Arc<dyn JobService>) -> Self {
        Self { service }
    }

    /// Creates a job with a freshly generated id and echoes the request back
    /// with `id` and `created_at` filled in.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` for an invalid price, otherwise whatever the
    /// service reports.
    #[instrument(name = "job_rpc", skip_all, fields(method = "Create"))]
    pub async fn create(&self, req: JobMessage) -> Result<JobMessage, RpcStatus> {
        let job = Job {
            id: Job::generate_id(),
            ..req.to_job()
        };
        job.validate()
            .map_err(|e| fail("create job", &JobError::from(e)))?;

        let stored = self
            .service
            .create(job)
            .await
            .map_err(|e| fail("create job", &e))?;

        Ok(JobMessage {
            id: stored.id,
            created_at: stored.created_at.to_rfc3339(),
            ..req
        })
    }

    /// Overwrites the mutable fields of the job named by `req.id` and echoes
    /// the request. The stored `created_at` is left untouched.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` when `id` is empty or the price is invalid,
    /// `NOT_FOUND` when no job has that id.
    #[instrument(name = "job_rpc", skip_all, fields(method = "Update"))]
    pub async fn update(&self, req: JobMessage) -> Result<JobMessage, RpcStatus> {
        if req.id.is_empty() {
            return Err(fail(
                "update job",
                &JobError::InvalidArgument("id is required".to_string()),
            ));
        }
        let job = req.to_job();
        job.validate()
            .map_err(|e| fail("update job", &JobError::from(e)))?;

        self.service
            .update(&job)
            .await
            .map_err(|e| fail("update job", &e))?;
        Ok(req)
    }

    /// Returns the first live job whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` for a field that is not a lookup key, `NOT_FOUND`
    /// when nothing matches.
    #[instrument(name = "job_rpc", skip_all, fields(method = "Get"))]
    pub async fn get(&self, req: JobRequest) -> Result<JobMessage, RpcStatus> {
        let field = lookup_field("get job", &req.field)?;
        let job = self
            .service
            .get(field, &req.value)
            .await
            .map_err(|e| fail("get job", &e))?;
        Ok(JobMessage::from(&job))
    }

    /// Soft-deletes every job whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` for a field that is not a lookup key.
    #[instrument(name = "job_rpc", skip_all, fields(method = "Delete"))]
    pub async fn delete(&self, req: JobRequest) -> Result<Empty, RpcStatus> {
        let field = lookup_field("delete job", &req.field)?;
        self.service
            .delete(field, &req.value)
            .await
            .map_err(|e| fail("delete job", &e))?;
        Ok(Empty {})
    }

    /// Returns one page of jobs.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` for a malformed `order_by` or page 0 with a limit.
    #[instrument(name = "job_rpc", skip_all, fields(method = "GetList"))]
    pub async fn get_list(&self, req: GetListFilter) -> Result<JobList, RpcStatus> {
        let filter = list_filter(&req).map_err(|e| fail("list jobs", &e))?;
        let jobs = self
            .service
            .list(&filter)
            .await
            .map_err(|e| fail("list jobs", &e))?;

        let jobs: Vec<JobMessage> = jobs.iter().map(JobMessage::from).collect();
        Ok(JobList {
            count: jobs.len() as u64,
            jobs,
        })
    }
}

fn lookup_field(action: &str, name: &str) -> Result<JobColumn, RpcStatus> {
    JobColumn::lookup_key(name).map_err(|e| fail(action, &JobError::from(e)))
}

fn list_filter(req: &GetListFilter) -> Result<ListFilter, JobError> {
    let order_by: OrderBy = req.order_by.parse()?;
    Ok(ListFilter::new(
        req.page,
        req.limit,
        order_by,
        req.include_deleted,
    )?)
}

/// Logs a failed call and converts it into the status returned to the caller.
fn fail(action: &str, err: &JobError) -> RpcStatus {
    match err {
        JobError::NotFound | JobError::InvalidArgument(_) => {
            debug!(error = %err, "failed to {action}");
        }
        JobError::Timeout { .. } | JobError::Storage(_) => {
            error!(error = %err, "failed to {action}");
        }
    }
    RpcStatus::from_job_error(action, err)
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::rpc::RpcCode;
    use crate::service::{JobUseCase, ServiceConfig};
    use crate::storage::InMemoryJobRepository;

    fn rpc() -> JobRpc {
        let repo = Arc::new(InMemoryJobRepository::new());
        JobRpc::new(Arc::new(JobUseCase::new(&ServiceConfig::default(), repo)))
    }

    fn message(title: &str, price: f64) -> JobMessage {
        JobMessage {
            title: title.to_string(),
            description: "Weekend cover".to_string(),
            owner_id: "owner-7".to_string(),
            price,
            from_date: "2024-03-01".to_string(),
            to_date: "2024-03-03".to_string(),
            ..JobMessage::default()
        }
    }

    fn by_id(id: &str) -> JobRequest {
        JobRequest {
            field: "id".to_string(),
            value: id.to_string(),
        }
    }

    #[tokio::test]
    async fn create_echoes_request_with_generated_id() {
        let rpc = rpc();
        let req = message("Bartender", 25.0);

        let created = rpc.create(req.clone()).await.unwrap();

        assert!(!created.id.is_empty());
        assert!(DateTime::parse_from_rfc3339(&created.created_at).is_ok());
        assert_eq!(created.title, req.title);
        assert_eq!(created.from_date, req.from_date);
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_id() {
        let rpc = rpc();
        let req = JobMessage {
            id: "client-chosen".to_string(),
            ..message("Bartender", 25.0)
        };
        let created = rpc.create(req).await.unwrap();
        assert_ne!(created.id, "client-chosen");
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let rpc = rpc();
        let created = rpc.create(message("Bartender", 25.0)).await.unwrap();

        let fetched = rpc.get(by_id(&created.id)).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, "Bartender");
        assert_eq!(fetched.owner_id, "owner-7");
        assert!((fetched.price - 25.0).abs() < f64::EPSILON);
        assert_eq!(fetched.updated_at, "");
    }

    #[tokio::test]
    async fn negative_price_is_invalid_argument() {
        let err = rpc().create(message("Bartender", -3.0)).await.unwrap_err();
        assert_eq!(err.code, RpcCode::InvalidArgument);
        assert!(err.message.starts_with("failed to create job"));
    }

    #[tokio::test]
    async fn update_requires_id() {
        let err = rpc().update(message("Bartender", 1.0)).await.unwrap_err();
        assert_eq!(err.code, RpcCode::InvalidArgument);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let req = JobMessage {
            id: "missing".to_string(),
            ..message("Bartender", 1.0)
        };
        let err = rpc().update(req).await.unwrap_err();
        assert_eq!(err.code, RpcCode::NotFound);
    }

    #[tokio::test]
    async fn update_changes_fields_but_keeps_created_at() {
        let rpc = rpc();
        let created = rpc.create(message("Bartender", 25.0)).await.unwrap();

        let edit = JobMessage {
            title: "Head bartender".to_string(),
            price: 30.0,
            ..created.clone()
        };
        let echoed = rpc.update(edit.clone()).await.unwrap();
        assert_eq!(echoed, edit);

        let fetched = rpc.get(by_id(&created.id)).await.unwrap();
        assert_eq!(fetched.title, "Head bartender");
        assert_eq!(fetched.created_at, created.created_at);
        assert!(!fetched.updated_at.is_empty());
    }

    #[tokio::test]
    async fn get_missing_job_is_not_found() {
        let err = rpc().get(by_id("nope")).await.unwrap_err();
        assert_eq!(err.code, RpcCode::NotFound);
    }

    #[tokio::test]
    async fn unknown_or_non_text_field_is_rejected() {
        let rpc = rpc();
        for field in ["salary", "price", "id; DROP TABLE jobs"] {
            let req = JobRequest {
                field: field.to_string(),
                value: "x".to_string(),
            };
            assert_eq!(
                rpc.get(req.clone()).await.unwrap_err().code,
                RpcCode::InvalidArgument
            );
            assert_eq!(
                rpc.delete(req).await.unwrap_err().code,
                RpcCode::InvalidArgument
            );
        }
    }

    #[tokio::test]
    async fn delete_hides_job_and_is_idempotent() {
        let rpc = rpc();
        let created = rpc.create(message("Bartender", 25.0)).await.unwrap();

        rpc.delete(by_id(&created.id)).await.unwrap();
        rpc.delete(by_id(&created.id)).await.unwrap();

        assert_eq!(
            rpc.get(by_id(&created.id)).await.unwrap_err().code,
            RpcCode::NotFound
        );

        let all = rpc
            .get_list(GetListFilter {
                include_deleted: true,
                ..GetListFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(all.count, 1);
    }

    #[tokio::test]
    async fn get_list_orders_and_counts() {
        let rpc = rpc();
        for (title, price) in [("A", 10.0), ("B", 30.0), ("C", 20.0)] {
            rpc.create(message(title, price)).await.unwrap();
        }

        let page = rpc
            .get_list(GetListFilter {
                page: 1,
                limit: 2,
                order_by: "price desc".to_string(),
                include_deleted: false,
            })
            .await
            .unwrap();

        assert_eq!(page.count, 2);
        let titles: Vec<_> = page.jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, ["B", "C"]);
    }

    #[tokio::test]
    async fn get_list_rejects_bad_filters() {
        let rpc = rpc();
        let bad_order = GetListFilter {
            order_by: "price; DROP TABLE jobs".to_string(),
            ..GetListFilter::default()
        };
        assert_eq!(
            rpc.get_list(bad_order).await.unwrap_err().code,
            RpcCode::InvalidArgument
        );

        let page_zero = GetListFilter {
            page: 0,
            limit: 5,
            ..GetListFilter::default()
        };
        assert_eq!(
            rpc.get_list(page_zero).await.unwrap_err().code,
            RpcCode::InvalidArgument
        );
    }
}

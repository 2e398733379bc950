//! Network module with deferred startup lifecycle.
//!
//! `new()` creates shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until shutdown. Components are attached
//! between `new()` and `serve()`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::jobs::{self, JobsState};
use super::handlers::{events, health_handler, liveness_handler, readiness_handler, AppState};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::ingest::BrokerPublisher;
use crate::rpc::JobRpc;

/// Upper bound on waiting for admitted RPC calls after shutdown begins.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the HTTP listener and the routes mounted on it.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    rpc: Option<JobRpc>,
    events: Option<BrokerPublisher>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
            rpc: None,
            events: None,
        }
    }

    /// Mounts the job RPC endpoints.
    #[must_use]
    pub fn with_rpc(mut self, rpc: JobRpc) -> Self {
        self.rpc = Some(rpc);
        self
    }

    /// Mounts the event ingestion endpoint.
    #[must_use]
    pub fn with_events(mut self, publisher: BrokerPublisher) -> Self {
        self.events = Some(publisher);
        self
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health`, `GET /health/live`, `GET /health/ready`
    /// - `POST /rpc/job.JobService/{Create,Update,Get,Delete,GetList}` (with RPC)
    /// - `POST /events/{topic}` (with events)
    pub fn build_router(&self) -> Router {
        let state = AppState {
            shutdown: Arc::clone(&self.shutdown),
            rpc_enabled: self.rpc.is_some(),
            ingest_enabled: self.events.is_some(),
            start_time: Instant::now(),
        };

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .with_state(state);

        if let Some(rpc) = &self.rpc {
            router = router.merge(jobs::routes(JobsState {
                rpc: rpc.clone(),
                shutdown: Arc::clone(&self.shutdown),
            }));
        }
        if let Some(publisher) = &self.events {
            router = router.merge(events::routes(publisher.clone()));
        }

        router
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(build_http_layers(&self.config))
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured
    /// port when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then drains admitted RPC calls.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let router = self.build_router();
        let shutdown_ctrl = self.shutdown;

        shutdown_ctrl.set_ready();
        info!("Serving HTTP connections");

        let signal_ctrl = Arc::clone(&shutdown_ctrl);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                signal_ctrl.trigger_shutdown();
            })
            .await?;

        if shutdown_ctrl.wait_for_drain(DRAIN_TIMEOUT).await {
            info!("All in-flight requests drained");
        } else {
            warn!(
                in_flight = shutdown_ctrl.in_flight_count(),
                "Drain timeout expired with in-flight requests remaining"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use jobboard_core::{Job, JobColumn, ListFilter};
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tower::ServiceExt;

    use super::*;
    use crate::ingest::MemoryBroker;
    use crate::network::HealthState;
    use crate::service::{JobUseCase, ServiceConfig};
    use crate::storage::{InMemoryJobRepository, JobRepository, RepositoryError};

    /// Delays every call by `delay`, or never answers when `delay` is `None`.
    struct StalledRepository {
        delay: Option<Duration>,
        inner: InMemoryJobRepository,
    }

    impl StalledRepository {
        fn new(delay: Option<Duration>) -> Self {
            Self {
                delay,
                inner: InMemoryJobRepository::new(),
            }
        }

        async fn stall(&self) {
            match self.delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        }
    }

    #[async_trait]
    impl JobRepository for StalledRepository {
        async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
            self.stall().await;
            self.inner.create(job).await
        }

        async fn get(&self, field: JobColumn, value: &str) -> Result<Job, RepositoryError> {
            self.stall().await;
            self.inner.get(field, value).await
        }

        async fn list(&self, filter: &ListFilter) -> Result<Vec<Job>, RepositoryError> {
            self.stall().await;
            self.inner.list(filter).await
        }

        async fn update(&self, job: &Job) -> Result<(), RepositoryError> {
            self.stall().await;
            self.inner.update(job).await
        }

        async fn delete(&self, field: JobColumn, value: &str) -> Result<(), RepositoryError> {
            self.stall().await;
            self.inner.delete(field, value).await
        }
    }

    fn rpc_over(repo: StalledRepository, context_timeout_ms: u64) -> JobRpc {
        let config = ServiceConfig { context_timeout_ms };
        JobRpc::new(Arc::new(JobUseCase::new(&config, Arc::new(repo))))
    }

    fn test_config() -> NetworkConfig {
        NetworkConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..NetworkConfig::default()
        }
    }

    fn test_rpc() -> JobRpc {
        let repo = Arc::new(InMemoryJobRepository::new());
        JobRpc::new(Arc::new(JobUseCase::new(&ServiceConfig::default(), repo)))
    }

    async fn status_of(router: Router, method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[test]
    fn shutdown_controller_returns_shared_arc() {
        let module = NetworkModule::new(test_config());
        let s1 = module.shutdown_controller();
        let s2 = module.shutdown_controller();
        assert!(Arc::ptr_eq(&s1, &s2));
    }

    #[tokio::test]
    async fn rpc_routes_are_mounted_only_with_rpc() {
        let bare = NetworkModule::new(test_config()).build_router();
        assert_eq!(
            status_of(bare, "POST", "/rpc/job.JobService/GetList").await,
            StatusCode::NOT_FOUND
        );

        let with_rpc = NetworkModule::new(test_config())
            .with_rpc(test_rpc())
            .build_router();
        assert_eq!(
            status_of(with_rpc, "POST", "/rpc/job.JobService/GetList").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn event_route_is_mounted_only_with_events() {
        let bare = NetworkModule::new(test_config()).build_router();
        assert_eq!(
            status_of(bare, "POST", "/events/jobs").await,
            StatusCode::NOT_FOUND
        );

        let broker = MemoryBroker::new(4);
        let with_events = NetworkModule::new(test_config())
            .with_events(broker.publisher())
            .build_router();
        assert_eq!(
            status_of(with_events, "POST", "/events/jobs").await,
            StatusCode::ACCEPTED
        );
    }

    #[tokio::test]
    async fn stalled_storage_surfaces_deadline_exceeded() {
        let config = NetworkConfig {
            request_timeout_ms: 2_000,
            ..test_config()
        };
        let router = NetworkModule::new(config)
            .with_rpc(rpc_over(StalledRepository::new(None), 50))
            .build_router();

        let request = Request::post("/rpc/job.JobService/Get")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"field":"id","value":"j-1"}"#))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "DEADLINE_EXCEEDED");
    }

    #[tokio::test]
    async fn oversized_event_body_is_413() {
        let config = NetworkConfig {
            max_body_bytes: 16,
            ..test_config()
        };
        let broker = MemoryBroker::new(4);
        let router = NetworkModule::new(config)
            .with_events(broker.publisher())
            .build_router();

        let request = Request::post("/events/jobs")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let router = NetworkModule::new(test_config()).build_router();
        let response = router
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = NetworkModule::new(test_config());
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0, "OS-assigned port should be > 0");
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    async fn serve_without_start_is_an_error() {
        let module = NetworkModule::new(test_config());
        let err = module.serve(std::future::pending::<()>()).await.unwrap_err();
        assert!(err.to_string().contains("start()"));
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let mut module = NetworkModule::new(test_config()).with_rpc(test_rpc());
        module.start().await.unwrap();
        let ctrl = module.shutdown_controller();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(module.serve(async move {
            let _ = rx.await;
        }));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ctrl.health_state(), HealthState::Ready);

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert_eq!(ctrl.health_state(), HealthState::Stopped);
    }

    #[tokio::test]
    async fn admitted_call_completes_after_shutdown_begins() {
        let repo = StalledRepository::new(Some(Duration::from_millis(300)));
        let mut module = NetworkModule::new(test_config()).with_rpc(rpc_over(repo, 5_000));
        let port = module.start().await.unwrap();
        let ctrl = module.shutdown_controller();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(module.serve(async move {
            let _ = rx.await;
        }));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream
            .write_all(
                b"POST /rpc/job.JobService/GetList HTTP/1.1\r\n\
                  Host: localhost\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 2\r\n\
                  Connection: close\r\n\r\n{}",
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ctrl.in_flight_count(), 1);
        tx.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!ctrl.is_accepting());

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let response = String::from_utf8_lossy(&response);
        assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");

        server.await.unwrap().unwrap();
        assert_eq!(ctrl.in_flight_count(), 0);
        assert_eq!(ctrl.health_state(), HealthState::Stopped);
    }
}

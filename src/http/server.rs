//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build backend clients and the cache store from configuration
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeouts, body limits, metrics)
//! - Serve until shutdown, then drain the background queue

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, MatchedPath};
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::backend::{
    FeedbackSink, HttpFeedbackSink, HttpSchedulerService, HttpUserService, HttpVideoService,
    RpcClient, SchedulerService, UserService, VideoService,
};
use crate::background::{TaskQueue, TaskWorker};
use crate::cache::{CacheStore, MemoryStore, NullStore, RedisStore, ResponseCache};
use crate::config::GatewayConfig;
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::{session, upload, users, videos};
use crate::lifecycle::{shutdown, Shutdown};
use crate::observability::metrics;
use crate::upload::UploadBridge;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub video: Arc<dyn VideoService>,
    pub users: Arc<dyn UserService>,
    pub scheduler: Arc<dyn SchedulerService>,
    pub feedback: Option<Arc<dyn FeedbackSink>>,
    pub cache: ResponseCache,
    pub bridge: UploadBridge,
    pub tasks: TaskQueue,
}

/// The services the gateway fronts.
#[derive(Clone)]
pub struct Backends {
    pub video: Arc<dyn VideoService>,
    pub users: Arc<dyn UserService>,
    pub scheduler: Arc<dyn SchedulerService>,
    pub feedback: Option<Arc<dyn FeedbackSink>>,
}

/// Failures while assembling the server.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid {service} backend url: {source}")]
    BackendUrl {
        service: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

impl Backends {
    /// HTTP clients for every configured backend, sharing one connection pool.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;
        let call_timeout = Duration::from_secs(config.timeouts.backend_call_secs);

        let rpc = |service: &'static str, url: &str| {
            RpcClient::new(client.clone(), url, service, call_timeout)
                .map_err(|source| StartupError::BackendUrl { service, source })
        };

        let feedback = config.background.feedback_url.as_deref().map(|url| {
            Arc::new(HttpFeedbackSink::new(
                client.clone(),
                url,
                config.background.feedback_api_key.clone(),
                call_timeout,
            )) as Arc<dyn FeedbackSink>
        });

        Ok(Self {
            video: Arc::new(HttpVideoService::new(rpc("video", &config.backends.video_url)?)),
            users: Arc::new(HttpUserService::new(rpc("user", &config.backends.user_url)?)),
            scheduler: Arc::new(HttpSchedulerService::new(rpc(
                "scheduler",
                &config.backends.scheduler_url,
            )?)),
            feedback,
        })
    }
}

/// Pick the cache store: redis when configured and reachable, otherwise
/// in-process memory. A disabled cache gets the null store.
pub async fn cache_store(config: &GatewayConfig) -> Arc<dyn CacheStore> {
    let cache = &config.cache;
    if !cache.enabled {
        return Arc::new(NullStore);
    }

    if let Some(url) = cache.redis_url.as_deref() {
        match RedisStore::connect(url, &cache.key_prefix).await {
            Ok(store) => {
                tracing::info!(store = "redis", "Response cache ready");
                return Arc::new(store);
            }
            Err(e) => {
                tracing::error!(error = %e, "Redis unavailable, falling back to in-memory cache");
            }
        }
    }

    tracing::info!(store = "memory", max_entries = cache.max_entries, "Response cache ready");
    Arc::new(MemoryStore::new(cache.max_entries))
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    tasks: TaskQueue,
    worker: Option<TaskWorker>,
}

impl HttpServer {
    pub fn new(config: &GatewayConfig, backends: Backends, store: Arc<dyn CacheStore>) -> Self {
        let (tasks, worker) = TaskQueue::new(config.background.queue_capacity);

        let state = AppState {
            video: backends.video,
            users: backends.users,
            scheduler: backends.scheduler,
            feedback: backends.feedback,
            cache: ResponseCache::from_config(store, &config.cache),
            bridge: UploadBridge::new(config.upload.chunk_size),
            tasks: tasks.clone(),
        };

        Self {
            router: Self::build_router(config, state),
            tasks,
            worker: Some(worker),
        }
    }

    /// Build backends and cache store from configuration.
    pub async fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
        let backends = Backends::from_config(config)?;
        let store = cache_store(config).await;
        Ok(Self::new(config, backends, store))
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/health", get(health))
            .route("/videos", get(videos::list_videos))
            .route("/videos/{id}", get(videos::video_detail))
            .route("/users/{id}", get(users::user_profile))
            .route("/comments/{video_id}", get(users::comments))
            .route("/recommendations/{video_id}", get(users::recommendations))
            .route("/archiveevents/{id}", get(users::archive_events))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )));

        let uploads = Router::new()
            .route("/upload", post(upload::upload))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                session::require_session,
            ))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.upload.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.upload_secs,
            )));

        let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = %request_id(req.headers()),
            )
        });

        api.merge(uploads)
            .with_state(state)
            .route_layer(middleware::from_fn(track_metrics))
            .layer(trace)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router. Handy for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Hand out the background worker; the caller becomes responsible for
    /// running it. `run` does this itself.
    pub fn take_worker(&mut self) -> Option<TaskWorker> {
        self.worker.take()
    }

    /// Queue shared with the handlers.
    pub fn task_queue(&self) -> TaskQueue {
        self.tasks.clone()
    }

    /// Run the server, accepting connections on the given listener, until
    /// `shutdown` fires. Returns once in-flight requests have finished and
    /// every background task they queued has run.
    pub async fn run(mut self, listener: TcpListener, shutdown: Shutdown) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let worker = self.take_worker().map(|w| tokio::spawn(w.run()));
        let Self { router, tasks, .. } = self;
        drop(tasks);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown::wait(shutdown.subscribe()))
            .await?;
        tracing::info!("HTTP server stopped");

        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Background worker panicked");
            }
        }
        Ok(())
    }
}

/// `GET /health`
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn track_metrics(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}

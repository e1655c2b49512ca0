pub mod error;
pub mod kinds;
pub mod reconcile;
pub mod routes;
pub mod state;

use anyhow::Context as _;
use axum::routing::get;
use axum::Router;
use futures::StreamExt;
use kinds::WatchedKind;
use kube::api::{Api, DynamicObject};
use kube::runtime::{watcher, Controller};
use kube::Client;
use reconcile::{Context, KubeFetcher};
use rollback_core::clock::SystemClock;
use rollback_core::{remediation, DebounceTracker, RollbackConfig};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the axum Router for the health and introspection endpoints.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route("/readyz", get(routes::health::readyz))
        .route("/api/tracker", get(routes::tracker::get_tracker))
        .route("/api/tracker/{revision}", get(routes::tracker::get_revision))
        .route("/api/config", get(routes::config::get_config))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Serve the health endpoints on a pre-bound listener.
pub async fn serve_on(
    listener: tokio::net::TcpListener,
    app_state: state::AppState,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("health server listening on http://{addr}");
    axum::serve(listener, build_router(app_state)).await?;
    Ok(())
}

/// Runtime settings that are not part of the remediation policy.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Kinds to watch, in the order they are probed for each trigger.
    pub probes: Vec<WatchedKind>,
    pub health_port: u16,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            probes: WatchedKind::ALL.to_vec(),
            health_port: 8081,
        }
    }
}

/// Connect to the cluster and run until the controllers shut down.
///
/// One controller per watched kind; all share a single tracker so a revision
/// is reverted at most once no matter which resource reports it.
pub async fn run(config: RollbackConfig, options: RunOptions) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .context("failed to connect to the Kubernetes API")?;

    let config = Arc::new(config);
    let remediator = remediation::from_config(config.clone())
        .context("failed to build the GitLab client")?;
    let tracker = Arc::new(DebounceTracker::new(remediator, Arc::new(SystemClock)));

    let ctx = Arc::new(Context {
        tracker: tracker.clone(),
        fetcher: Arc::new(KubeFetcher::new(client.clone())),
        probes: options.probes.clone(),
        debounce: config.debounce,
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", options.health_port))
        .await
        .with_context(|| format!("failed to bind health port {}", options.health_port))?;
    let health = serve_on(listener, state::AppState::new(tracker, config.clone()));

    let mut kinds: Vec<WatchedKind> = Vec::new();
    for kind in &options.probes {
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }
    let controllers = futures::future::join_all(
        kinds
            .into_iter()
            .map(|kind| run_controller(client.clone(), kind, ctx.clone())),
    );

    tracing::info!(
        mode = %config.mode,
        debounce_secs = config.debounce.as_secs(),
        kinds = ?options.probes,
        "starting rollback controller"
    );

    tokio::select! {
        res = health => res?,
        _ = controllers => tracing::info!("controllers stopped"),
    }
    Ok(())
}

async fn run_controller(client: Client, kind: WatchedKind, ctx: Arc<Context>) {
    let ar = kind.api_resource();
    let api: Api<DynamicObject> = Api::all_with(client, &ar);

    Controller::new_with(api, watcher::Config::default(), ar)
        .shutdown_on_signal()
        .run(reconcile::reconcile, reconcile::error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, action)) => tracing::debug!(
                    kind = %kind,
                    namespace = obj.namespace.as_deref().unwrap_or_default(),
                    name = %obj.name,
                    ?action,
                    "reconciled"
                ),
                Err(e) => tracing::warn!(kind = %kind, error = %e, "controller error"),
            }
        })
        .await;
}

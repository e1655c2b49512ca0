//! Bridges kube-rs reconcile triggers to the debounce tracker.
//!
//! A trigger only names an object. The adapter probes the configured kinds in
//! order, takes the first one that exists under that name, and hands its
//! observation to the tracker. The tracker's re-check delay becomes the
//! controller's requeue.

use crate::error::{ControllerError, Result};
use crate::kinds::WatchedKind;
use futures::future::BoxFuture;
use kube::api::{Api, DynamicObject};
use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use rollback_core::DebounceTracker;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Requeue delay after a failed Kubernetes API call.
pub const ERROR_REQUEUE: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// ObjectFetcher
// ---------------------------------------------------------------------------

/// Looks up one object of a watched kind. `Ok(None)` means it does not exist.
pub trait ObjectFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        kind: WatchedKind,
        name: &'a str,
        namespace: &'a str,
    ) -> BoxFuture<'a, kube::Result<Option<DynamicObject>>>;
}

pub struct KubeFetcher {
    client: Client,
}

impl KubeFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ObjectFetcher for KubeFetcher {
    fn fetch<'a>(
        &'a self,
        kind: WatchedKind,
        name: &'a str,
        namespace: &'a str,
    ) -> BoxFuture<'a, kube::Result<Option<DynamicObject>>> {
        Box::pin(async move {
            let ar = kind.api_resource();
            let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &ar);
            api.get_opt(name).await
        })
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Shared by every controller and every concurrent reconcile.
pub struct Context {
    pub tracker: Arc<DebounceTracker>,
    pub fetcher: Arc<dyn ObjectFetcher>,
    /// Kinds tried for each trigger, highest priority first.
    pub probes: Vec<WatchedKind>,
    pub debounce: Duration,
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

pub async fn reconcile(obj: Arc<DynamicObject>, ctx: Arc<Context>) -> Result<Action> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();
    reconcile_named(&ctx, &name, &namespace).await
}

/// Evaluate whatever watched object lives at `namespace/name`.
pub async fn reconcile_named(ctx: &Context, name: &str, namespace: &str) -> Result<Action> {
    for kind in &ctx.probes {
        let Some(obj) = ctx.fetcher.fetch(*kind, name, namespace).await? else {
            continue;
        };
        let observation = kind.observe(&obj);
        let delay = ctx.tracker.evaluate(&observation, ctx.debounce).await;
        if !delay.is_zero() {
            debug!(
                kind = %kind,
                namespace,
                name,
                recheck_secs = delay.as_secs(),
                "requeueing"
            );
        }
        return Ok(requeue_after(delay));
    }

    debug!(namespace, name, "no watched object under this name");
    Ok(Action::await_change())
}

/// `Duration::ZERO` means no re-check: wait for the next watch event.
pub fn requeue_after(delay: Duration) -> Action {
    if delay.is_zero() {
        Action::await_change()
    } else {
        Action::requeue(delay)
    }
}

pub fn error_policy(obj: Arc<DynamicObject>, err: &ControllerError, _ctx: Arc<Context>) -> Action {
    warn!(
        name = %obj.name_any(),
        namespace = %obj.namespace().unwrap_or_default(),
        error = %err,
        retry_secs = ERROR_REQUEUE.as_secs(),
        "reconcile failed"
    );
    Action::requeue(ERROR_REQUEUE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

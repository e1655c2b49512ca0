//! Debounce and dedup of failing revisions.
//!
//! Every watched resource check ends in [`DebounceTracker::evaluate`]. The
//! tracker keeps one entry per revision:
//!
//! ```text
//! (absent) ──failing──▶ Pending { first_seen } ──window elapsed──▶ Completed
//!     ▲                        │
//!     └────────ready───────────┘
//! ```
//!
//! `Completed` is terminal for the lifetime of the process, so a revision is
//! remediated at most once. The tracker runs no timers: `evaluate` returns
//! how long the caller should wait before checking again, and
//! `Duration::ZERO` when no further check is needed.

use crate::clock::Clock;
use crate::observation::Observation;
use crate::remediation::{RemediationOutcome, Remediator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

// ---------------------------------------------------------------------------
// RevisionState
// ---------------------------------------------------------------------------

/// Tracking state of one revision. Untracked revisions have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RevisionState {
    /// Failing, waiting for the debounce window to elapse.
    Pending { first_seen: DateTime<Utc> },
    /// Remediation was triggered. Never leaves this state.
    Completed { triggered_at: DateTime<Utc> },
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRevision {
    pub revision: String,
    pub first_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedRevision {
    pub revision: String,
    pub triggered_at: DateTime<Utc>,
}

/// Point-in-time copy of the tracker, sorted by revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackerSnapshot {
    pub pending: Vec<PendingRevision>,
    pub completed: Vec<CompletedRevision>,
}

// ---------------------------------------------------------------------------
// DebounceTracker
// ---------------------------------------------------------------------------

/// Outcome of the locked check-and-update step.
#[derive(Debug, PartialEq, Eq)]
enum Decision {
    Idle,
    Wait(Duration),
    Fire,
}

pub struct DebounceTracker {
    revisions: Mutex<HashMap<String, RevisionState>>,
    remediator: Arc<dyn Remediator>,
    clock: Arc<dyn Clock>,
}

impl DebounceTracker {
    pub fn new(remediator: Arc<dyn Remediator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            revisions: Mutex::new(HashMap::new()),
            remediator,
            clock,
        }
    }

    /// Feed one observation through the state machine.
    ///
    /// Returns the minimum delay before the same resource should be checked
    /// again. A later check is always safe; an earlier one is harmless.
    pub async fn evaluate(&self, obs: &Observation, window: Duration) -> Duration {
        if obs.revision.is_empty() {
            warn!(
                kind = %obs.kind,
                namespace = %obs.namespace,
                name = %obs.name,
                debounce_secs = window.as_secs(),
                "cannot create revert without revision"
            );
            return Duration::ZERO;
        }

        match self.decide(obs, window) {
            Decision::Idle => Duration::ZERO,
            Decision::Wait(delay) => delay,
            Decision::Fire => {
                self.fire(obs, window).await;
                Duration::ZERO
            }
        }
    }

    /// The whole check-and-update runs under one lock. A revision moves to
    /// `Completed` here, before the remote call is made, so concurrent
    /// evaluations of the same revision cannot both fire.
    fn decide(&self, obs: &Observation, window: Duration) -> Decision {
        let now = self.clock.now();
        let revision = obs.revision.as_str();
        let mut revisions = self.lock();

        if obs.ready {
            if let Some(RevisionState::Pending { .. }) = revisions.get(revision) {
                revisions.remove(revision);
                debug!(
                    kind = %obs.kind,
                    namespace = %obs.namespace,
                    name = %obs.name,
                    revision,
                    "resource recovered, pending revert cancelled"
                );
            }
            return Decision::Idle;
        }

        match revisions.get(revision).copied() {
            Some(RevisionState::Completed { .. }) => Decision::Idle,
            Some(RevisionState::Pending { first_seen }) => {
                // A clock that stepped backwards counts as no time passed.
                let elapsed = (now - first_seen).to_std().unwrap_or(Duration::ZERO);
                if elapsed >= window {
                    revisions.insert(
                        revision.to_string(),
                        RevisionState::Completed { triggered_at: now },
                    );
                    Decision::Fire
                } else {
                    Decision::Wait(window - elapsed)
                }
            }
            None => {
                revisions.insert(
                    revision.to_string(),
                    RevisionState::Pending { first_seen: now },
                );
                info!(
                    kind = %obs.kind,
                    namespace = %obs.namespace,
                    name = %obs.name,
                    revision,
                    debounce_secs = window.as_secs(),
                    recheck_secs = window.as_secs(),
                    "failure detected"
                );
                Decision::Wait(window)
            }
        }
    }

    /// Run the remediation for a revision that was just marked `Completed`.
    /// A failure is logged and leaves the revision `Completed`.
    async fn fire(&self, obs: &Observation, window: Duration) {
        info!(
            kind = %obs.kind,
            namespace = %obs.namespace,
            name = %obs.name,
            revision = %obs.revision,
            debounce_secs = window.as_secs(),
            "failure stable, creating revert"
        );

        match self.remediator.remediate(&obs.revision).await {
            Ok(RemediationOutcome::Created) | Ok(RemediationOutcome::Simulated) => {}
            Err(e) => {
                error!(
                    kind = %obs.kind,
                    namespace = %obs.namespace,
                    name = %obs.name,
                    revision = %obs.revision,
                    error = %e,
                    "revert failed"
                );
            }
        }
    }

    /// Current state of `revision`; `None` means untracked.
    pub fn state_of(&self, revision: &str) -> Option<RevisionState> {
        self.lock().get(revision).copied()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let revisions = self.lock();
        let mut snapshot = TrackerSnapshot::default();
        for (revision, state) in revisions.iter() {
            match *state {
                RevisionState::Pending { first_seen } => snapshot.pending.push(PendingRevision {
                    revision: revision.clone(),
                    first_seen,
                }),
                RevisionState::Completed { triggered_at } => {
                    snapshot.completed.push(CompletedRevision {
                        revision: revision.clone(),
                        triggered_at,
                    })
                }
            }
        }
        snapshot.pending.sort_by(|a, b| a.revision.cmp(&b.revision));
        snapshot.completed.sort_by(|a, b| a.revision.cmp(&b.revision));
        snapshot
    }

    // A panic while holding the lock leaves the map consistent: every
    // mutation is a single insert or remove.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, RevisionState>> {
        self.revisions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

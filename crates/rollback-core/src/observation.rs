//! What the tracker is told about one watched resource.

use serde::{Deserialize, Serialize};

/// Condition type that carries a resource's overall readiness.
pub const READY_CONDITION: &str = "Ready";

/// A single readiness check of a watched resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    /// Failing content version. Empty when the resource has not reported one yet.
    pub revision: String,
    pub ready: bool,
}

/// Status condition as reported by Flux resources.
///
/// Only `type` and `status` are read; the remaining fields of a
/// `metav1.Condition` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default)]
    pub status: String,
}

impl Condition {
    pub fn new(type_: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            status: status.into(),
        }
    }
}

/// A resource is ready unless it carries `Ready=False`.
///
/// `Unknown` (reconciliation in progress) and a missing condition both count
/// as ready.
pub fn ready_from_conditions<'a>(conditions: impl IntoIterator<Item = &'a Condition>) -> bool {
    !conditions
        .into_iter()
        .any(|c| c.type_ == READY_CONDITION && c.status == "False")
}

/// Read access shared by every watched deployment kind.
pub trait Deployment {
    /// Revision the resource is failing (or succeeding) on, if known.
    fn revision(&self) -> Option<&str>;

    fn is_ready(&self) -> bool;

    fn observe(&self, kind: &str, name: &str, namespace: &str) -> Observation {
        Observation {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            revision: self.revision().unwrap_or_default().to_string(),
            ready: self.is_ready(),
        }
    }
}

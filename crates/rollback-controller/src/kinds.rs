//! Flux deployment kinds the controller watches.
//!
//! Objects are fetched as [`DynamicObject`]s so no CRD types have to be
//! generated; only the `status` fields the tracker needs are decoded.

use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use kube::ResourceExt;
use rollback_core::observation::{ready_from_conditions, Condition, Deployment, Observation};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use tracing::warn;

// ---------------------------------------------------------------------------
// WatchedKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedKind {
    Kustomization,
    HelmRelease,
}

impl WatchedKind {
    /// Default probe order.
    pub const ALL: [WatchedKind; 2] = [WatchedKind::Kustomization, WatchedKind::HelmRelease];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchedKind::Kustomization => "Kustomization",
            WatchedKind::HelmRelease => "HelmRelease",
        }
    }

    pub fn gvk(&self) -> GroupVersionKind {
        match self {
            WatchedKind::Kustomization => {
                GroupVersionKind::gvk("kustomize.toolkit.fluxcd.io", "v1", "Kustomization")
            }
            WatchedKind::HelmRelease => {
                GroupVersionKind::gvk("helm.toolkit.fluxcd.io", "v2", "HelmRelease")
            }
        }
    }

    fn plural(&self) -> &'static str {
        match self {
            WatchedKind::Kustomization => "kustomizations",
            WatchedKind::HelmRelease => "helmreleases",
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(&self.gvk(), self.plural())
    }

    /// Decode the object's `status` into this kind's view of it.
    pub fn deployment(&self, obj: &DynamicObject) -> Box<dyn Deployment> {
        let status = obj.data.get("status");
        match self {
            WatchedKind::Kustomization => Box::new(decode_status::<KustomizationStatus>(obj, status)),
            WatchedKind::HelmRelease => Box::new(decode_status::<HelmReleaseStatus>(obj, status)),
        }
    }

    pub fn observe(&self, obj: &DynamicObject) -> Observation {
        self.deployment(obj).observe(
            self.as_str(),
            &obj.name_any(),
            &obj.namespace().unwrap_or_default(),
        )
    }
}

impl fmt::Display for WatchedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WatchedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kustomization" | "kustomizations" | "ks" => Ok(WatchedKind::Kustomization),
            "helmrelease" | "helmreleases" | "hr" => Ok(WatchedKind::HelmRelease),
            other => Err(format!(
                "unknown kind '{other}': expected Kustomization or HelmRelease"
            )),
        }
    }
}

/// An unreadable status is treated as empty: ready, no revision.
fn decode_status<T>(obj: &DynamicObject, status: Option<&serde_json::Value>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(status) = status.filter(|s| !s.is_null()) else {
        return T::default();
    };
    T::deserialize(status).unwrap_or_else(|e| {
        warn!(
            name = %obj.name_any(),
            namespace = %obj.namespace().unwrap_or_default(),
            error = %e,
            "unreadable status, treating as empty"
        );
        T::default()
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Status views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KustomizationStatus {
    /// Set as soon as the source resolves, even when the apply fails.
    pub last_attempted_revision: Option<String>,
    pub last_applied_revision: Option<String>,
    pub conditions: Vec<Condition>,
}

impl Deployment for KustomizationStatus {
    fn revision(&self) -> Option<&str> {
        non_empty(&self.last_attempted_revision).or_else(|| non_empty(&self.last_applied_revision))
    }

    fn is_ready(&self) -> bool {
        ready_from_conditions(&self.conditions)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HelmReleaseStatus {
    pub last_attempted_revision: Option<String>,
    pub conditions: Vec<Condition>,
}

impl Deployment for HelmReleaseStatus {
    fn revision(&self) -> Option<&str> {
        non_empty(&self.last_attempted_revision)
    }

    fn is_ready(&self) -> bool {
        ready_from_conditions(&self.conditions)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(kind: WatchedKind, data: serde_json::Value) -> DynamicObject {
        let mut obj = DynamicObject::new("apps", &kind.api_resource()).within("flux-system");
        obj.data = data;
        obj
    }

    #[test]
    fn api_resources_point_at_flux_groups() {
        let ks = WatchedKind::Kustomization.api_resource();
        assert_eq!(ks.api_version, "kustomize.toolkit.fluxcd.io/v1");
        assert_eq!(ks.plural, "kustomizations");

        let hr = WatchedKind::HelmRelease.api_resource();
        assert_eq!(hr.api_version, "helm.toolkit.fluxcd.io/v2");
        assert_eq!(hr.plural, "helmreleases");
    }

    #[test]
    fn kustomization_failing_on_attempted_revision() {
        let obj = object(
            WatchedKind::Kustomization,
            json!({
                "status": {
                    "lastAttemptedRevision": "main@sha1:abc123",
                    "lastAppliedRevision": "main@sha1:000000",
                    "conditions": [
                        { "type": "Ready", "status": "False", "reason": "BuildFailed" }
                    ]
                }
            }),
        );
        let obs = WatchedKind::Kustomization.observe(&obj);
        assert_eq!(obs.kind, "Kustomization");
        assert_eq!(obs.name, "apps");
        assert_eq!(obs.namespace, "flux-system");
        assert_eq!(obs.revision, "main@sha1:abc123");
        assert!(!obs.ready);
    }

    #[test]
    fn kustomization_falls_back_to_applied_revision() {
        let obj = object(
            WatchedKind::Kustomization,
            json!({ "status": { "lastAttemptedRevision": "", "lastAppliedRevision": "def456" } }),
        );
        assert_eq!(WatchedKind::Kustomization.observe(&obj).revision, "def456");

        let obj = object(
            WatchedKind::Kustomization,
            json!({ "status": { "lastAppliedRevision": "def456" } }),
        );
        assert_eq!(WatchedKind::Kustomization.observe(&obj).revision, "def456");
    }

    #[test]
    fn helmrelease_has_no_fallback() {
        let obj = object(
            WatchedKind::HelmRelease,
            json!({
                "status": {
                    "lastAppliedRevision": "ignored",
                    "conditions": [{ "type": "Ready", "status": "False" }]
                }
            }),
        );
        let obs = WatchedKind::HelmRelease.observe(&obj);
        assert_eq!(obs.revision, "");
        assert!(!obs.ready);
    }

    #[test]
    fn helmrelease_ready() {
        let obj = object(
            WatchedKind::HelmRelease,
            json!({
                "status": {
                    "lastAttemptedRevision": "6.5.0",
                    "conditions": [{ "type": "Ready", "status": "True" }]
                }
            }),
        );
        let obs = WatchedKind::HelmRelease.observe(&obj);
        assert_eq!(obs.revision, "6.5.0");
        assert!(obs.ready);
    }

    #[test]
    fn missing_or_malformed_status_is_ready_without_revision() {
        for data in [
            json!({}),
            json!({ "status": null }),
            json!({ "status": { "conditions": "not-a-list" } }),
        ] {
            let obs = WatchedKind::Kustomization.observe(&object(WatchedKind::Kustomization, data));
            assert!(obs.ready);
            assert_eq!(obs.revision, "");
        }
    }

    #[test]
    fn kind_parsing_and_display() {
        assert_eq!(
            "Kustomization".parse::<WatchedKind>().unwrap(),
            WatchedKind::Kustomization
        );
        assert_eq!("hr".parse::<WatchedKind>().unwrap(), WatchedKind::HelmRelease);
        assert!("GitRepository".parse::<WatchedKind>().is_err());
        assert_eq!(WatchedKind::HelmRelease.to_string(), "HelmRelease");
    }
}

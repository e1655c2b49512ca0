use crate::error::RollbackError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_GITLAB_URL: &str = "https://gitlab";
pub const DEFAULT_BRANCH_PREFIX: &str = "revert";
pub const DEFAULT_DEBOUNCE_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RevertMode
// ---------------------------------------------------------------------------

/// How a confirmed failure is remediated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertMode {
    /// POST the revert to GitLab.
    #[default]
    Live,
    /// Log the request that would have been sent and report success.
    Echo,
}

impl fmt::Display for RevertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RevertMode::Live => "live",
            RevertMode::Echo => "echo",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RevertMode {
    type Err = RollbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "live" => Ok(RevertMode::Live),
            "echo" | "dry-run" | "dry_run" => Ok(RevertMode::Echo),
            other => Err(RollbackError::InvalidRevertMode(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// GitLabConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_GITLAB_URL.to_string()
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            project_id: String::new(),
            base_url: default_base_url(),
        }
    }
}

// The token never ends up in logs.
impl fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("GitLabConfig")
            .field("token", &token)
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RollbackConfig
// ---------------------------------------------------------------------------

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackConfig {
    #[serde(default)]
    pub gitlab: GitLabConfig,
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
    #[serde(default = "default_debounce", with = "duration_secs")]
    pub debounce: Duration,
    #[serde(default)]
    pub mode: RevertMode,
}

fn default_branch_prefix() -> String {
    DEFAULT_BRANCH_PREFIX.to_string()
}

fn default_debounce() -> Duration {
    Duration::from_secs(DEFAULT_DEBOUNCE_SECS)
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            gitlab: GitLabConfig::default(),
            branch_prefix: default_branch_prefix(),
            debounce: default_debounce(),
            mode: RevertMode::default(),
        }
    }
}

impl RollbackConfig {
    /// Branch the revert commit is created on: `{prefix}-{revision}`.
    pub fn branch_name(&self, revision: &str) -> String {
        format!("{}-{}", self.branch_prefix, revision)
    }

    /// GitLab endpoint that reverts `revision`.
    pub fn revert_url(&self, revision: &str) -> String {
        format!(
            "{}/api/v4/projects/{}/repository/commits/{}/revert",
            self.gitlab.base_url.trim_end_matches('/'),
            self.gitlab.project_id,
            revision
        )
    }

    /// Report settings that will make remediation fail or misbehave.
    ///
    /// Nothing here is rejected: a live revert without credentials is still
    /// attempted and fails at the remote end.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.mode == RevertMode::Live {
            if self.gitlab.token.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "GitLab token is empty; live reverts will be rejected".to_string(),
                });
            }
            if self.gitlab.project_id.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "GitLab project ID is empty; live reverts will be rejected"
                        .to_string(),
                });
            }
        }

        if self.debounce.is_zero() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "debounce window is 0s; a revert fires on the second failing check"
                    .to_string(),
            });
        }

        if self.branch_prefix.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "revert branch prefix is empty".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for Duration (serialized as seconds: u64)
// ---------------------------------------------------------------------------

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

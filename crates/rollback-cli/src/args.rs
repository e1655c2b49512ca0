use clap::Args;
use rollback_controller::kinds::WatchedKind;
use rollback_controller::RunOptions;
use rollback_core::config::{
    GitLabConfig, DEFAULT_BRANCH_PREFIX, DEFAULT_DEBOUNCE_SECS, DEFAULT_GITLAB_URL,
};
use rollback_core::{RevertMode, RollbackConfig};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Remediation policy
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// GitLab access token, sent as PRIVATE-TOKEN
    #[arg(
        long,
        global = true,
        env = "GITLAB_TOKEN",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub gitlab_token: String,

    /// GitLab project ID (numeric, or the URL-encoded project path)
    #[arg(long, global = true, env = "GITLAB_PROJECT_ID", default_value = "")]
    pub gitlab_project_id: String,

    /// GitLab base URL
    #[arg(long, global = true, env = "GITLAB_URL", default_value = DEFAULT_GITLAB_URL)]
    pub gitlab_url: String,

    /// Revert branches are named <prefix>-<revision>
    #[arg(long, global = true, env = "REVERT_BRANCH_PREFIX", default_value = DEFAULT_BRANCH_PREFIX)]
    pub revert_branch_prefix: String,

    /// How long a revision must keep failing before it is reverted
    #[arg(long, global = true, env = "DEBOUNCE_SECONDS", default_value_t = DEFAULT_DEBOUNCE_SECS)]
    pub debounce_seconds: u64,

    /// `live` posts to GitLab, `echo` only logs the request
    #[arg(long, global = true, env = "REVERT_MODE", default_value_t = RevertMode::Live)]
    pub revert_mode: RevertMode,
}

impl PolicyArgs {
    pub fn to_config(&self) -> RollbackConfig {
        RollbackConfig {
            gitlab: GitLabConfig {
                token: self.gitlab_token.clone(),
                project_id: self.gitlab_project_id.clone(),
                base_url: self.gitlab_url.clone(),
            },
            branch_prefix: self.revert_branch_prefix.clone(),
            debounce: Duration::from_secs(self.debounce_seconds),
            mode: self.revert_mode,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller runtime
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Clone)]
pub struct RuntimeArgs {
    /// Kinds to watch, comma separated, in probe order
    #[arg(
        long = "watch",
        global = true,
        env = "WATCH_KINDS",
        value_delimiter = ',',
        default_values_t = WatchedKind::ALL
    )]
    pub watch: Vec<WatchedKind>,

    /// Port for /healthz, /readyz and /api/tracker
    #[arg(long, global = true, env = "HEALTH_PORT", default_value_t = 8081)]
    pub health_port: u16,
}

impl RuntimeArgs {
    pub fn to_options(&self) -> RunOptions {
        RunOptions {
            probes: self.watch.clone(),
            health_port: self.health_port,
        }
    }
}

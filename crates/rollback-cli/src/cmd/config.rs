use crate::args::{PolicyArgs, RuntimeArgs};
use crate::output::{print_json, print_table};
use rollback_core::config::WarnLevel;

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

/// Print the effective configuration and its warnings. Fails when any
/// warning is an error.
pub fn run(policy: &PolicyArgs, runtime: &RuntimeArgs, json: bool) -> anyhow::Result<()> {
    let config = policy.to_config();
    let options = runtime.to_options();
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "config": config,
            "watch": options.probes.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            "health_port": options.health_port,
            "warnings": warnings,
        });
        print_json(&value)?;
    } else {
        let token = if config.gitlab.token.is_empty() {
            "(unset)"
        } else {
            "(set)"
        };
        let watch: Vec<&str> = options.probes.iter().map(|k| k.as_str()).collect();
        let rows = vec![
            vec!["gitlab url".into(), config.gitlab.base_url.clone()],
            vec!["gitlab project".into(), config.gitlab.project_id.clone()],
            vec!["gitlab token".into(), token.into()],
            vec!["branch prefix".into(), config.branch_prefix.clone()],
            vec!["debounce".into(), format!("{}s", config.debounce.as_secs())],
            vec!["revert mode".into(), config.mode.to_string()],
            vec!["watch".into(), watch.join(",")],
            vec!["health port".into(), options.health_port.to_string()],
        ];
        print_table(&["SETTING", "VALUE"], rows);

        if warnings.is_empty() {
            println!("\nConfig is valid. No warnings.");
        } else {
            println!();
            for w in &warnings {
                let prefix = match w.level {
                    WarnLevel::Warning => "warning",
                    WarnLevel::Error => "error",
                };
                println!("[{prefix}] {}", w.message);
            }
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

mod args;
mod cmd;
mod output;

use args::{PolicyArgs, RuntimeArgs};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "flux-rollback",
    about = "Revert the Git commit behind a Flux Kustomization or HelmRelease that stays not-Ready",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    policy: PolicyArgs,

    #[command(flatten)]
    runtime: RuntimeArgs,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Watch the cluster and revert failing revisions (default)
    Run,

    /// Show the effective configuration and validate it
    Config,
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    let default_level = match command {
        Commands::Run => tracing::Level::INFO,
        Commands::Config => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match command {
        Commands::Run => cmd::run::run(&cli.policy, &cli.runtime),
        Commands::Config => cmd::config::run(&cli.policy, &cli.runtime, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rollback_controller::kinds::WatchedKind;
    use rollback_core::RevertMode;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["flux-rollback"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_build_config() {
        let cli = parse(&[
            "--gitlab-token",
            "t0k",
            "--gitlab-project-id",
            "42",
            "--gitlab-url",
            "https://gitlab.example.com",
            "--revert-branch-prefix",
            "rollback",
            "--debounce-seconds",
            "15",
            "--revert-mode",
            "echo",
            "config",
        ]);
        let config = cli.policy.to_config();
        assert_eq!(config.gitlab.token, "t0k");
        assert_eq!(config.gitlab.project_id, "42");
        assert_eq!(config.gitlab.base_url, "https://gitlab.example.com");
        assert_eq!(config.branch_name("abc"), "rollback-abc");
        assert_eq!(config.debounce, Duration::from_secs(15));
        assert_eq!(config.mode, RevertMode::Echo);
        assert!(matches!(cli.command, Some(Commands::Config)));
    }

    #[test]
    fn watch_list_parses_in_order() {
        let cli = parse(&["--watch", "HelmRelease,Kustomization"]);
        assert_eq!(
            cli.runtime.to_options().probes,
            vec![WatchedKind::HelmRelease, WatchedKind::Kustomization]
        );
        assert!(cli.command.is_none());
    }

    #[test]
    fn rejects_unknown_mode_and_kind() {
        assert!(Cli::try_parse_from(["flux-rollback", "--revert-mode", "maybe"]).is_err());
        assert!(Cli::try_parse_from(["flux-rollback", "--watch", "GitRepository"]).is_err());
        assert!(Cli::try_parse_from(["flux-rollback", "--debounce-seconds", "soon"]).is_err());
    }
}

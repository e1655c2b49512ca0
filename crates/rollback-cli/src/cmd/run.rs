use crate::args::{PolicyArgs, RuntimeArgs};
use rollback_core::config::WarnLevel;

pub fn run(policy: &PolicyArgs, runtime: &RuntimeArgs) -> anyhow::Result<()> {
    let config = policy.to_config();
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => tracing::error!("{}", w.message),
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(rollback_controller::run(config, runtime.to_options()))
}

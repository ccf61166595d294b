use anyhow::{Context, Result};
use claude_policy::PolicyAuditor;
use tracing::{Level, info, instrument};

use crate::cli::HookCmd;
use crate::guard_hook;

impl HookCmd {
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn run(&self) -> Result<()> {
        match self {
            Self::GuardHomeDir => {
                let auditor = PolicyAuditor::new();
                let home = auditor
                    .resolver()
                    .home_dir()
                    .context("failed to resolve home directory")?;
                let config = auditor
                    .config()
                    .context("failed to load permguard configuration")?;

                let output = guard_hook::run(
                    std::io::stdin().lock(),
                    std::io::stdout().lock(),
                    &home,
                    &config.guard,
                )?;
                info!(denied = output.is_some(), "guard-home-dir finished");
            }
        }
        Ok(())
    }
}

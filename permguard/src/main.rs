use anyhow::Result;
use clap::Parser;
use claude_policy::{AuditRequest, PolicyAuditor};
use tracing::{error, info};

use permguard::cli::{Cli, Commands};
use permguard::cmd;
use permguard::errors::display_error;
use permguard::tracing_init::init_tracing;

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Hook(hook_cmd) => hook_cmd.run(),
        Commands::Analyze {
            days,
            settings,
            projects_dir,
            format,
            output,
        } => {
            let request = AuditRequest {
                days,
                settings,
                projects_dir,
            };
            cmd::analyze::run(
                &PolicyAuditor::new(),
                &request,
                format,
                output.as_deref(),
                std::io::stdout().lock(),
            )
            .map(|_| ())
        }
        Commands::Realpath { path } => cmd::realpath::run(&path, std::io::stdout().lock()),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    info!(
        version = permguard::version::version_long(),
        args = ?std::env::args().collect::<Vec<_>>(),
        "permguard started"
    );

    let verbose = cli.verbose;
    if let Err(err) = run(cli) {
        error!("{:#}", err);
        display_error(&err, verbose);
        std::process::exit(1);
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "permguard")]
#[command(version = crate::version::version_long())]
#[command(about = "Guard and audit Claude Code permission policy")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum HookCmd {
    /// PreToolUse guard - deny reads and scans of the home directory outside the project
    #[command(name = "guard-home-dir")]
    GuardHomeDir,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab_case")]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Summary,
    /// The full report as pretty JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Claude Code hook handlers (read hook JSON from stdin)
    #[command(subcommand)]
    Hook(HookCmd),

    /// Analyze recent transcripts against the permission policy
    Analyze {
        /// How many days of transcripts to scan (default from config, else 30)
        #[arg(long)]
        days: Option<u32>,

        /// Settings file to audit
        /// (default: nearest repo's dotclaude/settings.json, else ~/.claude/settings.json)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Transcript root (default: ~/.claude/projects)
        #[arg(long)]
        projects_dir: Option<PathBuf>,

        /// Output format for stdout
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Also write the full JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a path like `realpath -m`: symlinks followed, missing components allowed
    Realpath {
        path: PathBuf,
    },
}

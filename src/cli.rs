//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::{Env, WriteStyle};

use crate::commands;

/// S3 Replication - Configure cross-bucket replication from a deployment descriptor
#[derive(Parser, Debug)]
#[command(name = "s3-replication")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        value_enum,
        default_value_t = LogLevel::Info
    )]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the replication roles and configure replication on every source bucket
    Apply(commands::apply::ApplyArgs),

    /// Show the replication plan without contacting AWS
    Plan(commands::plan::PlanArgs),

    /// Validate the replication settings of a deployment descriptor
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        self.init_logging();

        match self.command {
            Commands::Apply(args) => commands::apply::execute(args, &self.color),
            Commands::Plan(args) => commands::plan::execute(args),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }

    /// Logs go to stderr; `RUST_LOG` takes precedence over `--log-level`.
    /// The SDK crates are held at `warn` unless `RUST_LOG` says otherwise.
    fn init_logging(&self) {
        let default_filter = format!("warn,s3_replication={}", self.log_level.as_filter());
        let write_style = match self.color.to_lowercase().as_str() {
            "always" => WriteStyle::Always,
            "never" => WriteStyle::Never,
            _ => WriteStyle::Auto,
        };

        let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
            .write_style(write_style)
            .format_timestamp(None)
            .format_target(false)
            .try_init();
    }
}

use clap::{Parser, Subcommand};
use gemini_dash::{config, discovery, report};
use std::path::PathBuf;

/// Reconstruct Gemini CLI token usage, tool calls and API latency from the
/// OpenTelemetry collector's debug log.
#[derive(Parser, Debug)]
#[command(name = "gemini-dash", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "gemini-dash.toml", global = true)]
    config: PathBuf,

    /// Directory holding per-project Gemini CLI state (overrides config)
    #[arg(long, global = true)]
    gemini_dir: Option<PathBuf>,

    /// Extra logging (discovery, skipped lines)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the metrics report as JSON
    Extract {
        /// Read this log instead of discovering the newest one
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Maximum number of events (overrides config)
        #[arg(long)]
        limit: Option<usize>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Print the path of the newest collector log
    Locate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "gemini_dash=debug"
    } else {
        "gemini_dash=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let mut cfg = config::load_config(&cli.config).collector;
    if let Some(dir) = cli.gemini_dir {
        cfg.gemini_tmp_dir = Some(dir);
    }

    match cli.command {
        Command::Extract {
            log,
            limit,
            compact,
        } => {
            if let Some(limit) = limit {
                cfg.max_results = limit;
            }
            let report = match log {
                Some(path) => report::report_for_file(&path, cfg.max_results)?,
                None => report::build_report(&cfg)?,
            };
            let json = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{json}");
        }
        Command::Locate => {
            let found = cfg
                .tmp_root()
                .and_then(|root| discovery::latest_collector_log(&root, &cfg.log_relative_path));
            match found {
                Some(path) => println!("{}", path.display()),
                None => println!("{}", report::NO_LOG_MESSAGE),
            }
        }
    }

    Ok(())
}

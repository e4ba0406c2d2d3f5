//! Court Records CLI entry point.

use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tokio::time::Instant;

use court_records::{CourtRecordsClient, Lookup, QueryKind};
use court_records_cli::config::load_config;
use court_records_cli::output;

#[derive(Parser)]
#[command(
    name = "court-records",
    about = "Look up, search and refresh cases on a court records portal",
    version
)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Portal base URL (overrides the config file).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Give up on each lookup after this many seconds.
    #[arg(long, global = true)]
    deadline_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search by case number, or by party name with --name.
    Search {
        query: String,

        /// Treat the query as a party name.
        #[arg(long)]
        name: bool,
    },

    /// Show the full record for one case number.
    Case { number: String },

    /// Refresh a batch of tracked case numbers.
    Refresh {
        #[arg(required = true)]
        numbers: Vec<String>,
    },

    /// Show rate-limit usage for one source or all of them.
    Status { source: Option<String> },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   court-records completions bash > ~/.local/share/bash-completion/completions/court-records
    ///   court-records completions zsh > ~/.zfunc/_court-records
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "court-records", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref(), cli.base_url.as_deref())?;
    tracing::debug!("portal: {}", config.base_url);
    let client = CourtRecordsClient::new(config)?;
    let deadline = cli
        .deadline_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    match cli.command {
        Commands::Search { query, name } => {
            let kind = if name {
                QueryKind::Name
            } else {
                QueryKind::CaseNumber
            };
            let result = client.search_cases(&query, kind, deadline).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                match result {
                    Lookup::Found(records) => {
                        for record in &records {
                            println!("{}", output::case_line(record));
                        }
                    }
                    Lookup::NotFound => println!("{}", output::NOT_FOUND),
                }
            }
        }

        Commands::Case { number } => {
            let result = client.get_case_details(&number, deadline).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                match result {
                    Lookup::Found(record) => print!("{}", output::case_details(&record)),
                    Lookup::NotFound => println!("{}", output::NOT_FOUND),
                }
            }
        }

        Commands::Refresh { numbers } => {
            let report = client.update_tracked_cases(&numbers, deadline).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::refresh_report(&report));
            }
        }

        Commands::Status { source } => {
            let report = client.rate_limit_status(source.as_deref())?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::rate_limits(&report));
            }
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

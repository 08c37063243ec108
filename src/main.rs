use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use trustgate_lib::commands::settings::SETTINGS_ENV;
use trustgate_lib::{format_unratable, load_scoring_settings, RepositorySnapshot, ScoreOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "trustgate", version, about = "Rate a package's source repository")]
struct Cli {
    /// Settings JSON file
    #[arg(long, global = true, env = SETTINGS_ENV)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rate resolver snapshots and print one record per snapshot
    Rate {
        /// Snapshot JSON files produced by the resolver
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,

        /// Score an existing checkout instead of cloning
        #[arg(long)]
        clone_path: Option<PathBuf>,
    },
    /// Print the record for a source that cannot be analysed
    Unratable { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let settings = load_scoring_settings(cli.settings.as_deref())?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Rate {
            snapshots,
            clone_path,
        } => {
            let orchestrator = Arc::new(ScoreOrchestrator::new(settings));
            for path in snapshots {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
                let snapshot: RepositorySnapshot = serde_json::from_str(&raw)
                    .with_context(|| format!("Malformed snapshot {}", path.display()))?;

                let outcome = match &clone_path {
                    Some(dir) => orchestrator.rate(snapshot, Some(dir.clone())).await,
                    None => Arc::clone(&orchestrator).rate_repository(snapshot).await,
                };
                log::info!(
                    "{}: net score {:.3} ({})",
                    path.display(),
                    outcome.net_score,
                    if trustgate_lib::accepts(outcome.net_score) { "accepted" } else { "rejected" }
                );
                stdout.write_all(outcome.record.as_bytes())?;
            }
        }
        Command::Unratable { url } => {
            stdout.write_all(format_unratable(&url).as_bytes())?;
        }
    }

    Ok(())
}

use clap::Parser;
use frep::commands;
use frep::config::{Cli, Command};
use frep::FileStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("frep={}", cli.log_level())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let store_path = cli.config.clone().unwrap_or_else(FileStore::default_path);
    let store = Arc::new(FileStore::open(store_path)?);
    let show_progress = !cli.quiet && console::user_attended_stderr();

    match cli.command {
        Command::Add {
            source,
            destination,
            exclude,
        } => {
            let replication = commands::manage::add(&store, &source, &destination, exclude)?;
            let (_, aborted) =
                commands::sync::run(Arc::clone(&store), Some(&replication.source), show_progress)?;
            if aborted > 0 {
                anyhow::bail!("initial sync of {} failed", replication.source.display());
            }
        }
        Command::Remove { source } => commands::manage::remove(&store, &source)?,
        Command::List => commands::manage::list(&store),
        Command::Sync { source, dry_run } => {
            if dry_run {
                commands::sync::dry_run(store, source.as_deref())?;
            } else {
                let (total, aborted) =
                    commands::sync::run(store, source.as_deref(), show_progress)?;
                if aborted > 0 {
                    anyhow::bail!("{} replication(s) could not be synced", aborted);
                }
                if !total.is_clean() {
                    eprintln!("Completed with {} error(s); see log for details.", total.errors);
                }
            }
        }
        Command::Status { json } => commands::status::run(store, json)?,
        Command::Watch { interval } => commands::watch::run(store, interval)?,
    }

    Ok(())
}

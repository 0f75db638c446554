//! Batch entry point for the `decide` 1.0 to 2.0 migration.
//!
//! # Commands
//!
//! - `decide-migrate [migrate]` -- drop indexes on `events` and `trials`
//!   and rewrite every document to the 2.0 schema
//! - `decide-migrate configure-indexes` -- create the 2.0 index set; run it
//!   once the migrated data has been checked
//!
//! Logs go to stderr. Each finished or aborted pass prints one JSON summary
//! line on stdout.
//!
//! # Exit status
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | every pass completed and every rewrite was saved          |
//! | 1    | configuration, connection, or a pass aborted              |
//! | 2    | every pass completed but some documents failed to save    |

use std::process::ExitCode;

use anyhow::{Context, bail};
use decide_db::{DocumentStore, create_indexes, post_migration_indexes};
use decide_migrate::config::LoggingConfig;
use decide_migrate::{MigrateConfig, MigrationDriver, PassReport};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code when passes completed but some saves failed.
const EXIT_PERSIST_FAILURES: u8 = 2;

/// What this invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Migrate,
    ConfigureIndexes,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let command = match args.next().as_deref() {
            None | Some("migrate") => Self::Migrate,
            Some("configure-indexes") => Self::ConfigureIndexes,
            Some(other) => {
                bail!("unknown command {other:?}, expected `migrate` or `configure-indexes`")
            }
        };
        if let Some(extra) = args.next() {
            bail!("unexpected argument {extra:?}");
        }
        Ok(command)
    }
}

/// Application entry point.
///
/// Loads configuration, initializes logging, opens the store, runs the
/// requested command, and closes the store before reporting the outcome.
///
/// # Errors
///
/// Returns an error if configuration, connection, or a migration pass fails.
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let command = Command::parse(std::env::args().skip(1))?;
    let config = MigrateConfig::load().context("failed to load configuration")?;
    init_logging(&config.logging);

    info!(?command, "decide-migrate starting");
    info!(
        database = config.store.database,
        uuid_encoding = %config.migration.uuid_encoding,
        collections = ?config.migration.collections,
        parallel = config.migration.parallel,
        "Configuration loaded"
    );

    let store = DocumentStore::connect(&config.store.mongo_config())
        .await
        .context("failed to connect to MongoDB")?;

    let outcome = match command {
        Command::Migrate => migrate(&store, &config).await,
        Command::ConfigureIndexes => configure_indexes(&store).await,
    };

    store.close().await;
    outcome
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn migrate(store: &DocumentStore, config: &MigrateConfig) -> anyhow::Result<ExitCode> {
    let results = MigrationDriver::new(store)
        .run_all(
            &config.migration.collections,
            config.migration.uuid_encoding,
            config.migration.parallel,
        )
        .await;

    let mut aborted = 0_usize;
    let mut persist_failed = 0_u64;
    for result in &results {
        match result {
            Ok(report) => {
                print_summary(report)?;
                persist_failed = persist_failed.saturating_add(report.persist_failed);
            }
            Err(e) => {
                error!(error = %e, "Migration pass aborted");
                if let Some(report) = e.report() {
                    print_summary(report)?;
                }
                aborted = aborted.saturating_add(1);
            }
        }
    }

    if aborted > 0 {
        bail!("{aborted} migration pass(es) aborted, re-run the migration");
    }
    if persist_failed > 0 {
        warn!(persist_failed, "Some documents could not be saved, see warnings above");
        return Ok(ExitCode::from(EXIT_PERSIST_FAILURES));
    }

    info!("Migration complete, run `decide-migrate configure-indexes` to rebuild indexes");
    Ok(ExitCode::SUCCESS)
}

async fn configure_indexes(store: &DocumentStore) -> anyhow::Result<ExitCode> {
    let names = create_indexes(store, &post_migration_indexes())
        .await
        .context("failed to create indexes")?;
    info!(count = names.len(), "Index configuration complete");
    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &PassReport) -> anyhow::Result<()> {
    let line = serde_json::to_string(report).context("failed to serialize pass summary")?;
    println!("{line}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn command_parsing() {
        assert_eq!(Command::parse(args(&[])).unwrap(), Command::Migrate);
        assert_eq!(Command::parse(args(&["migrate"])).unwrap(), Command::Migrate);
        assert_eq!(
            Command::parse(args(&["configure-indexes"])).unwrap(),
            Command::ConfigureIndexes
        );
        assert!(Command::parse(args(&["rollback"])).is_err());
        assert!(Command::parse(args(&["migrate", "extra"])).is_err());
    }
}

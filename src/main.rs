//! CLI entry point for `privsync`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use privsync::analyzer::analyze_privileges;
use privsync::catalog::CatalogSnapshot;
use privsync::error::Result;
use privsync::output::formatter;
use privsync::spec::load_spec_file;
use privsync::Statement;

#[derive(Parser)]
#[command(
    name = "privsync",
    about = "Plan the GRANT/REVOKE statements that make a PostgreSQL database match a privilege spec"
)]
struct Cli {
    /// Role and privilege spec (YAML)
    spec: PathBuf,

    /// Catalog snapshot (JSON) describing current ownership and grants
    #[arg(long, required_unless_present = "db_url", conflicts_with = "db_url")]
    snapshot: Option<PathBuf>,

    /// Introspect a live `PostgreSQL` database (requires the `db` feature)
    #[arg(long)]
    db_url: Option<String>,

    /// Write `<name>.sql` and `<name>_report.md` here instead of printing the script
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File stem for files written to --output-dir
    #[arg(long, default_value = "privileges")]
    name: String,

    /// Print debug diagnostics to stderr
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Where the current catalog state comes from.
#[derive(Debug, PartialEq, Eq)]
enum SnapshotSource<'a> {
    File(&'a Path),
    Live(&'a str),
}

impl Cli {
    fn snapshot_source(&self) -> SnapshotSource<'_> {
        match (&self.snapshot, &self.db_url) {
            (Some(path), _) => SnapshotSource::File(path),
            (None, Some(url)) => SnapshotSource::Live(url),
            (None, None) => Cli::command()
                .error(
                    ErrorKind::MissingRequiredArgument,
                    "either --snapshot or --db-url is required",
                )
                .exit(),
        }
    }
}

fn load_snapshot(source: SnapshotSource<'_>) -> Result<CatalogSnapshot> {
    match source {
        SnapshotSource::File(path) => CatalogSnapshot::from_json_file(path),
        SnapshotSource::Live(url) => load_live_snapshot(url),
    }
}

#[cfg(feature = "db")]
fn load_live_snapshot(url: &str) -> Result<CatalogSnapshot> {
    privsync::catalog::postgres::load_snapshot_from_url(url)
}

#[cfg(not(feature = "db"))]
fn load_live_snapshot(_url: &str) -> Result<CatalogSnapshot> {
    Err(privsync::Error::Database(
        "--db-url requires privsync to be built with the `db` feature".to_string(),
    ))
}

fn run(cli: &Cli) -> Result<Vec<Statement>> {
    let spec = load_spec_file(&cli.spec)?;
    let snapshot = load_snapshot(cli.snapshot_source())?;
    let statements = analyze_privileges(&spec, &snapshot)?;

    match &cli.output_dir {
        Some(dir) => {
            formatter::write_output(dir, &cli.name, &statements)?;
            info!(dir = %dir.display(), name = %cli.name, "plan written");
        }
        None => {
            let script = formatter::format_statements(&statements);
            if !script.is_empty() {
                println!("{script}");
            }
        }
    }

    Ok(statements)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(statements) if statements.iter().any(Statement::is_change) => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::from(2)
        }
    }
}

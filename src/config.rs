use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable naming the database file.
pub(crate) const DB_ENV_VAR: &str = "FINTRACK_DB";
const DB_FILE_NAME: &str = "fintrack.db";

/// Flags accepted anywhere on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GlobalOptions {
    pub(crate) db: Option<PathBuf>,
    pub(crate) verbose: bool,
    pub(crate) json: bool,
}

impl GlobalOptions {
    /// Split global flags out of `args` (program name excluded). The
    /// remaining arguments keep their order.
    pub(crate) fn extract(args: &[String]) -> Result<(Self, Vec<String>)> {
        let mut opts = Self::default();
        let mut rest = Vec::with_capacity(args.len());
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--verbose" | "-v" => opts.verbose = true,
                "--json" => opts.json = true,
                "--db" => {
                    let path = iter.next().context("--db requires a path")?;
                    opts.db = Some(PathBuf::from(path));
                }
                other => match other.strip_prefix("--db=") {
                    Some(path) => opts.db = Some(PathBuf::from(path)),
                    None => rest.push(arg.clone()),
                },
            }
        }
        Ok((opts, rest))
    }
}

/// Database location: `--db`, then `FINTRACK_DB`, then the platform data dir.
pub(crate) fn resolve_db_path(flag: Option<&Path>) -> Result<PathBuf> {
    let env = std::env::var_os(DB_ENV_VAR).map(PathBuf::from);
    match explicit_db_path(flag, env) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

fn explicit_db_path(flag: Option<&Path>, env: Option<PathBuf>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| env.filter(|p| !p.as_os_str().is_empty()))
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "fintrack", "fintrack")
        .context("Could not determine data directory")?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join(DB_FILE_NAME))
}

/// Log to stderr so command output on stdout stays clean.
/// Priority: RUST_LOG env var > --verbose flag > default (warn)
pub(crate) fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

mod advisor;
mod config;
mod db;
mod error;
mod features;
mod forecast;
mod import;
mod models;
mod report;
mod run;

use anyhow::Result;

use config::GlobalOptions;
use run::Output;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (opts, command) = GlobalOptions::extract(&args)?;
    config::init_logging(opts.verbose);

    let db_path = config::resolve_db_path(opts.db.as_deref())?;
    let mut db = db::Database::open(&db_path)?;

    let out = if opts.json { Output::Json } else { Output::Text };
    run::as_cli(&command, &mut db, out)
}

//! Binary entry point: load configuration, bring up logging and the database,
//! then drive the Ratatui event loop starting at the sign-in screen.
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use repertoire_manager::config::{AppPaths, Config};
use repertoire_manager::logging::init_logging;
use repertoire_manager::{
    open_database, run_app, App, AuthContext, ChangeFeed, LocalIdentity, SqliteStore, UiSettings,
};

#[derive(Parser, Debug)]
#[command(name = "repertoire-manager", version, about)]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file; overrides the config file
    #[arg(short, long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Mark the account with this email as confirmed, then exit
    #[arg(long, value_name = "EMAIL")]
    confirm_email: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let paths = AppPaths::discover()?;
    let config_file = args.config.unwrap_or_else(|| paths.config_file.clone());
    let config = Config::load(&config_file)?;
    init_logging(&paths.log_file(), &config.logging.filter)?;

    let db_path = args
        .database
        .unwrap_or_else(|| config.database_path(&paths));
    info!(config = %config_file.display(), database = %db_path.display(), "starting");
    let conn = Rc::new(open_database(&db_path)?);

    let feed = ChangeFeed::new();
    let store = SqliteStore::new(Rc::clone(&conn), feed.clone());
    let identity = LocalIdentity::new(conn, feed, config.auth.require_email_confirmation);

    if let Some(email) = args.confirm_email {
        identity
            .confirm_email(&email)
            .with_context(|| format!("could not confirm {email}"))?;
        println!("Confirmed {email}.");
        return Ok(());
    }

    let settings = UiSettings {
        live: config.live.settings(),
        units_per_line: config.live.units_per_line(),
        refresh_metrics_on_resize: config.live.refresh_metrics_on_resize,
        min_password_len: config.auth.min_password_len,
    };
    let auth = AuthContext::init(Box::new(identity));
    let mut app = App::new(Box::new(store.clone()), Box::new(store), auth, settings);
    run_app(&mut app)
}

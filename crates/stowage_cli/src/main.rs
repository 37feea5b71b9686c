//! Command-line runner: runs one request against a stowage database and
//! prints the JSON response.
//!
//! ```text
//! stowage --db ./stowage.db /api/User/registerUser '{"username":"ada","password":"pw"}'
//! ```

use clap::Parser;
use log::info;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use stowage_core::{init_from_config, CoreConfig, Store};

#[derive(Parser)]
#[command(name = "stowage", version, about = "Run one stowage request")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config)
    #[arg(long, env = "STOWAGE_DB_PATH")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files (overrides config)
    #[arg(long, env = "STOWAGE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (overrides config)
    #[arg(long, env = "STOWAGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Route such as `/api/Space/createSpace`
    route: String,

    /// JSON request body; `-` reads stdin
    #[arg(default_value = "{}")]
    body: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(response) => {
            let failed = response.get("error").is_some();
            println!("{response}");
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(message) => {
            eprintln!("stowage: {message}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<Value, String> {
    let config = load_config(&cli)?;
    init_from_config(&config.logging).map_err(|err| err.to_string())?;

    let body = read_body(&cli.body)?;
    let store = Store::from_config(&config).map_err(|err| err.to_string())?;
    info!(
        "event=cli_request module=cli route={} version={}",
        cli.route,
        stowage_core::core_version()
    );
    let response = stowage_api::handle_request(&store, &cli.route, &body);
    store.close().map_err(|err| err.to_string())?;
    Ok(response)
}

fn load_config(cli: &Cli) -> Result<CoreConfig, String> {
    let mut config = match cli.config.as_deref() {
        Some(path) => CoreConfig::load(path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    config.apply_env().map_err(|err| err.to_string())?;

    if let Some(db) = &cli.db {
        config.database.path = Some(db.clone());
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = Some(level.clone());
    }
    Ok(config)
}

fn read_body(raw: &str) -> Result<Value, String> {
    let text = if raw == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|err| format!("failed to read stdin: {err}"))?;
        buffer
    } else {
        raw.to_string()
    };
    serde_json::from_str(&text).map_err(|err| format!("request body is not JSON: {err}"))
}

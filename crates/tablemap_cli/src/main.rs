//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `tablemap_core` linkage.
//! - Exercise one save/read cycle against a real SQLite connection.
//!
//! Usage: `tablemap_cli [db-path]`. Without a path the configuration from
//! `TABLEMAP_*` environment variables is used (in-memory by default).

use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use tablemap_core::{
    impl_model, init_logging_from, open_db_with, Repository, TablemapConfig,
};

#[derive(Debug, Clone, Default)]
struct User {
    id: i64,
    name: String,
    email: String,
}

impl_model!(User { id, name, email });

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("tablemap_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let mut config = TablemapConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(path) = std::env::args().nth(1) {
        config.db_path = Some(PathBuf::from(path));
    }
    init_logging_from(&config)?;

    println!("tablemap_core version={}", tablemap_core::core_version());

    let conn = open_db_with(&config).map_err(|err| err.to_string())?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL
        );",
    )
    .map_err(|err| err.to_string())?;

    let repo = Repository::<User>::new(&conn, "users", "id");
    let mut user = User {
        id: 0,
        name: "smoke".to_string(),
        email: "smoke@example.com".to_string(),
    };
    let outcome = repo.save(&mut user).map_err(|err| err.to_string())?;
    let rows = repo.get_all().map_err(|err| err.to_string())?.count();

    info!(
        "event=cli_smoke module=cli status=ok key={} rows={}",
        outcome.key(),
        rows
    );
    println!("saved user id={} table_rows={}", user.id, rows);
    Ok(())
}

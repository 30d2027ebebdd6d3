//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas the repository relies on.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Every open attempt emits exactly one terminal `db_open` event.

use super::DbResult;
use crate::config::{TablemapConfig, DEFAULT_BUSY_TIMEOUT_MS};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file with the default busy timeout.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_logged("file", DEFAULT_BUSY_TIMEOUT_MS, || Connection::open(path))
}

/// Opens a private in-memory SQLite database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_logged("memory", DEFAULT_BUSY_TIMEOUT_MS, Connection::open_in_memory)
}

/// Opens the database described by `config`.
///
/// `config.db_path == None` selects an in-memory database.
pub fn open_db_with(config: &TablemapConfig) -> DbResult<Connection> {
    match config.db_path.as_deref() {
        Some(path) => open_logged("file", config.busy_timeout_ms, || Connection::open(path)),
        None => open_logged(
            "memory",
            config.busy_timeout_ms,
            Connection::open_in_memory,
        ),
    }
}

fn open_logged(
    mode: &'static str,
    busy_timeout_ms: u64,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn, busy_timeout_ms) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

fn bootstrap_connection(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

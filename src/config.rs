/// Runtime configuration for the server binary
///
/// Resolved once at startup from command line flags.

use std::path::{Path, PathBuf};

use crate::domain::DayBoundary;

const APP_DIR: &str = "zenith_habits";
const DATABASE_FILE: &str = "habits.db";

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database: PathBuf,
    /// Where one calendar day ends and the next begins
    pub day_boundary: DayBoundary,
    /// Level for the `zenith_habits` log target
    pub log_level: &'static str,
}

impl Config {
    /// Build a config, resolving the database location when none is given
    pub fn resolve(
        database: Option<PathBuf>,
        day_boundary: DayBoundary,
        debug: bool,
        verbose: bool,
    ) -> std::io::Result<Self> {
        let database = match database {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                path
            }
            None => default_database_path()?,
        };

        Ok(Self {
            database,
            day_boundary,
            log_level: log_level(debug, verbose),
        })
    }

    /// Filter directive for `tracing_subscriber::EnvFilter`
    pub fn log_filter(&self) -> String {
        format!("zenith_habits={}", self.log_level)
    }
}

/// `--verbose` wins over `--debug`; quiet by default
pub fn log_level(debug: bool, verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else if debug {
        "info"
    } else {
        "warn"
    }
}

fn writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".write_probe");
    if std::fs::write(&probe, b"ok").is_ok() {
        let _ = std::fs::remove_file(&probe);
        true
    } else {
        false
    }
}

/// First writable location out of home, data dir, config dir and cwd,
/// falling back to the temp dir
pub fn default_database_path() -> std::io::Result<PathBuf> {
    let candidates = [
        dirs::home_dir().map(|p| p.join(format!(".{}", APP_DIR))),
        dirs::data_dir().map(|p| p.join(APP_DIR)),
        dirs::config_dir().map(|p| p.join(APP_DIR)),
        std::env::current_dir().ok().map(|p| p.join(format!(".{}", APP_DIR))),
    ];

    if let Some(dir) = candidates.iter().flatten().find(|dir| writable(dir)) {
        return Ok(dir.join(DATABASE_FILE));
    }

    let temp = std::env::temp_dir().join(APP_DIR);
    std::fs::create_dir_all(&temp)?;
    tracing::warn!("Using temporary directory for database: {}", temp.display());
    Ok(temp.join(DATABASE_FILE))
}

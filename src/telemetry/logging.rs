use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory receiving `territory.log`; stderr only when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

const LOG_FILE_NAME: &str = "territory.log";

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(config: &LogConfig) -> Result<(), String> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|err| format!("invalid log level '{}': {}", config.level, err))?;

    let file_layer = match config.dir.as_ref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|err| format!("log directory create failed: {}", err))?;
            let path = dir.join(LOG_FILE_NAME);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|err| format!("open log {} failed: {}", path.display(), err))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|err| format!("log system already initialized: {}", err))?;

    let _ = INSTALLED.set(());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_log_file_and_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = LogConfig {
            level: "debug".to_string(),
            dir: Some(dir.path().join("log")),
        };
        init(&config).expect("first init");
        init(&config).expect("second init");
        tracing::info!("logging test line");
        assert!(dir.path().join("log").join(LOG_FILE_NAME).exists());
    }
}

//! Tracing subscriber setup.
//!
//! Console output always goes to stdout. When `logging.file` is configured,
//! the same events are appended without ANSI colours to that file through a
//! non-blocking writer; the returned guard must stay alive until exit so the
//! writer can drain.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Open `path` for appending behind a background writer thread.
pub fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {:?}", path))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {:?}", dir))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("Failed to open log file: {:?}", path))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber.
pub fn init(filter: &str, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    let (file_layer, guard) = match file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(EnvFilter::new(filter))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_writer_appends_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "earlier line\n").unwrap();

        let (writer, guard) = file_writer(&path).unwrap();
        let subscriber = fmt::Subscriber::builder()
            .with_writer(writer)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(records = 3, "Expiry sweep finished");
        });
        drop(guard);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier line\n"));
        assert!(content.contains("Expiry sweep finished"));
        assert!(content.contains("records=3"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("imghost.log");

        let (_writer, _guard) = file_writer(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_file_writer_rejects_directory_path() {
        assert!(file_writer(Path::new("/")).is_err());
    }
}

//! Audit line sinks.

use crate::config::{AuditConfig, AuditOutput};
use crate::error::AuditError;
use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;

/// Trait for audit line destinations.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Write one fully formatted line.
    async fn write_line(&self, line: &str) -> Result<(), AuditError>;
}

/// Create a sink based on configuration.
pub fn create_sink(config: &AuditConfig) -> Result<Box<dyn AuditSink>, AuditError> {
    if !config.enabled {
        return Ok(Box::new(NullSink));
    }

    match config.output {
        AuditOutput::Tracing => Ok(Box::new(TracingSink)),
        AuditOutput::File => {
            let path = config.file_path.as_deref().unwrap_or("audit.log");
            Ok(Box::new(FileSink::new(path)?))
        }
        AuditOutput::Memory => Ok(Box::new(MemorySink::new())),
        AuditOutput::Null => Ok(Box::new(NullSink)),
    }
}

/// Emits each line as an `info` event under the `adminlog::audit` target.
pub struct TracingSink;

#[async_trait]
impl AuditSink for TracingSink {
    async fn write_line(&self, line: &str) -> Result<(), AuditError> {
        tracing::info!(target: "adminlog::audit", "{}", line);
        Ok(())
    }
}

/// Appends lines to a log file.
pub struct FileSink {
    path: String,
}

impl FileSink {
    /// Create a file sink, creating the file if it does not exist.
    pub fn new(path: &str) -> Result<Self, AuditError> {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self {
            path: path.to_string(),
        })
    }
}

#[async_trait]
impl AuditSink for FileSink {
    async fn write_line(&self, line: &str) -> Result<(), AuditError> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Keeps lines in memory, in write order.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Drop all collected lines.
    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn write_line(&self, line: &str) -> Result<(), AuditError> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|e| AuditError::SinkFailed(format!("Failed to acquire lock: {}", e)))?;
        lines.push(line.to_string());
        Ok(())
    }
}

/// Discards every line.
pub struct NullSink;

#[async_trait]
impl AuditSink for NullSink {
    async fn write_line(&self, _line: &str) -> Result<(), AuditError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.write_line("first").await.unwrap();
        sink.write_line("second").await.unwrap();

        assert_eq!(sink.lines(), vec!["first", "second"]);

        sink.clear();
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let sink = FileSink::new(path.to_str().unwrap()).unwrap();

        sink.write_line("[LogAOP][a]").await.unwrap();
        sink.write_line("[LogAOP][b]").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[LogAOP][a]\n[LogAOP][b]\n");
    }

    #[tokio::test]
    async fn test_disabled_config_yields_null_sink() {
        let config = AuditConfig {
            enabled: false,
            output: AuditOutput::File,
            file_path: Some("/nonexistent/dir/audit.log".to_string()),
            ..Default::default()
        };

        // The file is never opened when logging is disabled.
        let sink = create_sink(&config).unwrap();
        sink.write_line("ignored").await.unwrap();
    }
}

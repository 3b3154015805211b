// Metrics sinks: field registration upfront, then one record per emission

mod csv;
mod logging;
mod sqlite;

pub use csv::CsvSink;
pub use logging::LogSink;
pub use sqlite::SqliteSink;

use crate::config::{OutputConfig, OutputFormat};
use crate::error::SinkError;
use crate::models::{Field, Record};
use std::future::Future;

/// Receiver of collected records. Owned by the collector loop (single writer).
pub trait MetricsSink: Send {
    /// Declares every field the sink will see, in column order.
    fn register(&mut self, fields: &[Field]) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Persists or exports one record. Errors end the run.
    fn collect(&mut self, record: &Record) -> impl Future<Output = Result<(), SinkError>> + Send;

    fn flush(&mut self) -> impl Future<Output = Result<(), SinkError>> + Send {
        async { Ok(()) }
    }
}

/// Sink selected from `[output]` config.
pub enum OutputSink {
    Log(LogSink),
    Csv(CsvSink),
    Sqlite(SqliteSink),
}

impl OutputSink {
    /// No output name logs records; otherwise `<name>.csv` or `<name>.db`.
    pub async fn open(config: &OutputConfig) -> Result<Self, SinkError> {
        let Some(name) = config.name.as_deref().filter(|n| !n.is_empty()) else {
            return Ok(OutputSink::Log(LogSink::new()));
        };
        let sink = match config.format {
            OutputFormat::Csv => OutputSink::Csv(CsvSink::create(format!("{}.csv", name)).await?),
            OutputFormat::Sqlite => {
                OutputSink::Sqlite(SqliteSink::connect(&format!("{}.db", name)).await?)
            }
        };
        Ok(sink)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutputSink::Log(_) => "log",
            OutputSink::Csv(_) => "csv",
            OutputSink::Sqlite(_) => "sqlite",
        }
    }
}

impl MetricsSink for OutputSink {
    async fn register(&mut self, fields: &[Field]) -> Result<(), SinkError> {
        match self {
            OutputSink::Log(s) => s.register(fields).await,
            OutputSink::Csv(s) => s.register(fields).await,
            OutputSink::Sqlite(s) => s.register(fields).await,
        }
    }

    async fn collect(&mut self, record: &Record) -> Result<(), SinkError> {
        match self {
            OutputSink::Log(s) => s.collect(record).await,
            OutputSink::Csv(s) => s.collect(record).await,
            OutputSink::Sqlite(s) => s.collect(record).await,
        }
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        match self {
            OutputSink::Log(s) => s.flush().await,
            OutputSink::Csv(s) => s.flush().await,
            OutputSink::Sqlite(s) => s.flush().await,
        }
    }
}

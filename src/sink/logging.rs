// Records as structured log events (default when no output name is set)

use super::MetricsSink;
use crate::error::SinkError;
use crate::models::{Field, Record};

#[derive(Debug, Default)]
pub struct LogSink {
    fields: Vec<Field>,
    emitted: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl MetricsSink for LogSink {
    async fn register(&mut self, fields: &[Field]) -> Result<(), SinkError> {
        for field in fields {
            tracing::debug!(
                field = field.name(),
                description = field.description(),
                "field registered"
            );
        }
        self.fields = fields.to_vec();
        Ok(())
    }

    async fn collect(&mut self, record: &Record) -> Result<(), SinkError> {
        if self.fields.is_empty() {
            return Err(SinkError::NotRegistered);
        }
        let json = serde_json::to_string(&record.to_json())?;
        tracing::info!(target: "clusterstat::metrics", record = %json, "metrics");
        self.emitted += 1;
        Ok(())
    }
}

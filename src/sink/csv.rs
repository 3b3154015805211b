// CSV file output: header of registered field names, one row per record

use super::MetricsSink;
use crate::error::SinkError;
use crate::models::{Field, Record};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

pub struct CsvSink {
    path: PathBuf,
    writer: BufWriter<File>,
    columns: Vec<Field>,
}

impl CsvSink {
    /// Creates (or truncates) the file, including missing parent directories.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(&path).await?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            columns: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_line(&mut self, cells: &[String]) -> Result<(), SinkError> {
        let line = cells.join(",");
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }
}

impl MetricsSink for CsvSink {
    async fn register(&mut self, fields: &[Field]) -> Result<(), SinkError> {
        self.columns = fields.to_vec();
        let header: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
        self.write_line(&header).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn collect(&mut self, record: &Record) -> Result<(), SinkError> {
        if self.columns.is_empty() {
            return Err(SinkError::NotRegistered);
        }
        let row: Vec<String> = self
            .columns
            .iter()
            .map(|f| {
                record
                    .get(*f)
                    .map(|v| escape_cell(&v.to_string()))
                    .unwrap_or_default()
            })
            .collect();
        self.write_line(&row).await?;
        // Rows must survive the hard exit after the shutdown grace period.
        self.writer.flush().await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush().await?;
        Ok(())
    }
}

fn escape_cell(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

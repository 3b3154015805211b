// SQLite output: one wide `samples` table, a column per registered field

use super::MetricsSink;
use crate::error::SinkError;
use crate::models::{Field, FieldKind, FieldValue, Record};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub struct SqliteSink {
    pool: SqlitePool,
    columns: Vec<Field>,
    insert_sql: String,
}

impl SqliteSink {
    pub async fn connect(path: &str) -> Result<Self, SinkError> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self {
            pool,
            columns: Vec::new(),
            insert_sql: String::new(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[instrument(skip(self, fields), fields(sink = "sqlite", operation = "create_table", columns = fields.len()))]
    async fn create_table(&mut self, fields: &[Field]) -> Result<(), SinkError> {
        let columns: Vec<String> = fields
            .iter()
            .map(|f| format!("\"{}\" {}", f.name(), sql_type(f.kind())))
            .collect();
        let create = format!(
            "CREATE TABLE IF NOT EXISTS samples (id INTEGER PRIMARY KEY AUTOINCREMENT, {})",
            columns.join(", ")
        );
        sqlx::query(&create).execute(&self.pool).await?;

        if fields.contains(&Field::Node) && fields.contains(&Field::Timestamp) {
            sqlx::query(
                "CREATE INDEX IF NOT EXISTS idx_samples_node_timestamp ON samples(\"HId\", \"timestamp\")",
            )
            .execute(&self.pool)
            .await?;
        }

        let names: Vec<String> = fields.iter().map(|f| format!("\"{}\"", f.name())).collect();
        let params = vec!["?"; fields.len()];
        self.insert_sql = format!(
            "INSERT INTO samples ({}) VALUES ({})",
            names.join(", "),
            params.join(", ")
        );
        self.columns = fields.to_vec();
        Ok(())
    }

    #[instrument(skip(self, record), fields(sink = "sqlite", operation = "insert_record"))]
    async fn insert_record(&self, record: &Record) -> Result<(), SinkError> {
        let mut query = sqlx::query(&self.insert_sql);
        for field in &self.columns {
            query = match record.get(*field) {
                Some(FieldValue::Integer(i)) => query.bind(*i),
                Some(FieldValue::Real(r)) => query.bind(*r),
                Some(FieldValue::Text(s)) => query.bind(s.clone()),
                None => query.bind(None::<f64>),
            };
        }
        query.execute(&self.pool).await?;
        Ok(())
    }
}

fn sql_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Integer => "INTEGER",
        FieldKind::Real => "REAL",
        FieldKind::Text => "TEXT",
    }
}

impl MetricsSink for SqliteSink {
    async fn register(&mut self, fields: &[Field]) -> Result<(), SinkError> {
        self.create_table(fields).await
    }

    async fn collect(&mut self, record: &Record) -> Result<(), SinkError> {
        if self.columns.is_empty() {
            return Err(SinkError::NotRegistered);
        }
        self.insert_record(record).await
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

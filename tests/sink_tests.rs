// Sink tests: CSV rows, SQLite rows, registration ordering, output selection

use clusterstat::config::{OutputConfig, OutputFormat};
use clusterstat::error::SinkError;
use clusterstat::models::{Field, Record};
use clusterstat::sink::{CsvSink, LogSink, MetricsSink, OutputSink, SqliteSink};
use sqlx::Row;

fn resource_record(ts: i64, node: &str, user: f64) -> Record {
    Record::new(ts, node)
        .with(Field::CpuUser, user)
        .with(Field::MemUsage, 0.5)
}

fn container_record(ts: i64, node: &str) -> Record {
    Record::new(ts, node)
        .with(Field::DockerRunning, 2i64)
        .with(Field::DockerPaused, 0i64)
        .with(Field::DockerTotal, 3i64)
}

#[tokio::test]
async fn test_csv_writes_header_and_rows_with_empty_cells() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("out").join("run.csv");
    let mut sink = CsvSink::create(&path).await.unwrap();
    assert_eq!(sink.path(), path.as_path());
    sink.register(&Field::ALL).await.unwrap();
    sink.collect(&resource_record(100, "n1", 1.5)).await.unwrap();
    sink.collect(&container_record(101, "n2")).await.unwrap();
    sink.flush().await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);

    let header: Vec<&str> = lines[0].split(',').collect();
    assert_eq!(header.len(), Field::ALL.len());
    assert_eq!(header[0], "timestamp");
    assert_eq!(header[1], "HId");
    assert_eq!(*header.last().unwrap(), "docker_total");

    let first: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(first.len(), Field::ALL.len());
    assert_eq!(first[0], "100");
    assert_eq!(first[1], "n1");
    assert_eq!(first[2], "1.5");
    assert_eq!(*first.last().unwrap(), "");

    let second: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(second[1], "n2");
    assert_eq!(second[2], "");
    assert_eq!(*second.last().unwrap(), "3");
}

#[tokio::test]
async fn test_csv_rejects_records_before_register() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut sink = CsvSink::create(dir.path().join("x.csv")).await.unwrap();
    let err = sink.collect(&resource_record(1, "n1", 1.0)).await.unwrap_err();
    assert!(matches!(err, SinkError::NotRegistered));
}

#[tokio::test]
async fn test_sqlite_inserts_rows_with_nulls_for_missing_fields() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("run.db");
    let mut sink = SqliteSink::connect(path.to_str().unwrap()).await.unwrap();
    sink.register(&Field::ALL).await.unwrap();
    sink.collect(&resource_record(100, "n1", 2.5)).await.unwrap();
    sink.collect(&container_record(101, "n1")).await.unwrap();
    sink.collect(&resource_record(102, "n2", 4.0)).await.unwrap();
    sink.flush().await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM samples")
        .fetch_one(sink.pool())
        .await
        .unwrap();
    assert_eq!(count, 3);

    let rows = sqlx::query(
        "SELECT \"timestamp\", \"HId\", cpu_user, docker_total FROM samples ORDER BY id",
    )
    .fetch_all(sink.pool())
    .await
    .unwrap();
    assert_eq!(rows[0].get::<i64, _>("timestamp"), 100);
    assert_eq!(rows[0].get::<String, _>("HId"), "n1");
    assert_eq!(rows[0].get::<Option<f64>, _>("cpu_user"), Some(2.5));
    assert_eq!(rows[0].get::<Option<i64>, _>("docker_total"), None);
    assert_eq!(rows[1].get::<Option<f64>, _>("cpu_user"), None);
    assert_eq!(rows[1].get::<Option<i64>, _>("docker_total"), Some(3));
    assert_eq!(rows[2].get::<String, _>("HId"), "n2");
}

#[tokio::test]
async fn test_sqlite_rejects_records_before_register() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("x.db");
    let mut sink = SqliteSink::connect(path.to_str().unwrap()).await.unwrap();
    let err = sink.collect(&resource_record(1, "n1", 1.0)).await.unwrap_err();
    assert!(matches!(err, SinkError::NotRegistered));
}

#[tokio::test]
async fn test_log_sink_counts_emitted_records() {
    let mut sink = LogSink::new();
    assert!(matches!(
        sink.collect(&resource_record(1, "n1", 1.0)).await,
        Err(SinkError::NotRegistered)
    ));
    sink.register(&Field::ALL).await.unwrap();
    sink.collect(&resource_record(1, "n1", 1.0)).await.unwrap();
    sink.collect(&container_record(2, "n1")).await.unwrap();
    assert_eq!(sink.emitted(), 2);
}

#[tokio::test]
async fn test_output_without_name_logs() {
    let sink = OutputSink::open(&OutputConfig::default()).await.unwrap();
    assert_eq!(sink.kind(), "log");

    let empty = OutputConfig {
        name: Some(String::new()),
        format: OutputFormat::Sqlite,
    };
    assert_eq!(OutputSink::open(&empty).await.unwrap().kind(), "log");
}

#[tokio::test]
async fn test_output_name_selects_file_by_format() {
    let dir = tempfile::TempDir::new().unwrap();
    let stem = dir.path().join("run");
    let stem = stem.to_str().unwrap().to_string();

    let mut csv = OutputSink::open(&OutputConfig {
        name: Some(stem.clone()),
        format: OutputFormat::Csv,
    })
    .await
    .unwrap();
    assert_eq!(csv.kind(), "csv");
    csv.register(&Field::ALL).await.unwrap();
    assert!(dir.path().join("run.csv").exists());

    let sqlite = OutputSink::open(&OutputConfig {
        name: Some(stem),
        format: OutputFormat::Sqlite,
    })
    .await
    .unwrap();
    assert_eq!(sqlite.kind(), "sqlite");
    assert!(dir.path().join("run.db").exists());
}

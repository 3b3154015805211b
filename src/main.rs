use anyhow::Result;
use clap::Parser;
use clusterstat::collector::{Collector, CollectorSettings};
use clusterstat::sink::OutputSink;
use clusterstat::sources::RemoteEndpoints;
use clusterstat::*;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let cli = cli::Cli::parse();
    let mut app_config = config::AppConfig::read(cli.config.as_deref())?;
    cli.apply(&mut app_config)?;
    app_config.validate()?;

    let nodes = app_config.node_list();
    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        nodes = ?nodes,
        "starting"
    );

    let sink = OutputSink::open(&app_config.output).await?;
    tracing::info!(sink = sink.kind(), "output ready");
    let endpoints = RemoteEndpoints::new(
        app_config.resource.port,
        app_config.containers.port,
        app_config.request_timeout(),
    )?;

    let cancel = CancellationToken::new();
    let grace_period = app_config.grace_period();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Received shutdown signal");
        signal_cancel.cancel();
        tokio::time::sleep(grace_period).await;
        tracing::warn!(
            grace_period_ms = grace_period.as_millis() as u64,
            "grace period elapsed; exiting"
        );
        std::process::exit(1);
    });

    let settings = CollectorSettings {
        interval: app_config.interval(),
        timeout: app_config.timeout(),
        collect_containers: app_config.containers.enabled,
        container_filters: app_config.containers.filters.clone(),
        stats_log_interval: app_config.stats_log_interval(),
    };
    let running = Collector::new(nodes, settings, endpoints)
        .with_sink(sink)
        .start(cancel.clone())
        .await?;
    let report = running.run().await?;

    tracing::info!(
        nodes_seen = report.nodes.len(),
        resource_snapshots = report.counters.resource_snapshots,
        container_snapshots = report.counters.container_snapshots,
        errors = report.counters.errors,
        "collection finished"
    );
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

// Collection orchestrator. Setup starts one poller pair per node; the running
// loop is the single consumer of every snapshot and error and the only owner of
// per-node statistics.

use crate::aggregator::{NodeStats, NodeTable};
use crate::docker_repo::ContainerFilters;
use crate::error::{SetupError, SinkError};
use crate::models::{ContainerSnapshot, ErrorEvent, Field, Record, ResourceSnapshot, SourceKind};
use crate::poller::{PollerContext, run_container_poller, run_resource_poller};
use crate::reducer::{self, RESOURCE_ALLOW_LIST};
use crate::sink::MetricsSink;
use crate::sources::Endpoints;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Snapshot channels hold at most one item so a slow consumer stalls the emitting poller.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 1;
const ERROR_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub interval: Duration,
    /// Run ends on its own after this long.
    pub timeout: Option<Duration>,
    pub collect_containers: bool,
    pub container_filters: ContainerFilters,
    pub stats_log_interval: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: None,
            collect_containers: true,
            container_filters: ContainerFilters::new(),
            stats_log_interval: Duration::from_secs(60),
        }
    }
}

/// Setup state: nodes, settings and (hopefully) a sink.
pub struct Collector<E, S> {
    nodes: Vec<String>,
    settings: CollectorSettings,
    endpoints: E,
    sink: Option<S>,
}

impl<E: Endpoints, S: MetricsSink> Collector<E, S> {
    pub fn new(nodes: Vec<String>, settings: CollectorSettings, endpoints: E) -> Self {
        Self {
            nodes,
            settings,
            endpoints,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: S) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validates the sink, registers every field with it, then spawns the pollers.
    /// Nothing is polled if this fails.
    pub async fn start(
        self,
        cancel: CancellationToken,
    ) -> Result<RunningCollector<S>, SetupError> {
        let Collector {
            nodes,
            settings,
            endpoints,
            sink,
        } = self;
        let mut sink = sink.ok_or(SetupError::MissingSink)?;
        if nodes.is_empty() {
            return Err(SetupError::NoNodes);
        }
        sink.register(&Field::ALL)
            .await
            .map_err(SetupError::Register)?;

        let (resource_tx, resource_rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let (container_tx, container_rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let mut counters = RunCounters::default();

        for node in &nodes {
            let ctx = PollerContext::new(node, settings.interval, error_tx.clone(), cancel.clone());
            tokio::spawn(run_resource_poller(
                ctx.clone(),
                endpoints.resource(node),
                RESOURCE_ALLOW_LIST,
                resource_tx.clone(),
            ));

            if !settings.collect_containers {
                continue;
            }
            match endpoints.containers(node) {
                Ok(source) => {
                    tokio::spawn(run_container_poller(
                        ctx,
                        source,
                        settings.container_filters.clone(),
                        container_tx.clone(),
                    ));
                }
                Err(cause) => {
                    report_error(&ErrorEvent {
                        node: node.clone(),
                        source: SourceKind::Container,
                        cause,
                    });
                    counters.errors += 1;
                }
            }
        }

        info!(
            nodes = nodes.len(),
            collect_containers = settings.collect_containers,
            interval_ms = settings.interval.as_millis() as u64,
            "collection started"
        );

        Ok(RunningCollector {
            sink,
            table: NodeTable::new(),
            resource_rx,
            container_rx,
            error_rx,
            cancel,
            timeout: settings.timeout,
            stats_log_interval: settings.stats_log_interval,
            counters,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub resource_snapshots: u64,
    pub container_snapshots: u64,
    pub errors: u64,
}

/// Result of a finished run.
#[derive(Debug)]
pub struct CollectionReport {
    pub nodes: HashMap<String, NodeStats>,
    pub counters: RunCounters,
}

/// Running state. Consumed by [`RunningCollector::run`]; returning from it is the stopped state.
pub struct RunningCollector<S> {
    sink: S,
    table: NodeTable,
    resource_rx: mpsc::Receiver<ResourceSnapshot>,
    container_rx: mpsc::Receiver<ContainerSnapshot>,
    error_rx: mpsc::Receiver<ErrorEvent>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
    stats_log_interval: Duration,
    counters: RunCounters,
}

impl<S: MetricsSink> RunningCollector<S> {
    /// Fan-in loop. Returns on cancellation or timeout; a sink error cancels every poller and is returned.
    pub async fn run(self) -> Result<CollectionReport, SinkError> {
        let RunningCollector {
            mut sink,
            mut table,
            mut resource_rx,
            mut container_rx,
            mut error_rx,
            cancel,
            timeout,
            stats_log_interval,
            mut counters,
        } = self;

        let expiry = async move {
            match timeout {
                Some(t) => sleep(t).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expiry);
        let mut stats_log_tick = interval(stats_log_interval.max(Duration::from_millis(1)));
        stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        stats_log_tick.reset();

        let outcome: Result<(), SinkError> = loop {
            // Stop signals win; the data channels are picked at random when several are ready.
            let inbound = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("collection cancelled");
                    break Ok(());
                }
                _ = &mut expiry => {
                    info!("collection timeout reached");
                    cancel.cancel();
                    break Ok(());
                }
                inbound = async {
                    tokio::select! {
                        Some(snapshot) = resource_rx.recv() => Inbound::Resource(snapshot),
                        Some(snapshot) = container_rx.recv() => Inbound::Container(snapshot),
                        Some(event) = error_rx.recv() => Inbound::Error(event),
                        _ = stats_log_tick.tick() => Inbound::StatsTick,
                    }
                } => inbound,
            };

            match inbound {
                Inbound::Resource(snapshot) => {
                    counters.resource_snapshots += 1;
                    let sample = reducer::reduce(&snapshot.families);
                    let record = table.ingest(&snapshot.node, &sample).to_record(now_unix());
                    if let Err(e) = sink.collect(&record).await {
                        break Err(e);
                    }
                }
                Inbound::Container(snapshot) => {
                    counters.container_snapshots += 1;
                    let record = container_record(&snapshot, now_unix());
                    if let Err(e) = sink.collect(&record).await {
                        break Err(e);
                    }
                }
                Inbound::Error(event) => {
                    counters.errors += 1;
                    report_error(&event);
                }
                Inbound::StatsTick => {
                    info!(
                        nodes_seen = table.len(),
                        resource_snapshots = counters.resource_snapshots,
                        container_snapshots = counters.container_snapshots,
                        errors = counters.errors,
                        "collection stats"
                    );
                }
            }
        };

        if let Err(e) = outcome {
            warn!(error = %e, operation = "sink_collect", "sink failed; stopping collection");
            cancel.cancel();
            return Err(e);
        }
        sink.flush().await?;
        debug!("collector stopped");

        Ok(CollectionReport {
            nodes: table.into_inner(),
            counters,
        })
    }
}

/// One item taken off the fan-in channels.
enum Inbound {
    Resource(ResourceSnapshot),
    Container(ContainerSnapshot),
    Error(ErrorEvent),
    StatsTick,
}

/// Container snapshots bypass aggregation.
pub fn container_record(snapshot: &ContainerSnapshot, timestamp: i64) -> Record {
    Record::new(timestamp, &snapshot.node)
        .with(Field::DockerRunning, snapshot.counts.running)
        .with(Field::DockerPaused, snapshot.counts.paused)
        .with(Field::DockerTotal, snapshot.counts.total)
}

fn report_error(event: &ErrorEvent) {
    warn!(
        node = %event.node,
        source = %event.source,
        error = %event.cause,
        "poll failed"
    );
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

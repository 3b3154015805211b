// Per-node poll loops. Each cycle: poll once, emit a snapshot or an error, then
// wait for the interval or cancellation. Nothing is emitted after cancellation.

use crate::docker_repo::ContainerFilters;
use crate::error::PollError;
use crate::exposition::{self, MetricFamilies};
use crate::models::{ContainerCounts, ContainerSnapshot, ErrorEvent, ResourceSnapshot, SourceKind};
use crate::sources::{ContainerSource, ResourceSource};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// What every poll loop shares: identity, cadence, the error channel and the stop signal.
#[derive(Clone)]
pub struct PollerContext {
    pub node: String,
    pub interval: Duration,
    pub errors: mpsc::Sender<ErrorEvent>,
    pub cancel: CancellationToken,
}

impl PollerContext {
    pub fn new(
        node: &str,
        interval: Duration,
        errors: mpsc::Sender<ErrorEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            node: node.to_string(),
            interval,
            errors,
            cancel,
        }
    }

    /// Blocks until the consumer takes `item`. False once cancelled or the consumer is gone.
    async fn emit<T: Send>(&self, tx: &mpsc::Sender<T>, item: T) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = tx.send(item) => sent.is_ok(),
        }
    }

    async fn report(&self, source: SourceKind, cause: PollError) -> bool {
        debug!(error = %cause, "poll cycle failed");
        let event = ErrorEvent {
            node: self.node.clone(),
            source,
            cause,
        };
        self.emit(&self.errors, event).await
    }

    /// False if cancelled before the interval elapsed.
    async fn wait(&self) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = sleep(self.interval) => true,
        }
    }
}

/// Fetch, parse and keep only allow-listed families.
async fn scrape<R: ResourceSource>(
    source: &R,
    allow_list: &[&str],
) -> Result<MetricFamilies, PollError> {
    let body = source.fetch().await?;
    let families = exposition::parse(&body)?;
    Ok(exposition::retain_allowed(families, allow_list))
}

#[instrument(skip_all, fields(node = %ctx.node, source = "resource"))]
pub async fn run_resource_poller<R: ResourceSource>(
    ctx: PollerContext,
    source: R,
    allow_list: &'static [&'static str],
    tx: mpsc::Sender<ResourceSnapshot>,
) {
    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let scraped = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            result = scrape(&source, allow_list) => result,
        };
        let delivered = match scraped {
            Ok(families) => {
                debug!(families = families.len(), "resource snapshot");
                let snapshot = ResourceSnapshot {
                    node: ctx.node.clone(),
                    families,
                };
                ctx.emit(&tx, snapshot).await
            }
            Err(cause) => ctx.report(SourceKind::Resource, cause).await,
        };
        if !delivered || !ctx.wait().await {
            break;
        }
    }
    debug!("resource poller stopped");
}

#[instrument(skip_all, fields(node = %ctx.node, source = "container"))]
pub async fn run_container_poller<C: ContainerSource>(
    ctx: PollerContext,
    source: C,
    filters: ContainerFilters,
    tx: mpsc::Sender<ContainerSnapshot>,
) {
    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let listed = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            result = source.list_states(&filters) => result,
        };
        let delivered = match listed {
            Ok(states) => {
                let counts = ContainerCounts::tally(states);
                debug!(
                    running = counts.running,
                    paused = counts.paused,
                    total = counts.total,
                    "container snapshot"
                );
                let snapshot = ContainerSnapshot {
                    node: ctx.node.clone(),
                    counts,
                };
                ctx.emit(&tx, snapshot).await
            }
            Err(cause) => ctx.report(SourceKind::Container, cause).await,
        };
        if !delivered || !ctx.wait().await {
            break;
        }
    }
    debug!("container poller stopped");
}

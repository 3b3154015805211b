// Shared test helpers: scripted sources, fake endpoints, a channel-backed sink

#![allow(dead_code)]

use clusterstat::docker_repo::ContainerFilters;
use clusterstat::error::{PollError, SinkError};
use clusterstat::models::{ContainerState, Field, Record};
use clusterstat::sink::MetricsSink;
use clusterstat::sources::{ContainerSource, Endpoints, ResourceSource};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Exposition body with the given cpu user/system seconds split over two cpus.
pub fn exposition_body(cpu_user: f64, forks: f64, mem_available: f64, mem_total: f64) -> String {
    format!(
        "# TYPE node_cpu counter\n\
         node_cpu{{cpu=\"cpu0\",mode=\"user\"}} {}\n\
         node_cpu{{cpu=\"cpu1\",mode=\"user\"}} 0\n\
         node_cpu{{cpu=\"cpu0\",mode=\"idle\"}} 100\n\
         # TYPE node_forks_total counter\n\
         node_forks_total {}\n\
         # TYPE node_memory_MemAvailable gauge\n\
         node_memory_MemAvailable {}\n\
         # TYPE node_memory_MemTotal gauge\n\
         node_memory_MemTotal {}\n\
         # TYPE node_unrelated gauge\n\
         node_unrelated 99\n",
        cpu_user, forks, mem_available, mem_total
    )
}

/// Resource source that replays scripted outcomes, then repeats the last one forever.
#[derive(Clone)]
pub struct ScriptedResource {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    last: Arc<Mutex<Result<String, String>>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResource {
    pub fn new(outcomes: Vec<Result<String, String>>) -> Self {
        let last = outcomes
            .last()
            .cloned()
            .unwrap_or_else(|| Err("no script".to_string()));
        Self {
            script: Arc::new(Mutex::new(outcomes.into())),
            last: Arc::new(Mutex::new(last)),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn ok(body: String) -> Self {
        Self::new(vec![Ok(body)])
    }

    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ResourceSource for ScriptedResource {
    async fn fetch(&self) -> Result<String, PollError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        let outcome = match next {
            Some(outcome) => outcome,
            None => self.last.lock().unwrap().clone(),
        };
        outcome.map_err(PollError::Other)
    }
}

#[derive(Clone)]
pub struct FixedContainers {
    outcome: Result<Vec<ContainerState>, String>,
    seen_filters: Arc<Mutex<Vec<ContainerFilters>>>,
    calls: Arc<AtomicUsize>,
}

impl FixedContainers {
    pub fn new(states: Vec<ContainerState>) -> Self {
        Self {
            outcome: Ok(states),
            seen_filters: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            seen_filters: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_filters(&self) -> Vec<ContainerFilters> {
        self.seen_filters.lock().unwrap().clone()
    }
}

impl ContainerSource for FixedContainers {
    async fn list_states(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerState>, PollError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_filters.lock().unwrap().push(filters.clone());
        self.outcome.clone().map_err(PollError::Other)
    }
}

/// Per-node fakes. Unknown nodes get a failing resource and no engine.
#[derive(Default)]
pub struct FakeEndpoints {
    pub resources: HashMap<String, ScriptedResource>,
    pub containers: HashMap<String, FixedContainers>,
}

impl FakeEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(mut self, node: &str, source: ScriptedResource) -> Self {
        self.resources.insert(node.to_string(), source);
        self
    }

    pub fn containers(mut self, node: &str, source: FixedContainers) -> Self {
        self.containers.insert(node.to_string(), source);
        self
    }
}

impl Endpoints for FakeEndpoints {
    type Resource = ScriptedResource;
    type Containers = FixedContainers;

    fn resource(&self, node: &str) -> ScriptedResource {
        self.resources
            .get(node)
            .cloned()
            .unwrap_or_else(|| ScriptedResource::failing("unknown node"))
    }

    fn containers(&self, node: &str) -> Result<FixedContainers, PollError> {
        self.containers
            .get(node)
            .cloned()
            .ok_or_else(|| PollError::Other(format!("no engine for {}", node)))
    }
}

/// Sink that forwards every record to a channel the test reads from.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Record>,
    pub registered: Arc<Mutex<Vec<Field>>>,
    fail_register: bool,
    fail_collect_after: Option<usize>,
    collected: usize,
    delay: Duration,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Record>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                registered: Arc::new(Mutex::new(Vec::new())),
                fail_register: false,
                fail_collect_after: None,
                collected: 0,
                delay: Duration::ZERO,
            },
            rx,
        )
    }

    pub fn failing_register(mut self) -> Self {
        self.fail_register = true;
        self
    }

    /// Every collect takes at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Accepts `n` records, then every collect fails.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_collect_after = Some(n);
        self
    }
}

impl MetricsSink for ChannelSink {
    async fn register(&mut self, fields: &[Field]) -> Result<(), SinkError> {
        if self.fail_register {
            return Err(SinkError::Other("register refused".into()));
        }
        self.registered.lock().unwrap().extend_from_slice(fields);
        Ok(())
    }

    async fn collect(&mut self, record: &Record) -> Result<(), SinkError> {
        if self.fail_collect_after.is_some_and(|n| self.collected >= n) {
            return Err(SinkError::Other("sink full".into()));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.collected += 1;
        let _ = self.tx.send(record.clone());
        Ok(())
    }
}

/// Receive the next record for `node`, skipping others; panics after `within`.
pub async fn next_record_for(
    rx: &mut mpsc::UnboundedReceiver<Record>,
    node: &str,
    within: Duration,
) -> Record {
    tokio::time::timeout(within, async {
        loop {
            let record = rx.recv().await.expect("sink channel closed");
            if record.get(Field::Node).map(|v| v.to_string()).as_deref() == Some(node) {
                return record;
            }
        }
    })
    .await
    .expect("timed out waiting for record")
}

pub fn real(record: &Record, field: Field) -> f64 {
    record
        .get(field)
        .and_then(|v| v.as_f64())
        .unwrap_or_else(|| panic!("missing {}", field))
}

// Aggregator tests: creation, old-minus-new deltas, memory ratio, record shape

use clusterstat::aggregator::{NodeStats, NodeTable};
use clusterstat::models::{Field, FieldValue};
use clusterstat::reducer::{CpuModes, ResourceSample};

fn sample(user: f64, forks: f64, available: f64, total: f64) -> ResourceSample {
    ResourceSample {
        cpu: CpuModes {
            user,
            system: 2.0,
            idle: 50.0,
            iowait: 1.0,
        },
        forks,
        disk: 1.0,
        load: 0.3,
        mem_available: available,
        mem_total: total,
        net_received: 10.0,
        net_transmitted: 20.0,
    }
}

#[test]
fn test_create_seeds_current_values_with_zero_deltas() {
    let s = sample(5.0, 100.0, 3.0, 4.0);
    let stats = NodeStats::create("n1", &s);
    assert_eq!(stats.node, "n1");
    assert_eq!(stats.current, s);
    assert_eq!(stats.cpu_delta, CpuModes::default());
    assert_eq!(stats.forks_delta, 0.0);
    assert_eq!(stats.mem_usage, 0.75);
}

#[test]
fn test_update_computes_old_minus_new() {
    let mut stats = NodeStats::create("n1", &sample(5.0, 100.0, 3.0, 4.0));
    stats.update(&sample(3.0, 110.0, 3.0, 4.0));
    assert_eq!(stats.cpu_delta.user, 2.0);
    assert_eq!(stats.current.cpu.user, 3.0);
    assert_eq!(stats.forks_delta, -10.0);
    assert_eq!(stats.current.forks, 110.0);
    assert_eq!(stats.cpu_delta.system, 0.0);
}

#[test]
fn test_update_memory_ratio_uses_new_sample_only() {
    let mut stats = NodeStats::create("n1", &sample(1.0, 1.0, 1.0, 100.0));
    stats.update(&sample(1.0, 1.0, 30.0, 60.0));
    assert_eq!(stats.mem_usage, 0.5);
    assert_eq!(stats.current.mem_available, 30.0);
    assert_eq!(stats.current.mem_total, 60.0);
}

#[test]
fn test_update_with_zero_total_memory_is_zero_ratio() {
    let mut stats = NodeStats::create("n1", &sample(1.0, 1.0, 1.0, 2.0));
    stats.update(&sample(1.0, 1.0, 0.0, 0.0));
    assert_eq!(stats.mem_usage, 0.0);
}

#[test]
fn test_table_creates_once_then_updates() {
    let mut table = NodeTable::new();
    assert!(table.is_empty());

    let first = table.ingest("n1", &sample(5.0, 0.0, 1.0, 2.0)).clone();
    assert_eq!(first.cpu_delta.user, 0.0);

    let second = table.ingest("n1", &sample(3.0, 0.0, 1.0, 2.0)).clone();
    assert_eq!(second.cpu_delta.user, 2.0);

    table.ingest("n2", &sample(9.0, 0.0, 1.0, 2.0));
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("n2").unwrap().cpu_delta.user, 0.0);
}

#[test]
fn test_record_carries_timestamp_node_and_every_resource_field() {
    let stats = NodeStats::create("n1", &sample(5.0, 7.0, 1.0, 2.0));
    let record = stats.to_record(1_700_000_000);
    assert_eq!(record.get(Field::Timestamp), Some(&FieldValue::Integer(1_700_000_000)));
    assert_eq!(record.get(Field::Node), Some(&FieldValue::Text("n1".into())));
    assert_eq!(record.get(Field::Forks), Some(&FieldValue::Real(7.0)));
    assert_eq!(record.get(Field::MemUsage), Some(&FieldValue::Real(0.5)));
    assert!(record.get(Field::DockerTotal).is_none());
    // Everything except the three docker fields.
    assert_eq!(record.len(), Field::ALL.len() - 3);
}

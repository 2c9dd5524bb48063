//! End-to-end scenarios over the in-process loopback fabric.

use std::time::Duration;

use mcast_bench::harness::{BenchConfig, Fabric, Harness};
use mcast_bench::transport::memory::MemoryBroker;

fn base_config() -> BenchConfig {
    BenchConfig {
        // keep the window from reporting (and resetting) mid-test
        sampling_interval: Duration::from_secs(3600),
        ..Default::default()
    }
}

#[tokio::test]
async fn bounded_run_delivers_every_send() {
    let cfg = BenchConfig {
        producer_count: 2,
        consumer_count: 1,
        message_limit: 5,
        time_limit: Duration::from_millis(600),
        ..base_config()
    };
    let harness = Harness::new(cfg, Fabric::Memory(MemoryBroker::new()));
    let stats = harness.stats();
    harness.run().await.unwrap();

    // the message bound is inclusive: a limit of 5 permits 6 sends, so two
    // producers put 12 messages on the consumer's queue
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.msg_count, 12);
    assert_eq!(snapshot.latency_count, 12);
    assert!(snapshot.min_latency > 0);
    assert!(snapshot.max_latency >= snapshot.min_latency);
}

#[tokio::test]
async fn shared_connection_multicasts_to_every_consumer() {
    let cfg = BenchConfig {
        producer_count: 1,
        consumer_count: 3,
        share_connections: true,
        message_limit: 10,
        time_limit: Duration::from_millis(600),
        ..base_config()
    };
    let harness = Harness::new(cfg, Fabric::Memory(MemoryBroker::new()));
    let stats = harness.stats();
    harness.run().await.unwrap();

    // 11 sends fan out to three bound queues
    assert_eq!(stats.snapshot().msg_count, 33);
}

#[tokio::test]
async fn time_bound_stops_a_rate_limited_producer() {
    let cfg = BenchConfig {
        rate_limit: 1000,
        time_limit: Duration::from_millis(300),
        ..base_config()
    };
    let harness = Harness::new(cfg, Fabric::Memory(MemoryBroker::new()));
    let stats = harness.stats();
    let started = std::time::Instant::now();
    harness.run().await.unwrap();

    // producer and consumer both stop on their own 300 ms bound
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_secs(5));

    // ~300 messages at 1000 msg/s; allow generous slack for slow machines
    let received = stats.snapshot().msg_count;
    assert!(received > 0, "expected some deliveries, got none");
    assert!(received <= 400, "pacing overshot: {received} deliveries");
}

#[tokio::test]
async fn prefetch_and_manual_ack_run_completes() {
    let cfg = BenchConfig {
        message_limit: 50,
        prefetch_count: 10,
        auto_ack: false,
        time_limit: Duration::from_millis(600),
        ..base_config()
    };
    let harness = Harness::new(cfg, Fabric::Memory(MemoryBroker::new()));
    let stats = harness.stats();
    harness.run().await.unwrap();

    assert_eq!(stats.snapshot().msg_count, 51);
}

#[tokio::test]
async fn transactional_batches_run_completes() {
    let cfg = BenchConfig {
        message_limit: 20,
        producer_tx_size: 10,
        consumer_tx_size: 5,
        time_limit: Duration::from_millis(600),
        ..base_config()
    };
    let harness = Harness::new(cfg, Fabric::Memory(MemoryBroker::new()));
    let stats = harness.stats();
    harness.run().await.unwrap();

    assert_eq!(stats.snapshot().msg_count, 21);
}

#[tokio::test]
async fn mandatory_flag_run_with_no_consumers_completes() {
    let cfg = BenchConfig {
        consumer_count: 0,
        message_limit: 5,
        flags: vec!["mandatory".to_string()],
        time_limit: Duration::from_millis(600),
        ..base_config()
    };
    let harness = Harness::new(cfg, Fabric::Memory(MemoryBroker::new()));
    harness.run().await.unwrap();
}

use super::*;

#[test]
fn run_ids_are_unique_per_harness() {
    let a = Harness::new(BenchConfig::default(), Fabric::Memory(MemoryBroker::new()));
    let b = Harness::new(BenchConfig::default(), Fabric::Memory(MemoryBroker::new()));
    assert_ne!(a.run_id(), b.run_id());
}

#[tokio::test]
async fn empty_run_completes() {
    let cfg = BenchConfig {
        producer_count: 0,
        consumer_count: 0,
        ..Default::default()
    };
    let harness = Harness::new(cfg, Fabric::Memory(MemoryBroker::new()));
    harness.run().await.unwrap();
    assert_eq!(harness.stats().snapshot().msg_count, 0);
}

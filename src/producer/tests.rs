use super::*;
use std::sync::Arc;
use std::time::Instant;

use tokio::time::timeout;

use crate::transport::memory::{MemoryBroker, MemoryConnection};
use crate::transport::Channel;

#[test]
fn zero_rate_never_pauses() {
    assert_eq!(compute_delay(0, 1_000_000, Duration::ZERO), Duration::ZERO);
    assert_eq!(compute_delay(0, 0, Duration::from_secs(10)), Duration::ZERO);
}

#[test]
fn delay_is_never_negative() {
    // far behind schedule: 10 messages at 5000 msg/s should take 2 ms,
    // but a full second has already elapsed
    assert_eq!(
        compute_delay(5000, 10, Duration::from_secs(1)),
        Duration::ZERO
    );
}

#[test]
fn delay_converges_on_target_rate() {
    // 200 messages at 5000 msg/s should have taken 40 ms; only 10 ms have
    // elapsed, so pause for the remaining 30 ms
    assert_eq!(
        compute_delay(5000, 200, Duration::from_millis(10)),
        Duration::from_millis(30)
    );
}

#[test]
fn return_counter_drains_on_take() {
    let counter = ReturnCounter::default();
    counter.log_return();
    counter.log_return();
    assert_eq!(counter.take(), 2);
    assert_eq!(counter.take(), 0);
}

#[test]
fn pacer_reports_and_resets_window() {
    let returns = Arc::new(ReturnCounter::default());
    let mut pacer = Pacer::new(1, Duration::from_millis(10), returns);
    let start = Instant::now();
    pacer.reset_window(start);
    pacer.record_send();
    pacer.record_send();

    // crossing the interval reports and resets; the pause still reflects the
    // pre-reset backlog (2 messages at 1 msg/s => 2000 ms expected)
    let pause = pacer.check_in(start + Duration::from_millis(20));
    assert_eq!(pause, Duration::from_millis(1980));

    // fresh window, nothing sent yet: no pause, no report
    let pause = pacer.check_in(start + Duration::from_millis(21));
    assert_eq!(pause, Duration::ZERO);
}

#[tokio::test]
async fn message_bound_is_inclusive() {
    let broker = MemoryBroker::new();
    let conn = MemoryConnection::new(broker);

    let mut consume_ch = Channel::Memory(conn.create_channel());
    consume_ch.exchange_declare("direct", "direct").unwrap();
    let queue = consume_ch.queue_declare(false).unwrap();
    consume_ch.consume(&queue, true).unwrap();
    consume_ch.queue_bind(&queue, "direct", "run-1").unwrap();

    let mut channel = Channel::Memory(conn.create_channel());
    channel.exchange_declare("direct", "direct").unwrap();
    let producer = Producer {
        channel,
        exchange: "direct".to_string(),
        run_id: "run-1".to_string(),
        flags: PublishFlags::default(),
        tx_size: 0,
        min_msg_size: 0,
        message_limit: 3,
        time_limit: Duration::ZERO,
        pacer: Pacer::new(0, Duration::from_secs(3600), Arc::new(ReturnCounter::default())),
    };
    producer.run().await.unwrap();

    // the bound is checked before each send, so a limit of 3 permits 4 sends
    for expected_seq in 0..4u32 {
        let delivery = consume_ch.next_delivery().await.unwrap();
        assert_eq!(
            payload::decode_sequence(&delivery.payload),
            Some(expected_seq)
        );
    }
    assert!(
        timeout(Duration::from_millis(50), consume_ch.next_delivery())
            .await
            .is_err()
    );
}

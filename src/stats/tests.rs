use super::*;
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_records_lose_no_updates() {
    let stats = Arc::new(StatsWindow::new(Duration::from_secs(3600)));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let stats = stats.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    stats.record(Instant::now(), 42);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.msg_count, 8000);
    assert_eq!(snapshot.latency_count, 8000);
    assert_eq!(snapshot.cumulative_latency, 8000 * 42);
}

#[test]
fn zero_latency_counts_message_but_not_sample() {
    let stats = StatsWindow::new(Duration::from_secs(3600));
    stats.record(Instant::now(), 0);
    stats.record(Instant::now(), 0);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.msg_count, 2);
    assert_eq!(snapshot.latency_count, 0);
    assert_eq!(snapshot.min_latency, u64::MAX);
    assert_eq!(snapshot.max_latency, 0);
}

#[test]
fn first_sample_updates_both_min_and_max() {
    let stats = StatsWindow::new(Duration::from_secs(3600));
    stats.record(Instant::now(), 5_000);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.min_latency, 5_000);
    assert_eq!(snapshot.max_latency, 5_000);
}

#[test]
fn report_line_omits_latency_without_samples() {
    let mut state = WindowState::new(Instant::now());
    state.msg_count = 500;

    let line = state.report_line(Duration::from_millis(1000));
    assert_eq!(line, "recving rate: 500 msg/s");
}

#[test]
fn report_line_prints_latency_in_microseconds() {
    let mut state = WindowState::new(Instant::now());
    state.msg_count = 4;
    state.latency_count = 2;
    state.min_latency = 2_000;
    state.max_latency = 10_000;
    state.cumulative_latency = 12_000;

    let line = state.report_line(Duration::from_millis(2000));
    assert_eq!(line, "recving rate: 2 msg/s, min/avg/max latency: 2/6/10 microseconds");
}

#[test]
fn window_resets_after_report() {
    let stats = StatsWindow::new(Duration::from_millis(1));
    let later = Instant::now() + Duration::from_millis(50);
    stats.record(later, 1_000);

    // the record above crossed the interval, so it reported and reset
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.msg_count, 0);
    assert_eq!(snapshot.latency_count, 0);
    assert_eq!(snapshot.min_latency, u64::MAX);
}

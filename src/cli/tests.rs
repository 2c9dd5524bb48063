use super::*;

#[test]
fn defaults_match_the_documented_table() {
    let cfg = Args::parse_from(["mcast-bench"]).into_config();
    assert_eq!(cfg.host, "localhost");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.exchange_type, "direct");
    assert_eq!(cfg.exchange_name, "direct");
    assert_eq!(cfg.sampling_interval, Duration::from_secs(1));
    assert_eq!(cfg.rate_limit, 0);
    assert_eq!(cfg.producer_count, 1);
    assert_eq!(cfg.consumer_count, 1);
    assert_eq!(cfg.message_limit, 0);
    assert!(!cfg.share_connections);
    assert_eq!(cfg.producer_tx_size, 0);
    assert_eq!(cfg.consumer_tx_size, 0);
    assert!(!cfg.auto_ack);
    assert_eq!(cfg.prefetch_count, 0);
    assert_eq!(cfg.min_msg_size, 0);
    assert_eq!(cfg.time_limit, Duration::ZERO);
    assert!(cfg.flags.is_empty());
}

#[test]
fn exchange_name_defaults_to_exchange_type() {
    let cfg = Args::parse_from(["mcast-bench", "--type", "fanout"]).into_config();
    assert_eq!(cfg.exchange_name, "fanout");
    assert_eq!(cfg.exchange_type, "fanout");
}

#[test]
fn explicit_exchange_name_wins() {
    let cfg =
        Args::parse_from(["mcast-bench", "--type", "fanout", "--exchange", "bench"]).into_config();
    assert_eq!(cfg.exchange_name, "bench");
}

#[test]
fn flag_option_is_repeatable() {
    let cfg = Args::parse_from([
        "mcast-bench",
        "--flag",
        "persistent",
        "--flag",
        "mandatory",
    ])
    .into_config();
    assert_eq!(cfg.flags, vec!["persistent", "mandatory"]);
}

#[test]
fn bounds_and_switches_parse() {
    let cfg = Args::parse_from([
        "mcast-bench",
        "--producers",
        "4",
        "--consumers",
        "2",
        "--messages",
        "1000",
        "--time",
        "30",
        "--rate",
        "5000",
        "--connections",
        "--autoack",
        "--qos",
        "10",
    ])
    .into_config();
    assert_eq!(cfg.producer_count, 4);
    assert_eq!(cfg.consumer_count, 2);
    assert_eq!(cfg.message_limit, 1000);
    assert_eq!(cfg.time_limit, Duration::from_secs(30));
    assert_eq!(cfg.rate_limit, 5000);
    assert!(cfg.share_connections);
    assert!(cfg.auto_ack);
    assert_eq!(cfg.prefetch_count, 10);
}

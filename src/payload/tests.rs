use super::*;

#[test]
fn round_trips_header_fields() {
    let body = encode(42, 987_654_321_000, 64);
    assert_eq!(decode_sequence(&body), Some(42));
    assert_eq!(decode_timestamp(&body), Some(987_654_321_000));
}

#[test]
fn short_minimum_still_emits_full_header() {
    assert_eq!(encode(1, 2, 0).len(), HEADER_LEN);
    assert_eq!(encode(1, 2, 5).len(), HEADER_LEN);
    assert_eq!(encode(1, 2, HEADER_LEN).len(), HEADER_LEN);
}

#[test]
fn pads_to_minimum_size() {
    let body = encode(7, 9, 100);
    assert_eq!(body.len(), 100);
    assert!(body[HEADER_LEN..].iter().all(|b| *b == 0));
    assert_eq!(decode_sequence(&body), Some(7));
    assert_eq!(decode_timestamp(&body), Some(9));
}

#[test]
fn decode_rejects_short_bodies() {
    assert_eq!(decode_sequence(&[0, 1]), None);
    assert_eq!(decode_timestamp(&[0; 4]), None);
    assert_eq!(decode_timestamp(&[0; HEADER_LEN - 1]), None);
}

#[test]
fn monotonic_clock_never_goes_backwards() {
    let a = now_nanos();
    let b = now_nanos();
    assert!(b >= a);
}

use tandem_crdt::FractionalIndex;
use tandem_types::PeerId;

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn min_sorts_before_max() {
    assert!(FractionalIndex::min() < FractionalIndex::max());
}

#[test]
fn lexicographic_byte_order() {
    let a = FractionalIndex::from_bytes(vec![1, 7]);
    let b = FractionalIndex::from_bytes(vec![2, 3]);
    assert!(a < b);
}

#[test]
fn shorter_prefix_sorts_first() {
    let short = FractionalIndex::from_bytes(vec![1, 7]);
    let long = FractionalIndex::from_bytes(vec![1, 7, 4, 3]);
    assert!(short < long);
}

#[test]
fn peer_byte_is_the_tiebreak() {
    let a = FractionalIndex::from_bytes(vec![1, 3]);
    let b = FractionalIndex::from_bytes(vec![1, 7]);
    assert!(a < b);
}

#[test]
fn peer_accessor() {
    let key = FractionalIndex::from_bytes(vec![1, 9, 7]);
    assert_eq!(key.peer(), PeerId::new(7));
}

// ── create_between ───────────────────────────────────────────────

#[test]
fn between_sentinels_lower_bound() {
    let (key, distance) = FractionalIndex::create_between(PeerId::new(7), None, None, true);
    assert_eq!(key.as_bytes(), &[1, 7]);
    assert_eq!(distance, 254);
}

#[test]
fn between_sentinels_upper_bound() {
    let (key, distance) = FractionalIndex::create_between(PeerId::new(7), None, None, false);
    assert_eq!(key.as_bytes(), &[254, 7]);
    assert_eq!(distance, 1);
}

#[test]
fn between_wide_gap_hugs_lower() {
    let lower = FractionalIndex::from_bytes(vec![1, 7]);
    let upper = FractionalIndex::from_bytes(vec![200, 5]);
    let (key, distance) =
        FractionalIndex::create_between(PeerId::new(3), Some(&lower), Some(&upper), true);
    assert_eq!(key.as_bytes(), &[2, 3]);
    assert_eq!(distance, 198);
    assert!(lower < key && key < upper);
}

#[test]
fn between_wide_gap_hugs_upper() {
    let lower = FractionalIndex::from_bytes(vec![1, 7]);
    let upper = FractionalIndex::from_bytes(vec![200, 5]);
    let (key, distance) =
        FractionalIndex::create_between(PeerId::new(3), Some(&lower), Some(&upper), false);
    assert_eq!(key.as_bytes(), &[199, 3]);
    assert_eq!(distance, 1);
    assert!(lower < key && key < upper);
}

#[test]
fn adjacent_bounds_descend_a_level() {
    let lower = FractionalIndex::from_bytes(vec![1, 7]);
    let upper = FractionalIndex::from_bytes(vec![2, 5]);
    let (key, distance) =
        FractionalIndex::create_between(PeerId::new(3), Some(&lower), Some(&upper), true);
    assert_eq!(key.as_bytes(), &[1, 7, 1, 3]);
    assert_eq!(distance, 254);
    assert!(lower < key && key < upper);
}

#[test]
fn repeated_front_inserts_stay_dense() {
    let peer = PeerId::new(5);
    let mut upper = FractionalIndex::max();
    for _ in 0..50 {
        let (key, distance) = FractionalIndex::create_between(peer, None, Some(&upper), true);
        assert!(FractionalIndex::min() < key, "{key} not above MIN");
        assert!(key < upper, "{key} not below {upper}");
        assert!(distance >= 1);
        upper = key;
    }
}

#[test]
fn repeated_back_inserts_stay_dense() {
    let peer = PeerId::new(9);
    let mut lower = FractionalIndex::min();
    for _ in 0..300 {
        let (key, distance) = FractionalIndex::create_between(peer, Some(&lower), None, true);
        assert!(lower < key, "{key} not above {lower}");
        assert!(key < FractionalIndex::max(), "{key} not below MAX");
        assert!(distance >= 1);
        lower = key;
    }
}

#[test]
fn same_bounds_different_peers_disambiguate() {
    let (a, _) = FractionalIndex::create_between(PeerId::new(1), None, None, true);
    let (b, _) = FractionalIndex::create_between(PeerId::new(2), None, None, true);
    assert_ne!(a, b);
    assert!(a < b);
}

// ── offset ───────────────────────────────────────────────────────

#[test]
fn offset_bumps_last_path_byte() {
    let key = FractionalIndex::from_bytes(vec![5, 7]);
    assert_eq!(key.offset(3).as_bytes(), &[8, 7]);
}

#[test]
fn offset_keeps_peer_byte() {
    let key = FractionalIndex::from_bytes(vec![1, 5, 7]);
    let bumped = key.offset(10);
    assert_eq!(bumped.as_bytes(), &[1, 15, 7]);
    assert_eq!(bumped.peer(), PeerId::new(7));
}

#[test]
fn offset_zero_is_identity() {
    let key = FractionalIndex::from_bytes(vec![5, 7]);
    assert_eq!(key.offset(0), key);
}

#[test]
fn offset_from_recovers_delta() {
    let base = FractionalIndex::from_bytes(vec![5, 7]);
    assert_eq!(base.offset(3).offset_from(&base), Some(3));
    assert_eq!(base.offset_from(&base), Some(0));
}

#[test]
fn offset_from_rejects_non_siblings() {
    let base = FractionalIndex::from_bytes(vec![5, 7]);
    // Different peer byte.
    assert_eq!(FractionalIndex::from_bytes(vec![8, 3]).offset_from(&base), None);
    // Different length.
    assert_eq!(FractionalIndex::from_bytes(vec![5, 1, 7]).offset_from(&base), None);
    // Sorts before the base.
    assert_eq!(FractionalIndex::from_bytes(vec![4, 7]).offset_from(&base), None);
}

// ── Display / serde ──────────────────────────────────────────────

#[test]
fn display_dotted_hex_with_peer_suffix() {
    let key = FractionalIndex::from_bytes(vec![1, 10, 7]);
    assert_eq!(key.to_string(), "1.a:7");
}

#[test]
fn serde_round_trip() {
    let key = FractionalIndex::from_bytes(vec![1, 10, 7]);
    let json = serde_json::to_string(&key).unwrap();
    let back: FractionalIndex = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
}

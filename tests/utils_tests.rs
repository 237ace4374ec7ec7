use std::collections::HashSet;
use vicemon::constants::BROADCAST_REQUEST_ID;
use vicemon::utils::{generate_session_id, increment_request_id};

#[test]
fn test_generate_session_id_uniqueness() {
    let mut seen = HashSet::new();

    for _ in 0..10_000 {
        let id = generate_session_id();
        assert!(seen.insert(id), "Duplicate session ID generated: {}", id);
    }
}

#[test]
fn test_generate_session_id_across_threads() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| (0..1_000).map(|_| generate_session_id()).collect::<Vec<_>>()))
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "Duplicate session ID generated: {}", id);
        }
    }
}

#[test]
fn test_increment_request_id_never_yields_reserved_values() {
    assert_eq!(increment_request_id(1), 2);
    assert_eq!(increment_request_id(0xFFFF_FFFE), 1);
    assert_eq!(increment_request_id(BROADCAST_REQUEST_ID), 1);
    assert_eq!(increment_request_id(0), 1);
}

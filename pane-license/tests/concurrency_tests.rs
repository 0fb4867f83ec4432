mod common;

use common::{harness, hwid, pro_params};
use pane_license::LicenseError;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn racing_activations_never_oversell_the_last_slot() {
    let h = harness();
    let key = h.registry.issue(&pro_params(1)).unwrap();

    const RACERS: usize = 8;
    let barrier = Arc::new(Barrier::new(RACERS));
    let mut handles = Vec::with_capacity(RACERS);

    for i in 0..RACERS {
        let binder = h.binder.clone();
        let barrier = barrier.clone();
        let key = key.key.clone();
        handles.push(thread::spawn(move || {
            let device = hwid(&format!("HW-{i}"));
            barrier.wait();
            binder.activate(&key, &device)
        }));
    }

    let mut winners = 0;
    let mut limit_losses = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => winners += 1,
            Err(LicenseError::ActivationLimitExceeded { max: 1 }) => limit_losses += 1,
            Err(other) => panic!("unexpected activation failure: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(limit_losses, RACERS - 1);
    assert_eq!(h.binder.activations_used(&key.key).unwrap(), 1);
}

#[test]
fn racing_reactivations_of_one_device_all_succeed() {
    let h = harness();
    let key = h.registry.issue(&pro_params(1)).unwrap();
    h.binder.activate(&key.key, &hwid("HW-A")).unwrap();

    const RACERS: usize = 6;
    let barrier = Arc::new(Barrier::new(RACERS));
    let mut handles = Vec::with_capacity(RACERS);

    for _ in 0..RACERS {
        let binder = h.binder.clone();
        let barrier = barrier.clone();
        let key = key.key.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            binder.activate(&key, &hwid("HW-A"))
        }));
    }

    for handle in handles {
        let activated = handle.join().unwrap().unwrap();
        assert!(activated.reactivated);
    }
    assert_eq!(h.binder.activations_used(&key.key).unwrap(), 1);
}

#[test]
fn concurrent_activations_across_keys_do_not_interfere() {
    let h = harness();
    let key_a = h.registry.issue(&pro_params(2)).unwrap();
    let key_b = h.registry.issue(&pro_params(2)).unwrap();

    let mut handles = Vec::new();
    for (key, device) in [
        (key_a.key.clone(), "HW-A1"),
        (key_a.key.clone(), "HW-A2"),
        (key_b.key.clone(), "HW-B1"),
        (key_b.key.clone(), "HW-B2"),
    ] {
        let binder = h.binder.clone();
        handles.push(thread::spawn(move || binder.activate(&key, &hwid(device))));
    }

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(h.binder.activations_used(&key_a.key).unwrap(), 2);
    assert_eq!(h.binder.activations_used(&key_b.key).unwrap(), 2);
}

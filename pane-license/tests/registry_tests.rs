mod common;

use common::{harness, pro_params};
use pane_license::{IssueParams, LicenseError};
use pane_types::Tier;
use pretty_assertions::assert_eq;

#[test]
fn issued_key_has_tier_prefix_and_group_shape() {
    let h = harness();
    let issued = h.registry.issue(&pro_params(3)).unwrap();

    let parts: Vec<&str> = issued.key.split('-').collect();
    assert_eq!(parts.len(), 5);
    assert_eq!(parts[0], "PRO");
    assert!(parts[1..].iter().all(|g| g.len() == 4));
}

#[test]
fn lookup_returns_issued_state() {
    let h = harness();
    let issued = h.registry.issue(&pro_params(3)).unwrap();

    let found = h.registry.lookup(&issued.key).unwrap();
    assert_eq!(found.id, issued.id);
    assert_eq!(found.tier, Tier::Pro);
    assert_eq!(found.max_activations, 3);
    assert_eq!(found.max_concurrent, 5);
    assert_eq!(found.email, "buyer@example.com");
    assert_eq!(found.issued_at, common::T0);
    assert!(!found.revoked);
}

#[test]
fn lookup_unknown_key_fails() {
    let h = harness();
    assert!(matches!(
        h.registry.lookup("PRO-XXXX-XXXX-XXXX-XXXX"),
        Err(LicenseError::LicenseNotFound)
    ));
}

#[test]
fn revoke_is_idempotent() {
    let h = harness();
    let issued = h.registry.issue(&pro_params(1)).unwrap();

    h.registry.revoke(&issued.key).unwrap();
    h.registry.revoke(&issued.key).unwrap();
    assert!(h.registry.lookup(&issued.key).unwrap().revoked);
}

#[test]
fn revoke_unknown_key_fails() {
    let h = harness();
    assert!(matches!(
        h.registry.revoke("PRO-XXXX-XXXX-XXXX-XXXX"),
        Err(LicenseError::LicenseNotFound)
    ));
}

#[test]
fn same_sale_ref_returns_same_key() {
    let h = harness();
    let params = IssueParams {
        sale_ref: Some("gum_sale_001".to_string()),
        ..pro_params(1)
    };

    let first = h.registry.issue(&params).unwrap();
    let replay = h.registry.issue(&params).unwrap();
    assert_eq!(first.key, replay.key);
    assert_eq!(first.id, replay.id);

    let count: i64 = h
        .db
        .with_read(|conn| {
            conn.query_row("SELECT COUNT(*) FROM license_keys", [], |row| row.get(0))
                .map_err(pane_db::StoreError::from)
        })
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn distinct_sale_refs_get_distinct_keys() {
    let h = harness();
    let a = h
        .registry
        .issue(&IssueParams {
            sale_ref: Some("sale-a".to_string()),
            ..pro_params(1)
        })
        .unwrap();
    let b = h
        .registry
        .issue(&IssueParams {
            sale_ref: Some("sale-b".to_string()),
            ..pro_params(1)
        })
        .unwrap();
    assert_ne!(a.key, b.key);
}

#[test]
fn custom_prefix_is_normalized_to_uppercase() {
    let h = harness();
    let issued = h
        .registry
        .issue(&IssueParams {
            prefix: Some("beta7".to_string()),
            ..pro_params(1)
        })
        .unwrap();
    assert!(issued.key.starts_with("BETA7-"));
}

#[test]
fn invalid_issue_params_are_rejected() {
    let h = harness();

    let free = IssueParams {
        tier: Tier::Free,
        ..pro_params(1)
    };
    assert!(matches!(
        h.registry.issue(&free),
        Err(LicenseError::Invalid(_))
    ));

    let no_slots = IssueParams {
        max_activations: 0,
        ..pro_params(1)
    };
    assert!(matches!(
        h.registry.issue(&no_slots),
        Err(LicenseError::Invalid(_))
    ));

    let no_windows = IssueParams {
        max_concurrent: 0,
        ..pro_params(1)
    };
    assert!(matches!(
        h.registry.issue(&no_windows),
        Err(LicenseError::Invalid(_))
    ));

    let bad_email = IssueParams {
        email: "not-an-email".to_string(),
        ..pro_params(1)
    };
    assert!(matches!(
        h.registry.issue(&bad_email),
        Err(LicenseError::Invalid(_))
    ));

    let bad_prefix = IssueParams {
        prefix: Some("no spaces!".to_string()),
        ..pro_params(1)
    };
    assert!(matches!(
        h.registry.issue(&bad_prefix),
        Err(LicenseError::Invalid(_))
    ));
}

#[test]
fn starter_keys_use_start_prefix() {
    let h = harness();
    let issued = h
        .registry
        .issue(&IssueParams {
            tier: Tier::Starter,
            max_concurrent: 2,
            ..pro_params(1)
        })
        .unwrap();
    assert!(issued.key.starts_with("START-"));
    assert_eq!(issued.tier, Tier::Starter);
}

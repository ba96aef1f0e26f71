use burden_core::BurdenError;
use burden_facilities::{FacilityLookup, FacilityStore};

fn store() -> FacilityStore {
    FacilityStore::alberta().expect("bundled snapshot should load")
}

#[test]
fn bundled_snapshot_lists_five_edmonton_area_hospitals() {
    let store = store();
    assert_eq!(store.len(), 5);

    let facilities = store.facilities();
    let ids: Vec<&str> = facilities.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3", "4", "5"]);

    assert_eq!(facilities[0].name, "University of Alberta Hospital");
    assert_eq!(facilities[4].city, "St. Albert");
    assert_eq!(facilities[2].average_wait_minutes, 159.0);
    assert!(facilities
        .iter()
        .all(|f| f.last_updated.to_rfc3339() == "2026-02-20T22:30:00-07:00"));
    assert_eq!(store.current_wait_times(), facilities);
}

#[test]
fn provenance_records_sources() {
    let store = store();
    let provenance = store.provenance();

    assert_eq!(provenance.source.wait_times, "Alberta Health Services");
    assert!(provenance.source.lwbs.contains("HQCA"));
    assert!(provenance.source_url.starts_with("https://www.albertahealthservices.ca"));
    assert!(provenance.lwbs_url.starts_with("https://focus.hqa.ca"));
}

#[test]
fn lookup_distinguishes_found_from_not_found() {
    let store = store();

    match store.lookup("greyNuns") {
        FacilityLookup::Found(record) => {
            assert_eq!(record.name, "Grey Nuns Community Hospital");
            assert_eq!(record.lwbs_rate, 0.134);
        }
        FacilityLookup::NotFound => panic!("greyNuns should be in the snapshot"),
    }

    assert_eq!(store.lookup("calgaryFoothills"), FacilityLookup::NotFound);
    assert!(store.hospital_wait_time("calgaryFoothills").is_none());
    assert_eq!(
        store.hospital_wait_time("misericordia").map(|h| h.wait_minutes),
        Some(367.0)
    );
}

#[test]
fn leave_signal_weight_is_relative_to_five_percent() {
    let store = store();

    assert!((store.leave_signal_weight("greyNuns", 0.05) - 2.68).abs() < 1e-9);
    assert!((store.leave_signal_weight("sturgeon", 0.05) - 1.86).abs() < 1e-9);
    assert_eq!(store.leave_signal_weight("unknown", 0.05), 1.0);

    let record = store.hospital_wait_time("royalAlexandra").expect("known facility");
    assert_eq!(
        record.leave_signal_weight(0.05),
        store.leave_signal_weight("royalAlexandra", 0.05)
    );
}

#[test]
fn snapshot_with_duplicate_keys_is_rejected() {
    let json = r#"{
        "source": {"waitTimes": "a", "lwbs": "b"},
        "sourceUrl": "https://example.org/a",
        "lwbsUrl": "https://example.org/b",
        "snapshotTakenAt": "2026-01-01T00:00:00Z",
        "hospitals": [
            {"key": "x", "name": "X", "city": "C", "waitMinutes": 10, "lwbsRate": 0.1},
            {"key": "x", "name": "X2", "city": "C", "waitMinutes": 20, "lwbsRate": 0.1}
        ]
    }"#;

    assert!(matches!(
        FacilityStore::from_json_str(json),
        Err(BurdenError::Snapshot(message)) if message.contains("duplicate")
    ));
}

#[test]
fn snapshot_with_rate_outside_unit_interval_is_rejected() {
    let json = r#"{
        "source": {"waitTimes": "a", "lwbs": "b"},
        "sourceUrl": "https://example.org/a",
        "lwbsUrl": "https://example.org/b",
        "snapshotTakenAt": "2026-01-01T00:00:00Z",
        "hospitals": [
            {"key": "x", "name": "X", "city": "C", "waitMinutes": 10, "lwbsRate": 13.4}
        ]
    }"#;

    assert!(matches!(
        FacilityStore::from_json_str(json),
        Err(BurdenError::Snapshot(_))
    ));
    assert!(matches!(
        FacilityStore::from_json_str("not json"),
        Err(BurdenError::Snapshot(_))
    ));
}

use std::fs;

use burden_core::{AlertLevel, BurdenConfig, BurdenError, PatientCheckIn, RegisteredPatient};
use burden_facilities::FacilityStore;
use burden_model::WaitingRoom;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn now() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_771_653_600_000).unwrap()
}

fn room_with_fixture() -> WaitingRoom {
    let store = FacilityStore::alberta().expect("bundled snapshot should load");
    let mut room = WaitingRoom::new(store, BurdenConfig::default()).expect("default config");

    let data = fs::read_to_string(fixture_path("waiting_room_patients.json"))
        .expect("fixture should be readable");
    let patients: Vec<RegisteredPatient> =
        serde_json::from_str(&data).expect("fixture should parse");
    for patient in patients {
        room.register(patient).expect("fixture ids are unique");
    }
    room
}

fn burden_of(room: &WaitingRoom, id: &str) -> f64 {
    room.patient(id)
        .and_then(|p| p.burden_index)
        .expect("patient should have a burden")
}

#[test]
fn recompute_all_updates_every_patient() {
    let mut room = room_with_fixture();
    assert!(room.patients().iter().all(|p| p.burden_index.is_none()));

    let updated = room.recompute_all(now());
    assert_eq!(updated, 3);

    assert!((burden_of(&room, "p-100") - 1.6585214073123882).abs() < 1e-9);
    assert!((burden_of(&room, "p-101") - 79.70295250341529).abs() < 1e-9);
    assert!((burden_of(&room, "p-102") - 34.67436432858108).abs() < 1e-9);

    let alert = |id: &str| room.patient(id).and_then(|p| p.alert_level);
    assert_eq!(alert("p-100"), Some(AlertLevel::Green));
    assert_eq!(alert("p-101"), Some(AlertLevel::Red));
    assert_eq!(alert("p-102"), Some(AlertLevel::Red));
}

#[test]
fn board_lists_most_urgent_first() {
    let mut room = room_with_fixture();
    room.recompute_all(now());

    let order: Vec<&str> = room.board().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, ["p-101", "p-102", "p-100"]);
}

#[test]
fn intervention_lowers_burden_but_not_a_leave_signal() {
    let mut room = room_with_fixture();
    room.recompute_all(now());

    let treated = room.apply_intervention("p-101").expect("patient exists");
    assert!((treated.burden_index.unwrap() - (79.70295250341529 - 15.0)).abs() < 1e-9);
    assert_eq!(treated.alert_level, Some(AlertLevel::Amber));

    let leaving = room.apply_intervention("p-102").expect("patient exists");
    assert_eq!(leaving.alert_level, Some(AlertLevel::Red));

    let calm = room.apply_intervention("p-100").expect("patient exists");
    assert_eq!(calm.burden_index, Some(0.0));
    assert_eq!(calm.alert_level, Some(AlertLevel::Green));
}

#[test]
fn check_in_recomputes_immediately() {
    let mut room = room_with_fixture();
    room.recompute_all(now());
    assert_eq!(
        room.patient("p-100").and_then(|p| p.alert_level),
        Some(AlertLevel::Green)
    );

    let check_in = PatientCheckIn {
        discomfort: 5,
        needs_help: true,
        planning_to_leave: true,
        timestamp: now(),
    };
    let patient = room
        .add_check_in("p-100", check_in, now() + Duration::minutes(1))
        .expect("patient exists");

    assert_eq!(patient.check_ins.len(), 1);
    assert_eq!(patient.discomfort_level, Some(5));
    assert_eq!(patient.alert_level, Some(AlertLevel::Red));
    assert!(patient.burden_index.unwrap() > 15.0 * 0.151 / 0.05);
}

#[test]
fn unknown_and_duplicate_patients_are_reported() {
    let mut room = room_with_fixture();

    assert!(matches!(
        room.recompute("nobody", now()),
        Err(BurdenError::UnknownPatient(id)) if id == "nobody"
    ));
    assert!(matches!(
        room.apply_intervention("nobody"),
        Err(BurdenError::UnknownPatient(_))
    ));

    let duplicate = room.patient("p-100").cloned().expect("patient exists");
    assert!(matches!(
        room.register(duplicate),
        Err(BurdenError::DuplicatePatient(id)) if id == "p-100"
    ));
}

#[test]
fn invalid_patient_is_skipped_without_stopping_the_sweep() {
    let mut room = room_with_fixture();
    let mut broken = room.patient("p-100").cloned().expect("patient exists");
    broken.id = "p-bad".to_string();
    broken.estimated_ctas_level = Some(9);
    room.register(broken).expect("new id");

    assert_eq!(room.recompute_all(now()), 3);
    assert_eq!(room.patient("p-bad").and_then(|p| p.burden_index), None);
    assert!(matches!(
        room.recompute("p-bad", now()),
        Err(BurdenError::CtasOutOfRange(9))
    ));
}

#[test]
fn failed_check_in_leaves_the_patient_unchanged() {
    let mut room = room_with_fixture();
    room.recompute_all(now());

    let mut broken = room.patient("p-100").cloned().expect("patient exists");
    broken.id = "p-stale".to_string();
    broken.estimated_ctas_level = Some(9);
    room.register(broken).expect("new id");
    let before = room.patient("p-stale").cloned().expect("patient exists");
    assert_eq!(before.alert_level, Some(AlertLevel::Green));

    let check_in = PatientCheckIn {
        discomfort: 4,
        needs_help: false,
        planning_to_leave: true,
        timestamp: now(),
    };
    assert!(matches!(
        room.add_check_in("p-stale", check_in, now()),
        Err(BurdenError::CtasOutOfRange(9))
    ));

    let after = room.patient("p-stale").expect("patient exists");
    assert_eq!(after, &before);
    assert!(after.check_ins.is_empty());
    assert!(!after.planning_to_leave());
}

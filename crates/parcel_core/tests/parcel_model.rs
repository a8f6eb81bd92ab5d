use parcel_core::{Parcel, ParcelStatus};
use serde_json::json;

#[test]
fn parcel_serializes_with_snake_case_status() {
    let mut parcel = Parcel::with_created_at(1000, "test", "2024-01-02T03:04:05Z");
    parcel.number = 7;
    parcel.status = ParcelStatus::Sent;

    let value = serde_json::to_value(&parcel).unwrap();
    assert_eq!(
        value,
        json!({
            "number": 7,
            "client": 1000,
            "status": "sent",
            "address": "test",
            "created_at": "2024-01-02T03:04:05Z"
        })
    );
}

#[test]
fn parcel_deserializes_from_json() {
    let parcel: Parcel = serde_json::from_value(json!({
        "number": 3,
        "client": 12,
        "status": "delivered",
        "address": "dock 4",
        "created_at": "2024-01-02T03:04:05Z"
    }))
    .unwrap();

    assert_eq!(parcel.status, ParcelStatus::Delivered);
    assert!(!parcel.is_registered());
}

#[test]
fn unknown_status_is_rejected() {
    let result = serde_json::from_value::<ParcelStatus>(json!("lost"));
    assert!(result.is_err());

    let err = "lost".parse::<ParcelStatus>().unwrap_err();
    assert!(err.to_string().contains("lost"));
}

#[test]
fn status_display_matches_storage_string() {
    assert_eq!(ParcelStatus::Registered.to_string(), "registered");
    assert_eq!(ParcelStatus::default(), ParcelStatus::Registered);
}

use super::*;
use serde_json::json;

#[test]
fn test_valid_event_passes_validation() {
    let mut event = InboundEvent {
        event_id: None, // Will be auto-generated
        event: "upsert_entity".to_string(),
        payload: json!({"id": "A1", "lat": 52.1, "lng": 4.5}),
        timestamp: Some(1707668400000),
    };

    let result = event.validate_and_prepare();
    assert!(result.is_ok());
    assert!(event.event_id.is_some()); // UUIDv7 was generated
    assert_eq!(event.event_id.unwrap().len(), 36); // UUID format
}

#[test]
fn test_existing_event_id_preserved() {
    let mut event = InboundEvent::new("clear_entities", json!({}));
    event.event_id = Some("my-id".to_string());

    event.validate_and_prepare().unwrap();
    assert_eq!(event.event_id.as_deref(), Some("my-id"));
}

#[test]
fn test_empty_event_id_regenerated() {
    let mut event = InboundEvent::new("clear_entities", json!({}));
    event.event_id = Some(String::new());

    event.validate_and_prepare().unwrap();
    assert_eq!(event.event_id.unwrap().len(), 36);
}

#[test]
fn test_missing_event_fails() {
    let mut event = InboundEvent::new("", json!({}));
    assert_eq!(event.validate_and_prepare(), Err(ValidationError::MissingEvent));
}

#[test]
fn test_invalid_event_name_fails() {
    let mut event = InboundEvent::new("Upsert-Entity", json!({}));
    match event.validate_and_prepare().unwrap_err() {
        ValidationError::InvalidEventName(name) => assert_eq!(name, "Upsert-Entity"),
        other => panic!("Expected InvalidEventName error, got {:?}", other),
    }
}

#[test]
fn test_payload_not_object_fails() {
    let mut event = InboundEvent::new("upsert_entity", json!([1, 2, 3]));
    assert_eq!(event.validate_and_prepare(), Err(ValidationError::PayloadNotObject));
}

#[test]
fn test_invalid_timestamp_fails() {
    let mut event = InboundEvent::new("upsert_entity", json!({}));
    event.timestamp = Some(-5);
    assert_eq!(
        event.validate_and_prepare(),
        Err(ValidationError::InvalidTimestamp(-5))
    );
}

#[test]
fn test_deserialize_defaults_payload() {
    let event: InboundEvent = serde_json::from_value(json!({ "event": "clear_entities" })).unwrap();
    assert_eq!(event.payload, json!({}));
    assert!(event.event_id.is_none());
    assert!(event.timestamp.is_none());
}

#[test]
fn test_serialize_skips_empty_fields() {
    let event = InboundEvent::new("clear_entities", json!({}));
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value, json!({ "event": "clear_entities", "payload": {} }));
}

#[test]
fn test_parse_upsert_payload() {
    let event = InboundEvent::new(
        names::UPSERT_ENTITY,
        json!({
            "id": "A1",
            "lat": 52.1,
            "lng": 4.5,
            "heading": 90,
            "metadata": { "flightNumber": "KL123" }
        }),
    );

    let payload: UpsertPayload = event.parse_payload().unwrap();
    assert_eq!(payload.id.as_str(), "A1");
    assert_eq!(payload.lat, 52.1);
    assert_eq!(payload.heading, Some(90.0));
    assert_eq!(payload.metadata["flightNumber"], json!("KL123"));
}

#[test]
fn test_parse_upsert_payload_with_aliases() {
    let event = InboundEvent::new(
        names::UPSERT_ENTITY,
        json!({ "id": "A1", "lat": 1.0, "lng": 2.0, "direction": 45, "data": { "speed": 400 } }),
    );

    let payload: UpsertPayload = event.parse_payload().unwrap();
    assert_eq!(payload.heading, Some(45.0));
    assert_eq!(payload.metadata["speed"], json!(400));
}

#[test]
fn test_parse_upsert_payload_optional_fields() {
    let event = InboundEvent::new(names::UPSERT_ENTITY, json!({ "id": "A1", "lat": 1.0, "lng": 2.0 }));

    let payload: UpsertPayload = event.parse_payload().unwrap();
    assert!(payload.heading.is_none());
    assert!(payload.metadata.is_empty());
}

#[test]
fn test_parse_upsert_payload_rejects_empty_id() {
    let event = InboundEvent::new(names::UPSERT_ENTITY, json!({ "id": "", "lat": 1.0, "lng": 2.0 }));

    match event.parse_payload::<UpsertPayload>().unwrap_err() {
        ValidationError::InvalidPayload(name, reason) => {
            assert_eq!(name, "upsert_entity");
            assert!(reason.contains("entity id must not be empty"));
        }
        other => panic!("Expected InvalidPayload error, got {:?}", other),
    }
}

#[test]
fn test_parse_upsert_payload_missing_coordinates() {
    let event = InboundEvent::new(names::UPSERT_ENTITY, json!({ "id": "A1" }));
    assert!(event.parse_payload::<UpsertPayload>().is_err());
}

#[test]
fn test_scatter_payload_default_count() {
    let event = InboundEvent::new(names::SCATTER_ENTITIES, json!({}));
    let payload: ScatterPayload = event.parse_payload().unwrap();
    assert_eq!(payload.count, 10);
}

#[test]
fn serialize_deserialize_brush_settings() {
    let settings = paint_tools::BrushSettings::default();
    let serialized = serde_json::to_string(&settings).unwrap();
    let deserialized: paint_tools::BrushSettings = serde_json::from_str(&serialized).unwrap();
    assert_eq!(settings, deserialized);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let deserialized: paint_tools::BrushSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(deserialized, paint_tools::BrushSettings::default());
}

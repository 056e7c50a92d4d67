use super::*;

#[test]
fn test_unknown_bucket() {
    let store = test_store();
    let result = store.query(r#"from(bucket:"other") |> range(start: -1h)"#);
    assert!(matches!(result, Err(StoreError::BucketNotFound(name)) if name == "other"));
}

#[test]
fn test_empty_range_rejected() {
    let store = test_store();
    let result = store.query(&range_query("dev-1/s", T0 + 60, T0));
    assert!(matches!(result, Err(StoreError::UnsupportedQuery(_))));

    let result = store.query(&range_query("dev-1/s", T0, T0));
    assert!(matches!(result, Err(StoreError::UnsupportedQuery(_))));
}

#[test]
fn test_unknown_tag_rejected() {
    let store = test_store();
    let mut p = point("dev-1", "s", "temperature", 1.0, T0);
    p.tags.insert("color".to_string(), "red".to_string());

    let result = store.write_batch(&[p]);
    assert!(matches!(result, Err(StoreError::SchemaMismatch(msg)) if msg.contains("color")));
}

#[test]
fn test_malformed_query_is_a_parse_error() {
    let store = test_store();
    assert!(matches!(store.query("SELECT * FROM points"), Err(StoreError::ParseError(_))));
}

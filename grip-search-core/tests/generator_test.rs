use grip_search_core::{ProxyConfig, SearchClient, generate_config};
use mock_backend::{mount_failure, mount_get, tables_page};
use serde_json::json;
use wiremock::MockServer;


#[tokio::test]
async fn test_generate_single_table() {
    let server = MockServer::start().await;
    mount_get(&server, "/tables", tables_page(&server, &["patients"], None)).await;
    mount_get(
        &server,
        "/schema/patients",
        json!({ "properties": { "id": { "type": "string" }, "age": { "type": "integer" } } }),
    )
    .await;

    let client = SearchClient::new(&server.uri()).unwrap();
    let config = generate_config(&client).await;

    let expected = ProxyConfig::from_yaml_str(&format!(
        r#"
port: 50051
baseURL: {}/
tables:
  patients:
    primaryKey: id
    fields:
      id: string
      age: integer
"#,
        server.uri()
    ))
    .unwrap();

    assert_eq!(config, expected);
}

#[tokio::test]
async fn test_table_without_id_is_not_queryable() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/tables",
        tables_page(&server, &["patients", "audit"], None),
    )
    .await;
    mount_get(
        &server,
        "/schema/patients",
        json!({ "properties": { "id": { "type": "string" } } }),
    )
    .await;
    mount_get(
        &server,
        "/schema/audit",
        json!({ "properties": { "event": { "type": "string" }, "at": { "type": "string", "format": "date-time" } } }),
    )
    .await;

    let client = SearchClient::new(&server.uri()).unwrap();
    let config = generate_config(&client).await;

    assert_eq!(config.primary_key_of("patients"), Some("id"));
    assert_eq!(config.collections["audit"].primary_key, None);
    assert_eq!(config.collections["audit"].fields.len(), 2);
    assert_eq!(config.queryable_collections().collect::<Vec<_>>(), vec!["patients"]);
}

#[tokio::test]
async fn test_tables_with_unavailable_schema_are_skipped() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/tables",
        tables_page(&server, &["patients", "broken"], None),
    )
    .await;
    mount_get(
        &server,
        "/schema/patients",
        json!({ "properties": { "id": { "type": "string" } } }),
    )
    .await;
    mount_failure(&server, "/schema/broken", 500).await;

    let client = SearchClient::new(&server.uri()).unwrap();
    let config = generate_config(&client).await;

    assert_eq!(config.collections.len(), 1);
    assert!(config.collection("broken").is_none());
}

#[tokio::test]
async fn test_generated_config_renders_as_yaml() {
    let server = MockServer::start().await;
    mount_get(&server, "/tables", tables_page(&server, &["patients"], None)).await;
    mount_get(
        &server,
        "/schema/patients",
        json!({ "properties": { "id": { "type": "string" } } }),
    )
    .await;

    let client = SearchClient::new(&server.uri()).unwrap();
    let yaml = generate_config(&client).await.to_yaml_string().unwrap();

    assert!(yaml.contains("port: 50051"));
    assert!(yaml.contains("primaryKey: id"));
    assert_eq!(ProxyConfig::from_yaml_str(&yaml).unwrap().port, 50051);
}

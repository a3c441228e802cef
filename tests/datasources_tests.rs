mod common;

use common::{client_with, datasource_json, not_found, MockDispatcher};
use minds::client::ClientError;
use minds::DatabaseConfig;
use reqwest::Method;
use serde_json::{json, Value};

fn sales_config() -> DatabaseConfig {
    DatabaseConfig::new("sales_db", "postgres", "Sales data")
        .with_connection("host", "localhost")
        .with_tables(["orders"])
}

#[tokio::test]
async fn test_create_then_find_round_trip() {
    let mock = MockDispatcher::new(vec![Ok(Value::Null), Ok(datasource_json("sales_db"))]);
    let client = client_with(&mock);
    let config = sales_config();

    let ds = client.datasources().create(&config, false).await.unwrap();

    assert_eq!(ds.name, config.name);
    assert_eq!(ds.engine, config.engine);
    assert_eq!(ds.description, config.description);
    assert_eq!(ds.created_at.as_deref(), Some("2024-10-01 10:00:00"));

    let requests = mock.requests();
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "datasources");
    assert_eq!(requests[0].body, Some(config.to_payload().unwrap()));
    assert_eq!(requests[1].method, Method::GET);
    assert_eq!(requests[1].path, "datasources/sales_db");
}

#[tokio::test]
async fn test_create_replace_without_prior_resource() {
    let mock = MockDispatcher::new(vec![
        not_found(),
        Ok(Value::Null),
        Ok(datasource_json("sales_db")),
    ]);
    let client = client_with(&mock);

    let ds = client.datasources().create(&sales_config(), true).await.unwrap();
    assert_eq!(ds.name, "sales_db");

    let calls = mock.calls();
    assert_eq!(
        calls,
        vec![
            (Method::GET, "datasources/sales_db".to_string()),
            (Method::POST, "datasources".to_string()),
            (Method::GET, "datasources/sales_db".to_string()),
        ]
    );
    assert_eq!(calls.iter().filter(|(m, _)| *m == Method::POST).count(), 1);
}

#[tokio::test]
async fn test_create_replace_destroys_existing() {
    let mock = MockDispatcher::new(vec![
        Ok(datasource_json("sales_db")),
        Ok(Value::Null),
        Ok(Value::Null),
        Ok(datasource_json("sales_db")),
    ]);
    let client = client_with(&mock);

    client.datasources().create(&sales_config(), true).await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests[1].method, Method::DELETE);
    assert_eq!(requests[1].path, "datasources/sales_db");
    assert_eq!(requests[1].body, None);
    assert_eq!(requests[2].method, Method::POST);
}

#[tokio::test]
async fn test_create_rejects_invalid_name_before_any_request() {
    let mock = MockDispatcher::new(vec![]);
    let client = client_with(&mock);
    let config = DatabaseConfig::new("9lives", "postgres", "");

    let err = client.datasources().create(&config, true).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidDatasourceName(name) if name == "9lives"));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_create_propagates_server_errors() {
    let mock = MockDispatcher::new(vec![Err(ClientError::Api {
        status: reqwest::StatusCode::BAD_REQUEST,
        body: json!({"detail": "bad engine"}),
    })]);
    let client = client_with(&mock);

    let err = client.datasources().create(&sales_config(), false).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status, .. } if status == reqwest::StatusCode::BAD_REQUEST));
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn test_upsert_uses_put_by_name() {
    let mock = MockDispatcher::new(vec![Ok(Value::Null), Ok(datasource_json("sales_db"))]);
    let client = client_with(&mock);

    client.datasources().upsert(&sales_config()).await.unwrap();

    assert_eq!(mock.calls()[0], (Method::PUT, "datasources/sales_db".to_string()));
}

#[tokio::test]
async fn test_all_skips_items_without_engine() {
    let mock = MockDispatcher::new(vec![Ok(json!([
        {"name": "my_files", "description": "uploaded files"},
        datasource_json("sales_db"),
    ]))]);
    let client = client_with(&mock);

    let all = client.datasources().all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "sales_db");
}

#[tokio::test]
async fn test_all_empty() {
    let mock = MockDispatcher::new(vec![Ok(json!([])), Ok(Value::Null)]);
    let client = client_with(&mock);

    assert!(client.datasources().all().await.unwrap().is_empty());
    assert!(client.datasources().all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_without_engine_is_unsupported() {
    let mock = MockDispatcher::new(vec![Ok(json!({"name": "my_files"}))]);
    let client = client_with(&mock);

    let err = client.datasources().find("my_files").await.unwrap_err();
    assert!(matches!(err, ClientError::UnsupportedObject(_)));
}

#[tokio::test]
async fn test_find_not_found_propagates() {
    let mock = MockDispatcher::new(vec![not_found()]);
    let client = client_with(&mock);

    let err = client.datasources().find("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_destroy_force_sends_cascade() {
    let mock = MockDispatcher::new(vec![Ok(Value::Null), Ok(Value::Null)]);
    let client = client_with(&mock);

    client.datasources().destroy("sales_db", false).await.unwrap();
    client.datasources().destroy("sales_db", true).await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests[0].body, None);
    assert_eq!(requests[1].method, Method::DELETE);
    assert_eq!(requests[1].body, Some(json!({"cascade": true})));
}

#[tokio::test]
async fn test_names_are_escaped_in_paths() {
    let mock = MockDispatcher::new(vec![Ok(Value::Null), not_found()]);
    let client = client_with(&mock);

    client.datasources().destroy("a?b", false).await.unwrap();
    let err = client.datasources().find("x/../minds").await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(
        mock.calls(),
        vec![
            (Method::DELETE, "datasources/a%3Fb".to_string()),
            (Method::GET, "datasources/x%2F..%2Fminds".to_string()),
        ]
    );
}

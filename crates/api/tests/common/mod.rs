use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use lms_core::time::fixed_clock;
use serde_json::Value;
use services::AppServices;
use tower::ServiceExt;

pub async fn create_test_app(name: &str) -> Router {
    let services = AppServices::new_sqlite(
        &format!("sqlite:file:{name}?mode=memory&cache=shared"),
        fixed_clock(),
    )
    .await
    .expect("connect sqlite");
    api::router(services)
}

/// Send one request and return the status with the decoded JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<u64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user {
        builder = builder.header(api::USER_ID_HEADER, id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn register(app: &Router, name: &str, email: &str, role: &str) -> u64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(serde_json::json!({ "name": name, "email": email, "role": role })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_u64().unwrap()
}

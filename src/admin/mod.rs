//! Control-plane API.
//!
//! # Routes
//! - `POST /api/rpc`: route CRUD and reload (`getConfig`, `addConfig`,
//!   `updateConfig`, `deleteConfig`, `reloadConfig`); every mutation is
//!   followed by a sync of the routing table
//! - `/api/*`: 404 for anything else
//! - `GET /reload-config`: legacy no-op, always succeeds; mounted ahead of
//!   host dispatch by [`legacy_router`] so it answers for every host

pub mod auth;
pub mod control;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::config::AdminConfig;

pub use control::ControlPlane;

pub fn setup_admin_router(control: Arc<ControlPlane>, config: &AdminConfig) -> Router {
    let api_key: Option<Arc<str>> = config.api_key.as_deref().map(Arc::from);

    let rpc = Router::new()
        .route("/api/rpc", post(rpc_handler))
        .layer(middleware::from_fn_with_state(api_key, admin_auth_middleware))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(control);

    Router::new()
        .merge(rpc)
        .route("/api", any(api_not_found))
        .route("/api/{*rest}", any(api_not_found))
}

/// The legacy reload endpoint, kept out of host dispatch.
pub fn legacy_router() -> Router {
    Router::new().route("/reload-config", get(legacy_reload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Dispatcher, RouteRecord, TableBuilder};
    use crate::store::{JsonFileStore, RouteStore};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn control(records: Vec<RouteRecord>) -> Arc<ControlPlane> {
        let dispatcher = Arc::new(Dispatcher::new(TableBuilder::with_timeouts(
            Duration::from_millis(100),
            Duration::from_millis(500),
        )));
        Arc::new(ControlPlane::new(
            Arc::new(JsonFileStore::with_records(records)),
            dispatcher,
        ))
    }

    fn app(control: Arc<ControlPlane>, api_key: Option<&str>) -> Router {
        let config = AdminConfig {
            api_key: api_key.map(String::from),
            ..Default::default()
        };
        setup_admin_router(control, &config)
    }

    fn rpc(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/rpc")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_add_update_delete_sync_the_table() {
        let control = control(vec![]);
        let app = app(control.clone(), None);

        let (status, body) = call(
            &app,
            rpc(json!({
                "action": "addConfig",
                "data": {"name": "A", "domain": "a.test", "proxyTo": "127.0.0.1:9001"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(
            control.dispatcher().current().target_for("a.test"),
            Some("127.0.0.1:9001")
        );

        let (status, _) = call(
            &app,
            rpc(json!({
                "action": "updateConfig",
                "id": id,
                "data": {"name": "A", "domain": "a.test", "proxyTo": "127.0.0.1:9002"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            control.dispatcher().current().target_for("a.test"),
            Some("127.0.0.1:9002")
        );

        let (status, body) = call(&app, rpc(json!({"action": "deleteConfig", "id": id}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Config deleted successfully");
        assert!(control.dispatcher().current().is_empty());
    }

    #[tokio::test]
    async fn test_get_config_lists_store() {
        let control = control(vec![RouteRecord::new("A", "a.test", "x:1")]);
        let (status, body) = call(&app(control, None), rpc(json!({"action": "getConfig"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["domain"], "a.test");
        assert_eq!(body["data"][0]["proxyTo"], "x:1");
    }

    #[tokio::test]
    async fn test_unknown_id_is_404() {
        let app = app(control(vec![]), None);
        let (status, body) = call(&app, rpc(json!({"action": "deleteConfig", "id": "missing"}))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "message": "Config not found"}));
    }

    #[tokio::test]
    async fn test_unknown_action_and_bad_data_are_400() {
        let app = app(control(vec![]), None);

        let (status, body) = call(&app, rpc(json!({"action": "dropTables"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Unknown action");

        let (status, _) = call(
            &app,
            rpc(json!({"action": "addConfig", "data": {"name": "A"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_domain_rejected_and_table_unchanged() {
        let control = control(vec![RouteRecord::new("A", "a.test", "x:1")]);
        control.sync().await.unwrap();
        let version = control.dispatcher().current().version();
        let app = app(control.clone(), None);

        let (status, body) = call(
            &app,
            rpc(json!({
                "action": "addConfig",
                "data": {"name": "B", "domain": "a.test", "proxyTo": "x:2"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(control.dispatcher().current().version(), version);
        assert_eq!(control.store().list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_config_syncs() {
        let control = control(vec![RouteRecord::new("A", "a.test", "x:1")]);
        let (status, body) = call(&app(control.clone(), None), rpc(json!({"action": "reloadConfig"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Configuration reloaded successfully");
        assert!(control.dispatcher().current().lookup("a.test").is_some());
    }

    #[tokio::test]
    async fn test_legacy_reload_does_not_touch_table() {
        let control = control(vec![RouteRecord::new("A", "a.test", "x:1")]);
        let response = legacy_router()
            .oneshot(Request::get("/reload-config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"Configuration reloaded successfully");
        assert!(control.dispatcher().current().is_empty());
    }

    #[tokio::test]
    async fn test_other_api_paths_are_404() {
        let app = app(control(vec![]), None);
        for path in ["/api", "/api/users", "/api/rpc/extra"] {
            let response = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let app = app(control(vec![]), Some("secret"));

        let (status, _) = call(&app, rpc(json!({"action": "getConfig"}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut req = rpc(json!({"action": "getConfig"}));
        req.headers_mut()
            .insert("authorization", "Bearer secret".parse().unwrap());
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}

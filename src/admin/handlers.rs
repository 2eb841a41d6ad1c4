use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::admin::control::ControlPlane;
use crate::routing::RouteRecord;
use crate::store::StoreError;

/// Body of `POST /api/rpc`.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub action: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Failure of one RPC call, already mapped to what the client may see.
#[derive(Debug)]
pub struct RpcError {
    status: StatusCode,
    message: String,
}

impl RpcError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Config not found")
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateDomain(_) | StoreError::MissingField(_) => {
                Self::new(StatusCode::BAD_REQUEST, e.to_string())
            }
            StoreError::Io(_) | StoreError::Serde(_) | StoreError::Unavailable(_) => {
                tracing::error!(error = %e, "Control-plane store error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "message": self.message })),
        )
            .into_response()
    }
}

pub async fn rpc_handler(
    State(control): State<Arc<ControlPlane>>,
    Json(req): Json<RpcRequest>,
) -> Result<Json<Value>, RpcError> {
    tracing::info!(action = %req.action, id = ?req.id, "Handling RPC request");
    let store = control.store();

    match req.action.as_str() {
        "getConfig" => {
            let routes = store.list()?;
            Ok(Json(json!({ "success": true, "data": routes })))
        }
        "addConfig" => {
            let record = record_from(req.data)?;
            let route = store.create(record)?;
            control.sync().await?;
            Ok(Json(json!({ "success": true, "data": route })))
        }
        "updateConfig" => {
            let id = req.id.ok_or_else(RpcError::not_found)?;
            let record = record_from(req.data)?;
            let route = store.update(&id, record)?.ok_or_else(RpcError::not_found)?;
            control.sync().await?;
            Ok(Json(json!({ "success": true, "data": route })))
        }
        "deleteConfig" => {
            let id = req.id.ok_or_else(RpcError::not_found)?;
            store.delete(&id)?.ok_or_else(RpcError::not_found)?;
            control.sync().await?;
            Ok(Json(json!({ "success": true, "message": "Config deleted successfully" })))
        }
        "reloadConfig" => {
            control.reload().await?;
            Ok(Json(json!({
                "success": true,
                "message": "Configuration reloaded successfully"
            })))
        }
        other => {
            tracing::info!(action = %other, "Unknown RPC action");
            Err(RpcError::new(StatusCode::BAD_REQUEST, "Unknown action"))
        }
    }
}

fn record_from(data: Option<Value>) -> Result<RouteRecord, RpcError> {
    let data = data.ok_or_else(|| RpcError::new(StatusCode::BAD_REQUEST, "Missing data"))?;
    serde_json::from_value(data)
        .map_err(|e| RpcError::new(StatusCode::BAD_REQUEST, format!("Invalid data: {e}")))
}

/// Any `/api` path other than `/api/rpc`.
pub async fn api_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "API endpoint not found")
}

/// Kept for old clients. Does not reload anything; `reloadConfig` does.
pub async fn legacy_reload() -> &'static str {
    tracing::info!("Legacy /reload-config endpoint called");
    "Configuration reloaded successfully"
}

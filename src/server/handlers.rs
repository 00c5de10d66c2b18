//! Request handlers for the query endpoint.
//!
//! The wire shape is what the spectrum page expects: the request JSON travels in
//! the `rpc` form field, and the reply is always `200` with an `Error` string
//! (empty on success) and `Values` (`null` until the device has reported).

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::data::SnapshotStore;
use crate::measurement::SampleVector;

/// Form body (or query string) of an RPC call.
#[derive(Debug, Default, Deserialize)]
pub struct RpcForm {
    /// JSON-encoded [`RpcRequest`].
    #[serde(default)]
    pub rpc: String,
}

/// Decoded RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// `scale` or `sample`.
    #[serde(rename = "Cmd", alias = "cmd")]
    pub cmd: String,
}

/// RPC reply.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct RpcResponse {
    /// Empty on success.
    #[serde(rename = "Error")]
    pub error: String,
    /// The requested vector, if captured.
    #[serde(rename = "Values")]
    pub values: Option<SampleVector>,
}

impl RpcResponse {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            values: None,
        }
    }
}

/// `GET|POST /rpc`
///
/// A body that is not form-encoded is answered like any other bad request,
/// with the reason in `Error`.
pub async fn rpc(
    State(store): State<SnapshotStore>,
    form: Result<Form<RpcForm>, FormRejection>,
) -> Json<RpcResponse> {
    match form {
        Ok(Form(form)) => Json(answer(&store, &form.rpc)),
        Err(rejection) => Json(RpcResponse::failed(rejection.body_text())),
    }
}

/// Answer one encoded request from the store.
pub fn answer(store: &SnapshotStore, raw: &str) -> RpcResponse {
    let request: RpcRequest = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(e) => return RpcResponse::failed(e.to_string()),
    };

    match request.cmd.as_str() {
        "scale" => RpcResponse {
            values: store.wavelengths(),
            ..RpcResponse::default()
        },
        "sample" => RpcResponse {
            values: store.intensities(),
            ..RpcResponse::default()
        },
        _ => RpcResponse::failed("unsupported command"),
    }
}

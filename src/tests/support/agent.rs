// Fake Consul agent serving the two endpoints the registry client uses.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const TOKEN_HEADER: &str = "x-consul-token";

#[derive(Default)]
struct AgentState {
    services: Mutex<HashMap<String, Value>>,
    registrations: Mutex<Vec<Value>>,
    seen_tokens: Mutex<Vec<Option<String>>>,
    required_token: Option<String>,
    fail_status: Mutex<Option<StatusCode>>,
}

impl AgentState {
    fn check(&self, headers: &HeaderMap) -> Result<(), Response> {
        let token = headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen_tokens.lock().push(token.clone());

        if let Some(status) = *self.fail_status.lock() {
            return Err((status, "injected failure").into_response());
        }
        if let Some(required) = &self.required_token {
            if token.as_deref() != Some(required.as_str()) {
                return Err((StatusCode::FORBIDDEN, "ACL not found").into_response());
            }
        }
        Ok(())
    }
}

/// Mirrors how the agent echoes a registration back from `GET /v1/agent/service/:id`.
fn as_agent_service(registration: &Value) -> Value {
    json!({
        "ID": registration["ID"],
        "Service": registration["Name"],
        "Tags": registration.get("Tags").cloned().unwrap_or_else(|| json!([])),
        "Meta": registration.get("Meta").cloned().unwrap_or_else(|| json!({})),
        "Port": registration.get("Port").cloned().unwrap_or_else(|| json!(0)),
        "Address": registration.get("Address").cloned().unwrap_or_else(|| json!("")),
        "Weights": registration
            .get("Weights")
            .cloned()
            .unwrap_or_else(|| json!({"Passing": 1, "Warning": 1})),
        "Kind": registration.get("Kind").cloned().unwrap_or_else(|| json!("")),
        "EnableTagOverride": false,
        "Datacenter": "dc1"
    })
}

async fn get_service(
    State(state): State<Arc<AgentState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = state.check(&headers) {
        return resp;
    }
    match state.services.lock().get(&id) {
        Some(svc) => Json(svc.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("unknown service ID: {}", id)).into_response(),
    }
}

async fn register_service(
    State(state): State<Arc<AgentState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = state.check(&headers) {
        return resp;
    }
    let id = match body.get("ID").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => return (StatusCode::BAD_REQUEST, "missing ID").into_response(),
    };
    state.registrations.lock().push(body.clone());
    state.services.lock().insert(id, as_agent_service(&body));
    StatusCode::OK.into_response()
}

/// HTTP server on an ephemeral port, stopped on drop.
pub struct FakeAgent {
    addr: SocketAddr,
    state: Arc<AgentState>,
    handle: JoinHandle<()>,
}

impl FakeAgent {
    pub async fn start() -> Self {
        Self::start_with(None).await
    }

    /// Starts an agent that rejects requests without this ACL token.
    pub async fn start_with_token(token: &str) -> Self {
        Self::start_with(Some(token.to_string())).await
    }

    async fn start_with(required_token: Option<String>) -> Self {
        let state = Arc::new(AgentState {
            required_token,
            ..AgentState::default()
        });

        let app = Router::new()
            .route("/v1/agent/service/register", put(register_service))
            .route("/v1/agent/service/:id", get(get_service))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake agent");
        let addr = listener.local_addr().expect("fake agent addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// `host:port`, the form operators pass on the command line.
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Seeds a service as the agent would report it.
    pub fn insert_service(&self, service: Value) {
        let id = service["ID"].as_str().expect("service ID").to_string();
        self.state.services.lock().insert(id, service);
    }

    pub fn service(&self, id: &str) -> Option<Value> {
        self.state.services.lock().get(id).cloned()
    }

    /// Raw registration bodies received, in order.
    pub fn registrations(&self) -> Vec<Value> {
        self.state.registrations.lock().clone()
    }

    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        self.state.seen_tokens.lock().clone()
    }

    /// Answers every request with `status` until cleared with `None`.
    pub fn fail_with(&self, status: Option<StatusCode>) {
        *self.state.fail_status.lock() = status;
    }
}

impl Drop for FakeAgent {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

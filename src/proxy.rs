//! Local proxy that the chat session talks to. It forwards each turn to the
//! external agent so credentials stay on this side.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;

use crate::agent::AgentClient;
use crate::chat::{ChatReply, ChatRequest, CHAT_ROUTE};
use crate::error::{Result, TallyError};

#[derive(Clone)]
pub struct ProxyState {
    pub agent: Arc<dyn AgentClient>,
    pub default_agent_id: String,
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(CHAT_ROUTE, post(chat_handler))
        .with_state(state)
}

pub async fn serve(addr: &str, state: ProxyState) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| TallyError::Settings(format!("invalid listen address '{addr}': {e}")))?;

    let listener = TcpListener::bind(addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => TallyError::Other(format!(
            "Failed to bind to {addr}: address already in use (is another `tally serve` running?)"
        )),
        _ => TallyError::Io(e),
    })?;

    log::info!("proxy listening on http://{addr}");
    println!("Proxy listening on http://{addr}{CHAT_ROUTE}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn chat_handler(
    State(state): State<ProxyState>,
    Json(payload): Json<ChatRequest>,
) -> impl IntoResponse {
    if payload.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(failure("message is required".to_string())),
        );
    }

    let agent_id = payload
        .agent_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| state.default_agent_id.clone());
    log::debug!("forwarding chat turn to agent {agent_id}");

    match state.agent.send(&agent_id, &payload.message).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(ChatReply {
                success: true,
                response: reply.response,
                raw_response: reply.raw_response,
                error: None,
            }),
        ),
        Err(e) => {
            log::warn!("agent call failed: {e}");
            (StatusCode::BAD_GATEWAY, Json(failure(e.to_string())))
        }
    }
}

fn failure(error: String) -> ChatReply {
    ChatReply {
        success: false,
        response: None,
        raw_response: None,
        error: Some(error),
    }
}

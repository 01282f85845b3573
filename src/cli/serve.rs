use std::sync::Arc;

use crate::agent::HttpAgentClient;
use crate::error::Result;
use crate::proxy::{self, ProxyState};
use crate::settings::load_settings;

pub async fn run(listen: Option<String>) -> Result<()> {
    let settings = load_settings();
    let agent = HttpAgentClient::from_settings(&settings)?;
    let state = ProxyState {
        agent: Arc::new(agent),
        default_agent_id: settings.agent_id.clone(),
    };
    let addr = listen.unwrap_or_else(|| settings.listen_addr.clone());
    log::info!("forwarding chat to {}", settings.agent_endpoint);
    proxy::serve(&addr, state).await
}

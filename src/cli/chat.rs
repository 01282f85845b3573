use colored::Colorize;
use dialoguer::Input;

use crate::chat::{ChatSession, ChatTransport, ProxyClient};
use crate::error::{Result, TallyError};
use crate::models::Message;
use crate::settings::load_settings;

const WRAP_WIDTH: usize = 80;

pub async fn run(message: Option<String>, agent_id: Option<String>) -> Result<()> {
    let settings = load_settings();
    let transport = ProxyClient::new(&settings.proxy_url, settings.request_timeout())?;
    let agent_id = agent_id.unwrap_or_else(|| settings.agent_id.clone());
    let mut session = ChatSession::new(transport, agent_id);

    if let Some(text) = message {
        return send_one(&mut session, &text).await;
    }

    println!(
        "Chatting via {} ({} to leave, {} to start over, {} to review)",
        settings.proxy_url,
        "/quit".bold(),
        "/clear".bold(),
        "/history".bold()
    );
    loop {
        let line = match Input::<String>::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(_) => break,
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("{}", "Conversation cleared.".dimmed());
            }
            "/history" => print_history(session.messages()),
            text => {
                if let Err(e) = send_one(&mut session, text).await {
                    eprintln!("{}", e.to_string().red());
                    session.dismiss_error();
                }
            }
        }
    }
    Ok(())
}

async fn send_one<T: ChatTransport>(session: &mut ChatSession<T>, text: &str) -> Result<()> {
    let outcome = session.send(text).await.map(|reply| reply.map(|m| m.content.clone()));
    match outcome {
        Ok(Some(content)) => {
            println!("{} {}", "Assistant:".cyan().bold(), textwrap::fill(&content, WRAP_WIDTH));
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => Err(session
            .error()
            .map(|banner| TallyError::Other(banner.to_string()))
            .unwrap_or(e)),
    }
}

fn print_history(messages: &[Message]) {
    if messages.is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return;
    }
    for m in messages {
        let label = format!("{}:", m.role.label());
        println!("{} {}", label.bold(), textwrap::fill(&m.content, WRAP_WIDTH));
    }
}

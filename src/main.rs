mod agent;
mod chat;
mod cli;
mod error;
mod fmt;
mod insights;
mod models;
mod proxy;
mod reports;
mod settings;
mod store;

use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => cli::dashboard::run(None),
        Some(Commands::Init {
            data_dir,
            agent_endpoint,
            agent_id,
        }) => cli::init::run(data_dir, agent_endpoint, agent_id),
        Some(Commands::Add {
            kind,
            amount,
            category,
            description,
            date,
        }) => cli::transactions::add(kind, amount, &category, &description, date.as_deref()),
        Some(Commands::Edit {
            id,
            kind,
            amount,
            category,
            description,
            date,
        }) => cli::transactions::edit(&id, kind, amount, category, description, date.as_deref()),
        Some(Commands::Delete { id }) => cli::transactions::delete(&id),
        Some(Commands::List { kind }) => cli::transactions::list(kind),
        Some(Commands::Categories) => cli::categories::run(),
        Some(Commands::Dashboard { days }) => cli::dashboard::run(days),
        Some(Commands::Insights { agent_id }) => cli::insights::run(agent_id).await,
        Some(Commands::Chat { message, agent_id }) => cli::chat::run(message, agent_id).await,
        Some(Commands::Serve { listen }) => cli::serve::run(listen).await,
        Some(Commands::Export { output }) => cli::export::run(output),
        Some(Commands::Status) => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

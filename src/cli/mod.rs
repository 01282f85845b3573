pub mod categories;
pub mod chat;
pub mod dashboard;
pub mod export;
pub mod init;
pub mod insights;
pub mod serve;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::models::TransactionType;
use crate::settings::load_settings;
use crate::store::TransactionStore;

/// Open the transaction store in the configured data directory.
pub(crate) fn open_store() -> Result<TransactionStore> {
    TransactionStore::open(&load_settings().data_path())
}

#[derive(Parser)]
#[command(name = "tally", about = "Personal budget tracker with AI-generated insights.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up tally: choose a data directory and write settings.
    Init {
        /// Path for tally data (default: ~/.local/share/tally)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Agent endpoint URL
        #[arg(long = "agent-endpoint")]
        agent_endpoint: Option<String>,
        /// Default agent id
        #[arg(long = "agent-id")]
        agent_id: Option<String>,
    },
    /// Record an income or expense transaction.
    Add {
        /// income or expense
        #[arg(long = "type", value_enum)]
        kind: TransactionType,
        /// Amount (always positive; the type sets the sign)
        #[arg(long)]
        amount: f64,
        /// Category name (see `tally categories`)
        #[arg(long)]
        category: String,
        /// What the money was for
        #[arg(long)]
        description: String,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Change fields of an existing transaction.
    Edit {
        /// Transaction ID (shown in `tally list`)
        id: String,
        #[arg(long = "type", value_enum)]
        kind: Option<TransactionType>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Date: YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a transaction by ID.
    Delete {
        /// Transaction ID (shown in `tally list`)
        id: String,
    },
    /// List recorded transactions.
    List {
        /// Only show income or expense
        #[arg(long = "type", value_enum)]
        kind: Option<TransactionType>,
    },
    /// Show the category lists for each transaction type.
    Categories,
    /// Totals, category breakdown, daily trend and recent activity.
    Dashboard {
        /// Days in the trend window (default from settings)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Ask the agent for insights on your transactions.
    Insights {
        /// Agent id override
        #[arg(long = "agent-id")]
        agent_id: Option<String>,
    },
    /// Chat with the agent through the local proxy.
    Chat {
        /// Send a single message and exit
        #[arg(long)]
        message: Option<String>,
        /// Agent id override
        #[arg(long = "agent-id")]
        agent_id: Option<String>,
    },
    /// Run the local chat proxy.
    Serve {
        /// Address to listen on (default from settings)
        #[arg(long)]
        listen: Option<String>,
    },
    /// Export transactions to CSV.
    Export {
        /// Output file path (default: <data_dir>/exports/transactions-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show settings and storage summary.
    Status,
}

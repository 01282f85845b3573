use crate::error::Result;
use crate::fmt::money;
use crate::reports;
use crate::settings::{load_settings, settings_file_exists};
use crate::store::TransactionStore;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = settings.data_path();
    let store = TransactionStore::open(&data_dir)?;

    println!(
        "Settings:      {}",
        if settings_file_exists() { "saved" } else { "(defaults, run `tally init`)" }
    );
    println!("Data dir:      {}", data_dir.display());
    println!("Transactions:  {}", store.path().display());
    println!("Agent:         {} ({})", settings.agent_endpoint, settings.agent_id);
    println!(
        "API key:       {}",
        if settings.api_key().is_some() { "set" } else { "(not set)" }
    );
    println!("Proxy:         {}", settings.proxy_url);

    let totals = reports::totals(store.list());
    println!();
    println!("Recorded:      {}", store.list().len());
    println!("Net balance:   {}", money(totals.net));
    Ok(())
}

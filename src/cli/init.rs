use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_file_exists, shellexpand_path};
use crate::store::storage_path;

pub fn run(
    data_dir: Option<String>,
    agent_endpoint: Option<String>,
    agent_id: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();
    let existed = settings_file_exists();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(endpoint) = agent_endpoint {
        settings.agent_endpoint = endpoint;
    }
    if let Some(id) = agent_id {
        settings.agent_id = id;
    }

    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    if existed {
        println!("Updated settings; data in {}", resolved.display());
    } else {
        println!("Initialized tally at {}", resolved.display());
    }
    println!("Transactions file: {}", storage_path(&resolved).display());
    Ok(())
}

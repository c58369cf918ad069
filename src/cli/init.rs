use colored::Colorize;

use crate::error::Result;
use crate::settings::{save_settings, settings_file_exists, Settings};

pub fn run(server: &str, api_key: Option<&str>, enforce_split_totals: bool) -> Result<()> {
    let existed = settings_file_exists();
    let settings = Settings {
        server_url: server.trim_end_matches('/').to_string(),
        api_key: api_key.unwrap_or_default().to_string(),
        enforce_split_totals,
    };
    save_settings(&settings)?;

    let verb = if existed { "Updated" } else { "Saved" };
    println!("{} settings for {}", verb.green(), settings.server_url);
    if settings.enforce_split_totals {
        println!("Split allocations must reconcile before submission.");
    }
    Ok(())
}

use clap::Args;

use crate::store::{DocumentStore, RemoteStore};
use crate::sync::{SettingsState, SETTINGS_COLLECTION};

use super::config_cmd::OutputFormat;

#[derive(Args)]
pub struct SectionsCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl SectionsCommand {
    /// Shows the effective home-page section order: the persisted order
    /// with any newly introduced sections appended.
    pub async fn run(&self, store: &RemoteStore) -> Result<(), Box<dyn std::error::Error>> {
        let snapshot = store.list(SETTINGS_COLLECTION).await?;

        let mut settings = SettingsState::new();
        settings.apply_snapshot(&snapshot);
        let effective = settings.home.effective_sections();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&effective)?);
            }
            OutputFormat::Text => {
                println!("Home page sections");
                println!("==================\n");
                for (index, key) in effective.iter().enumerate() {
                    println!("{}. {}", index + 1, key);
                }
            }
        }
        Ok(())
    }
}

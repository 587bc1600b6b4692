use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::ai::{self, GenClient};

use super::config_cmd::OutputFormat;

#[derive(Args)]
pub struct AiCommand {
    #[command(subcommand)]
    pub command: AiSubcommand,
}

#[derive(Subcommand)]
pub enum AiSubcommand {
    /// Generate today's devotional (verse, reflection, prayer)
    Devotional {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Summarize an announcement into a short teaser
    Summarize {
        /// Text to summarize; pass --file to read from disk instead
        text: Option<String>,

        /// Read the text from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Ask a visitor-facing question, answered in a pastoral tone
    Ask {
        /// The question
        question: String,
    },
}

impl AiCommand {
    pub async fn run(&self, client: &GenClient) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AiSubcommand::Devotional { format } => {
                let devotional = ai::daily_devotional(client).await;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&devotional)?);
                    }
                    OutputFormat::Text => {
                        println!("\"{}\"", devotional.verse);
                        println!("— {}\n", devotional.reference);
                        println!("{}\n", devotional.message);
                        println!("{}", devotional.prayer);
                    }
                }
                Ok(())
            }

            AiSubcommand::Summarize { text, file } => {
                let content = match (text, file) {
                    (_, Some(path)) => std::fs::read_to_string(path)?,
                    (Some(text), None) => text.clone(),
                    (None, None) => {
                        return Err("Nothing to summarize: pass text or --file".into());
                    }
                };
                if content.trim().is_empty() {
                    return Err("Nothing to summarize: input is empty".into());
                }

                println!("{}", ai::summarize(client, &content).await);
                Ok(())
            }

            AiSubcommand::Ask { question } => {
                if question.trim().is_empty() {
                    return Err("Question must not be empty".into());
                }
                println!("{}", ai::pastoral_reply(client, question).await);
                Ok(())
            }
        }
    }
}

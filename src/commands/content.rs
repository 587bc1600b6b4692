use clap::{Args, Subcommand};
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::filestore::{FileStore, RemoteFileStore};
use crate::models::{self, sort_latest_first};
use crate::store::{self, DocumentStore, RemoteStore};

use super::config_cmd::OutputFormat;

#[derive(Args)]
pub struct ContentCommand {
    #[command(subcommand)]
    pub command: ContentSubcommand,
}

#[derive(Subcommand)]
pub enum ContentSubcommand {
    /// List the current snapshot of a collection
    List {
        /// Collection name (e.g. news, sermons, settings)
        collection: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Sort most-recent-first by creation time
        #[arg(long)]
        latest: bool,
    },

    /// Create a document or merge fields into an existing one
    Save {
        /// Collection name
        collection: String,

        /// Document id; omit to create with a generated id
        #[arg(long)]
        id: Option<String>,

        /// Field as key=value (value parsed as JSON when possible; can be repeated)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Delete a document, optionally removing its stored file
    Delete {
        /// Collection name
        collection: String,

        /// Document id
        id: String,

        /// Associated file URL to remove from storage, best effort
        #[arg(long)]
        file_url: Option<String>,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Watch a collection, printing every pushed snapshot
    Watch {
        /// Collection name
        collection: String,
    },

    /// Upload a file to storage and print its public URL
    Upload {
        /// Path prefix in storage (e.g. news, frames)
        prefix: String,

        /// Local file to upload
        file: PathBuf,
    },
}

/// Parses a `key=value` argument. Values that parse as JSON become typed
/// fields; everything else is kept as a string.
fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid field '{}': expected KEY=VALUE", raw))?;
    if key.is_empty() {
        return Err(format!("Invalid field '{}': empty key", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn print_documents(docs: &[store::Document], collection: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(docs).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Text => {
            if docs.is_empty() {
                println!("(empty)");
                return;
            }
            for doc in docs {
                println!("{}", describe(doc, collection));
            }
        }
    }
}

/// One-line description of a document, typed for the known collections.
fn describe(doc: &store::Document, collection: &str) -> String {
    let summary = match collection {
        models::SERMONS_COLLECTION => models::Sermon::from_document(doc).to_string(),
        models::EVENTS_COLLECTION => models::Event::from_document(doc).to_string(),
        models::MINISTRIES_COLLECTION => models::Ministry::from_document(doc).to_string(),
        models::NEWS_COLLECTION => models::NewsItem::from_document(doc).to_string(),
        models::PRAYERS_COLLECTION => models::PrayerRequest::from_document(doc).to_string(),
        _ => doc
            .get_str("title")
            .or_else(|| doc.get_str("name"))
            .unwrap_or("")
            .to_string(),
    };
    if summary.is_empty() {
        doc.id.clone()
    } else {
        format!("{}  [{}]", summary, doc.id)
    }
}

impl ContentCommand {
    pub async fn run(
        &self,
        store: &RemoteStore,
        files: &RemoteFileStore,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ContentSubcommand::List {
                collection,
                format,
                latest,
            } => {
                let mut docs = store.list(collection).await?;
                if *latest {
                    sort_latest_first(&mut docs);
                }
                print_documents(&docs, collection, format);
                Ok(())
            }

            ContentSubcommand::Save {
                collection,
                id,
                fields,
            } => {
                // Validate before any network call.
                if fields.is_empty() {
                    return Err("Nothing to save: pass at least one --field KEY=VALUE".into());
                }
                let mut data = Map::new();
                for raw in fields {
                    let (key, value) = parse_field(raw)?;
                    data.insert(key, value);
                }

                let id = store::save_document(store, collection, data, id.as_deref()).await?;
                println!("Saved document: {}", id);
                Ok(())
            }

            ContentSubcommand::Delete {
                collection,
                id,
                file_url,
                force,
            } => {
                let confirm = |prompt: &str| {
                    if *force {
                        return true;
                    }
                    print!("{} [y/N] ", prompt);
                    if io::stdout().flush().is_err() {
                        return false;
                    }
                    let mut input = String::new();
                    if io::stdin().read_line(&mut input).is_err() {
                        return false;
                    }
                    input.trim().eq_ignore_ascii_case("y")
                };

                let deleted = store::delete_document(
                    store,
                    Some(files),
                    confirm,
                    collection,
                    id,
                    file_url.as_deref(),
                )
                .await?;

                if deleted {
                    println!("Deleted document: {}", id);
                } else {
                    println!("Deletion cancelled.");
                }
                Ok(())
            }

            ContentSubcommand::Watch { collection } => {
                let name = collection.clone();
                let _subscription = store.subscribe(
                    collection,
                    Box::new(move |snapshot| {
                        println!("--- {} ({} document(s))", name, snapshot.len());
                        for doc in &snapshot {
                            println!("{}", doc.id);
                        }
                    }),
                );

                println!("Watching '{}', Ctrl-C to stop.", collection);
                tokio::signal::ctrl_c().await?;
                Ok(())
            }

            ContentSubcommand::Upload { prefix, file } => {
                let bytes = std::fs::read(file)?;
                let filename = file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or("Invalid file name")?;

                let url = files.upload(bytes, prefix, filename).await?;
                println!("{}", url);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_field_json_values() {
        assert_eq!(parse_field("count=3").unwrap().1, json!(3));
        assert_eq!(parse_field("live=true").unwrap().1, json!(true));
        assert_eq!(
            parse_field("tags=[\"a\",\"b\"]").unwrap().1,
            json!(["a", "b"])
        );
    }

    #[test]
    fn test_parse_field_plain_strings() {
        let (key, value) = parse_field("title=Easter Service").unwrap();
        assert_eq!(key, "title");
        assert_eq!(value, json!("Easter Service"));
    }

    #[test]
    fn test_parse_field_rejects_missing_separator() {
        assert!(parse_field("title").is_err());
        assert!(parse_field("=value").is_err());
    }

    #[test]
    fn test_describe_typed_and_unknown_collections() {
        let doc = store::Document::new(
            "s1",
            match json!({ "title": "On Grace", "speaker": "Pr. Lee" }) {
                Value::Object(map) => map,
                _ => unreachable!(),
            },
        );
        assert_eq!(describe(&doc, "sermons"), "On Grace — Pr. Lee  [s1]");
        assert_eq!(describe(&doc, "unknownCollection"), "On Grace  [s1]");

        let bare = store::Document::new("x9", Map::new());
        assert_eq!(describe(&bare, "unknownCollection"), "x9");
    }
}

//! AI-assisted text features with their fallback policy.
//!
//! Every function here returns usable content no matter what the service
//! does: a failed or malformed call degrades to a hardcoded substitute and
//! the failure is only logged.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::client::{GenClient, GenError};

/// A daily devotional: verse, reference, reflection, and prayer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Devotional {
    pub verse: String,
    pub reference: String,
    pub message: String,
    pub prayer: String,
}

/// The exact devotional served when generation fails.
pub fn fallback_devotional() -> Devotional {
    Devotional {
        verse: "The Lord is my shepherd; I shall not want.".to_string(),
        reference: "Psalm 23:1".to_string(),
        message: "Whatever today brings, you are not walking through it alone. \
                  Rest in the care of the One who knows your needs before you ask."
            .to_string(),
        prayer: "Lord, thank You for Your constant care. Help us trust You with \
                 this day and everything in it. Amen."
            .to_string(),
    }
}

/// Reply used when the conversational feature cannot reach the service.
pub const FALLBACK_PASTORAL_REPLY: &str =
    "Thank you for reaching out. We couldn't fetch an answer right now, but we'd \
     love to talk in person — join us on Sunday or write to the church office.";

fn devotional_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "verse": { "type": "STRING" },
            "reference": { "type": "STRING" },
            "message": { "type": "STRING" },
            "prayer": { "type": "STRING" }
        },
        "required": ["verse", "reference", "message", "prayer"]
    })
}

/// Generates today's devotional, falling back to the hardcoded one on any
/// failure.
pub async fn daily_devotional(client: &GenClient) -> Devotional {
    let prompt = "Write a short daily devotional for a church community. \
                  Return a Bible verse, its reference, a two-sentence \
                  encouraging reflection on it, and a one-sentence closing prayer.";

    let result: Result<Devotional, GenError> = async {
        let value = client.generate_json(prompt, devotional_schema()).await?;
        serde_json::from_value(value).map_err(|e| GenError::Decode(e.to_string()))
    }
    .await;

    match result {
        Ok(devotional) => devotional,
        Err(e) => {
            tracing::warn!("devotional generation failed, using fallback: {}", e);
            fallback_devotional()
        }
    }
}

/// Summarizes a piece of content into a short teaser. Falls back to a
/// truncation of the input.
pub async fn summarize(client: &GenClient, text: &str) -> String {
    let prompt = format!(
        "Summarize the following church announcement in one friendly sentence:\n\n{}",
        text
    );

    match client.generate_text(&prompt).await {
        Ok(summary) => summary.trim().to_string(),
        Err(e) => {
            tracing::warn!("summarization failed, using truncation fallback: {}", e);
            truncate_fallback(text)
        }
    }
}

/// Answers a visitor question in a pastoral tone. Falls back to a static
/// invitation.
pub async fn pastoral_reply(client: &GenClient, question: &str) -> String {
    let prompt = format!(
        "You are a warm, welcoming assistant for a church website. Answer this \
         visitor question briefly and kindly: {}",
        question
    );

    match client.generate_text(&prompt).await {
        Ok(reply) => reply.trim().to_string(),
        Err(e) => {
            tracing::warn!("pastoral reply failed, using fallback: {}", e);
            FALLBACK_PASTORAL_REPLY.to_string()
        }
    }
}

fn truncate_fallback(text: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = text.trim();
    if trimmed.chars().count() <= LIMIT {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(LIMIT).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A client pointed at an unroutable endpoint with a key set fails at
    /// the transport layer, which must surface as the fallback, never as an
    /// error.
    fn failing_client() -> GenClient {
        GenClient::new().with_base_url("http://127.0.0.1:1")
    }

    #[tokio::test]
    async fn test_devotional_failure_yields_exact_fallback() {
        std::env::set_var(super::super::API_KEY_ENV, "test-key");
        let devotional = daily_devotional(&failing_client()).await;
        assert_eq!(devotional, fallback_devotional());
    }

    #[tokio::test]
    async fn test_missing_key_also_yields_fallback() {
        std::env::remove_var(super::super::API_KEY_ENV);
        let devotional = daily_devotional(&failing_client()).await;
        assert_eq!(devotional, fallback_devotional());
    }

    #[tokio::test]
    async fn test_summarize_falls_back_to_truncation() {
        std::env::set_var(super::super::API_KEY_ENV, "test-key");
        let long = "word ".repeat(100);
        let summary = summarize(&failing_client(), &long).await;
        assert!(summary.ends_with('…'));
        assert!(summary.chars().count() <= 201);
    }

    #[tokio::test]
    async fn test_short_text_summary_fallback_is_untouched() {
        std::env::set_var(super::super::API_KEY_ENV, "test-key");
        let summary = summarize(&failing_client(), "Potluck on Friday.").await;
        assert_eq!(summary, "Potluck on Friday.");
    }

    #[tokio::test]
    async fn test_pastoral_reply_fallback() {
        std::env::set_var(super::super::API_KEY_ENV, "test-key");
        let reply = pastoral_reply(&failing_client(), "When are services?").await;
        assert_eq!(reply, FALLBACK_PASTORAL_REPLY);
    }

    #[test]
    fn test_fallback_devotional_is_complete() {
        let devotional = fallback_devotional();
        assert!(!devotional.verse.is_empty());
        assert!(!devotional.reference.is_empty());
        assert!(!devotional.message.is_empty());
        assert!(!devotional.prayer.is_empty());
    }
}

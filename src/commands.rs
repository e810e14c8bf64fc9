use anyhow::{Context, Result};
use tracing::info;

use crate::client::{RecommendationClient, RecommendationService};
use crate::config::Config;
use crate::session::ChatSession;

/// Send a single query with no prior history and return the reply text.
///
/// Blank queries are refused up front since the conversation would ignore
/// them and no request would be made.
pub async fn ask<S: RecommendationService>(config: &Config, service: S, query: &str) -> Result<String> {
    if query.trim().is_empty() {
        anyhow::bail!("Query cannot be empty");
    }

    let mut session = ChatSession::new(config.greeting.clone(), service);
    let reply = session
        .submit(query)
        .await
        .context("Query was not accepted")?;

    Ok(reply.content.clone())
}

pub async fn ask_and_print(config: &Config, query: &str) -> Result<()> {
    let client = RecommendationClient::new(config)?;
    info!(url = client.chat_url(), "one-shot query");

    let reply = ask(config, client, query).await?;
    println!("{}", reply);

    Ok(())
}

/// Check whether the recommendation service answers its liveness route
pub async fn ping(config: &Config) -> Result<()> {
    let client = RecommendationClient::new(config)?;

    match client.ping().await {
        Ok(status) if status.is_success() => {
            println!("✅ {} is reachable ({})", config.endpoint, status);
        }
        Ok(status) => {
            println!("⚠️  {} answered with {}", config.endpoint, status);
        }
        Err(e) => {
            println!("❌ {} is unreachable: {}", config.endpoint, e);
        }
    }

    Ok(())
}

/// Print the effective configuration and where it came from, optionally
/// persisting it
pub fn show_config(config: &Config, save: bool) -> Result<()> {
    if save {
        config.save()?;
        info!(path = %config.config_path.display(), "config saved");
    }

    let content = toml::to_string_pretty(config)
        .context("Failed to serialize config")?;

    println!("📍 Config file: {}", config.config_path.display());
    println!("📝 Logs: {}", config.log_dir().display());
    println!("{}", "=".repeat(50));
    println!("{}", content);
    if save {
        println!("💾 Saved to {}", config.config_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ReplyOutcome;
    use crate::conversation::Turn;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl RecommendationService for Fixed {
        async fn recommend(&self, turn: &Turn) -> ReplyOutcome {
            assert!(turn.history.is_empty());
            ReplyOutcome::Payload(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl RecommendationService for Failing {
        async fn recommend(&self, _turn: &Turn) -> ReplyOutcome {
            ReplyOutcome::ServiceError("model unavailable".to_string())
        }
    }

    #[tokio::test]
    async fn ask_returns_reply_without_history() {
        let reply = ask(&Config::default(), Fixed("Try 'Dune'."), "desert epic").await.unwrap();
        assert_eq!(reply, "Try 'Dune'.");
    }

    #[tokio::test]
    async fn ask_maps_service_errors() {
        let reply = ask(&Config::default(), Failing, "anything").await.unwrap();
        assert_eq!(reply, "Sorry, there was an error: model unavailable");
    }

    #[tokio::test]
    async fn ask_rejects_blank_query() {
        assert!(ask(&Config::default(), Fixed("unused"), "   ").await.is_err());
    }
}

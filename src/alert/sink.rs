use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tokio::process::Command;

use crate::alert::engine::AlertEvent;

#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, event: &AlertEvent) -> Result<()>;
}

pub struct StdoutSink;

#[async_trait]
impl AlertSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn send(&self, event: &AlertEvent) -> Result<()> {
        println!("[{}] {}", event.title, event.body);
        Ok(())
    }
}

/// Desktop notification through the freedesktop `notify-send` helper.
pub struct DesktopSink {
    timeout: Duration,
}

impl DesktopSink {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl AlertSink for DesktopSink {
    fn name(&self) -> &str {
        "desktop"
    }

    async fn send(&self, event: &AlertEvent) -> Result<()> {
        let status = Command::new("notify-send")
            .arg("--expire-time")
            .arg(self.timeout.as_millis().to_string())
            .arg(&event.title)
            .arg(&event.body)
            .status()
            .await
            .context("notify-send is not available")?;
        if !status.success() {
            return Err(anyhow!("notify-send exited with {status}"));
        }
        Ok(())
    }
}

pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("grade-monitor/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, event: &AlertEvent) -> Result<()> {
        let req = if self.url.contains("discord.com/api/webhooks")
            || self.url.contains("discordapp.com/api/webhooks")
        {
            let content = format!("**{}**\n{}", event.title, event.body);
            self.client
                .post(&self.url)
                .json(&serde_json::json!({ "content": content }))
        } else {
            self.client.post(&self.url).json(event)
        };

        req.send().await?.error_for_status()?;
        Ok(())
    }
}

pub mod engine;
pub mod sink;

use std::io::{BufRead, BufReader, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::alert::engine::AlertEvent;
use crate::alert::sink::{AlertSink, DesktopSink, StdoutSink, WebhookSink};
use crate::config::AlertsConfig;

const ACK_INPUT: &str = "1";

/// Blocking confirmation used when no sink could deliver an alert.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn acknowledge(&self, event: &AlertEvent) -> Result<()>;
}

/// Re-prints the alert until the user types `1`.
pub struct ConsoleAcknowledger {
    input: Arc<Mutex<Box<dyn BufRead + Send>>>,
    output: Mutex<Box<dyn Write + Send>>,
    retry_delay: Duration,
}

impl ConsoleAcknowledger {
    pub fn new(
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
        retry_delay: Duration,
    ) -> Self {
        Self {
            input: Arc::new(Mutex::new(Box::new(input))),
            output: Mutex::new(Box::new(output)),
            retry_delay,
        }
    }

    pub fn stdio() -> Self {
        Self::new(
            BufReader::new(std::io::stdin()),
            std::io::stdout(),
            Duration::from_secs(1),
        )
    }

    fn show(&self, event: &AlertEvent) -> Result<()> {
        let mut output = self
            .output
            .lock()
            .map_err(|_| anyhow!("alert output lock poisoned"))?;
        writeln!(output, "{}（请输入{ACK_INPUT}确认收到）", event.body)?;
        output.flush()?;
        Ok(())
    }

    /// Next line from the input, or `None` once it is closed.
    async fn read_line(&self) -> Result<Option<String>> {
        let input = Arc::clone(&self.input);
        tokio::task::spawn_blocking(move || -> Result<Option<String>> {
            let mut reader = input
                .lock()
                .map_err(|_| anyhow!("alert input lock poisoned"))?;
            let mut line = String::new();
            let read = reader.read_line(&mut line)?;
            Ok((read > 0).then_some(line))
        })
        .await?
    }
}

#[async_trait]
impl Acknowledger for ConsoleAcknowledger {
    async fn acknowledge(&self, event: &AlertEvent) -> Result<()> {
        loop {
            self.show(event)?;
            match self.read_line().await? {
                None => return Err(anyhow!("input closed before the alert was acknowledged")),
                Some(text) if text.trim() == ACK_INPUT => return Ok(()),
                Some(_) => tokio::time::sleep(self.retry_delay).await,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent { sinks: usize },
    Acknowledged,
    Undelivered,
}

pub struct Notifier {
    sinks: Vec<Box<dyn AlertSink>>,
    fallback: Box<dyn Acknowledger>,
}

impl Notifier {
    pub fn new(sinks: Vec<Box<dyn AlertSink>>, fallback: Box<dyn Acknowledger>) -> Self {
        Self { sinks, fallback }
    }

    pub fn from_config(config: &AlertsConfig) -> Result<Self> {
        let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();
        if config.enable_desktop {
            sinks.push(Box::new(DesktopSink::new(Duration::from_millis(
                config.desktop_timeout_ms,
            ))));
        }
        if config.enable_stdout {
            sinks.push(Box::new(StdoutSink));
        }
        if !config.webhook_url.trim().is_empty() {
            sinks.push(Box::new(WebhookSink::new(config.webhook_url.trim())?));
        }
        Ok(Self::new(sinks, Box::new(ConsoleAcknowledger::stdio())))
    }

    /// Sends to every sink; falls back to manual acknowledgment when none delivered.
    pub async fn dispatch(&self, event: &AlertEvent) -> Delivery {
        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.send(event).await {
                Ok(()) => delivered += 1,
                Err(err) => warn!("failed sending alert via {}: {err:#}", sink.name()),
            }
        }
        if delivered > 0 {
            return Delivery::Sent { sinks: delivered };
        }
        info!("no notification sink delivered, waiting for manual acknowledgment");
        match self.fallback.acknowledge(event).await {
            Ok(()) => Delivery::Acknowledged,
            Err(err) => {
                warn!("alert was not acknowledged: {err:#}");
                Delivery::Undelivered
            }
        }
    }
}

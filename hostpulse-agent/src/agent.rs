//! The agent run loop.

use std::time::Duration;

use tracing::{info, warn};

use hostpulse_common::FlatRecord;

use crate::collector::SnapshotCollector;
use crate::config::{AgentConfig, DisplayConfig};
use crate::render::{self, Progress};
use crate::sender::Sender;

/// Ties collection, rendering and transmission into one endless loop.
pub struct Agent {
    name: String,
    identity: Option<String>,
    collector: SnapshotCollector,
    sender: Sender,
    display: DisplayConfig,
    progress: Progress,
}

impl Agent {
    pub fn new(name: String, identity: Option<String>, sender: Sender, config: AgentConfig) -> Self {
        Self {
            name,
            identity,
            collector: SnapshotCollector::new(config.collect),
            sender,
            display: config.display,
            progress: Progress::new(),
        }
    }

    /// Run forever. A failed cycle is logged and the next one starts; the
    /// loop only ends when the surrounding task is cancelled.
    pub async fn run(&mut self) {
        info!(
            agent = %self.name,
            destination = %self.sender.destination(),
            identity = self.identity.as_deref().unwrap_or(""),
            "agent starting"
        );

        // Give the terminal a beat before the first report scrolls in.
        tokio::time::sleep(Duration::from_secs(1)).await;

        loop {
            self.progress.tick();
            self.cycle().await;
        }
    }

    /// One collect-render-send cycle. Never fails; every error path is
    /// logged and absorbed.
    async fn cycle(&mut self) {
        let snapshot = match self.collector.collect().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "collection failed, skipping cycle");
                return;
            }
        };

        if self.display.snapshot {
            render::render_snapshot(&snapshot);
        }
        if self.display.processes {
            render::render_processes(&snapshot);
        }

        let record = FlatRecord::build(self.identity.as_deref(), &self.name, &snapshot);
        let payload = match record.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "encoding failed, skipping send");
                return;
            }
        };

        if self.display.payload {
            render::render_payload(&payload);
        }

        self.sender.send(&payload).await;
    }
}

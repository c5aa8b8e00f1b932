//! Stdio host for the bridge
//!
//! Reads one JSON command per line from stdin, writes replies and the
//! multiplexed event stream to stdout, and diagnostics to stderr. Remote
//! clients are in-process loopback clients.

use anyhow::Result;
use pusher_host::bin_common::{
    handle_line, init_tracing_with_level, join_worker, load_config_from_env, BinaryRunner,
    BridgeConfig, ConfigType, RunConfig,
};
use pusher_host::pusher_bridge::{InstanceManager, LoopbackFactory};
use std::sync::Arc;
use std::thread;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

struct StdioBridge {
    config: RunConfig,
    manager: InstanceManager,
}

impl StdioBridge {
    fn new(config: RunConfig) -> Self {
        Self {
            config,
            manager: InstanceManager::new(Arc::new(LoopbackFactory::new())),
        }
    }
}

impl BinaryRunner for StdioBridge {
    async fn run(&mut self) -> Result<()> {
        let multiplexer = Arc::clone(self.manager.multiplexer());
        let mut events = multiplexer.attach_async();

        let diagnostics_thread = if self.config.emit_diagnostics {
            let rx = multiplexer.attach_diagnostics();
            Some(thread::spawn(move || {
                for diagnostic in rx.iter() {
                    match serde_json::to_string(&diagnostic) {
                        Ok(json) => eprintln!("{}", json),
                        Err(e) => warn!("Could not encode diagnostic: {}", e),
                    }
                }
            }))
        } else {
            None
        };

        // Single writer keeps stdout lines whole; events queued by a command
        // are written before that command's reply
        let (reply_tx, mut replies) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            let mut events_open = true;
            let mut replies_open = true;

            while events_open || replies_open {
                let line = tokio::select! {
                    biased;
                    event = events.recv(), if events_open => match event {
                        Some(line) => line,
                        None => {
                            events_open = false;
                            continue;
                        }
                    },
                    reply = replies.recv(), if replies_open => match reply {
                        Some(line) => line,
                        None => {
                            replies_open = false;
                            continue;
                        }
                    },
                };
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut handled = 0u64;
        while let Some(line) = lines.next_line().await? {
            let Some(reply) = handle_line(&self.manager, &line) else {
                continue;
            };
            handled += 1;
            if reply_tx.send(reply.to_json()).is_err() {
                warn!("Output closed, stopping");
                break;
            }
        }

        drop(reply_tx);
        multiplexer.detach();
        multiplexer.detach_diagnostics();
        writer.await??;
        if let Some(handle) = diagnostics_thread {
            join_worker("Diagnostics writer", handle);
        }

        let metrics = multiplexer.metrics();
        info!(
            "Handled {} requests across {} instances ({} messages delivered, {} dropped)",
            handled,
            self.manager.instance_count(),
            metrics.delivered,
            metrics.dropped
        );
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load config first (before logging is initialized)
    let config_path = load_config_from_env(ConfigType::Bridge);
    let config = BridgeConfig::load(&config_path)?;

    init_tracing_with_level(&config.log_level);
    config.log();

    let mut app = StdioBridge::new(RunConfig::from_bridge_config("bridge_stdio", &config));
    app.execute().await
}

use anyhow::{Context, Result, anyhow};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::bus::EventBus;
use crate::config::Config;
use crate::dispatcher::{Command, Dispatcher, Inbound};

/// Owns the configuration and the event bus. Subscribe through
/// [`AppContext::events`] before starting a monitor so no events are missed.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: Config,
    bus: EventBus,
}

impl AppContext {
    /// # Errors
    ///
    /// Returns an error when `config` does not validate.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("creating app context")?;
        let bus = EventBus::new(config.event_capacity);
        Ok(Self { config, bus })
    }

    /// # Errors
    ///
    /// Returns an error when the environment yields an invalid configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Start monitoring. Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(&self) -> Monitor {
        let (sender, receiver) = mpsc::channel(self.config.queue_capacity);
        let dispatcher = Dispatcher::new(&self.config, self.bus.clone());
        let task = tokio::spawn(dispatcher.run(receiver));

        info!(monotonic_counter.monitors_started = 1);
        Monitor { handle: MonitorHandle { sender }, task }
    }
}

/// Cloneable producer side of a running monitor.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<Command>,
}

impl MonitorHandle {
    /// Queue an inbound record, waiting if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns an error once the monitor has stopped.
    pub async fn send(&self, inbound: Inbound) -> Result<()> {
        self.sender
            .send(Command::Inbound(inbound))
            .await
            .map_err(|err| anyhow!("monitor stopped: {err}"))
    }
}

/// A running dispatcher task.
#[derive(Debug)]
pub struct Monitor {
    handle: MonitorHandle,
    task: JoinHandle<()>,
}

impl Monitor {
    #[must_use]
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    /// # Errors
    ///
    /// Returns an error once the monitor has stopped.
    pub async fn send(&self, inbound: Inbound) -> Result<()> {
        self.handle.send(inbound).await
    }

    /// Stop monitoring. Records already queued are processed, then any open
    /// trip is finalized with the samples collected so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatcher task panicked.
    pub async fn stop(self) -> Result<()> {
        // the task may already have exited if every handle was dropped
        if self.handle.sender.send(Command::Stop).await.is_err() {
            info!("dispatcher already stopped");
        }
        drop(self.handle);
        self.task.await.context("joining dispatcher task")?;
        info!(monotonic_counter.monitors_stopped = 1);
        Ok(())
    }
}

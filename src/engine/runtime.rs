// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::bundler::{Bundler, run_build};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::project::ProjectLayout;

use super::core::CoreRuntime;
use super::{BuildPlan, CoreCommand, CoreStep, Notification, RuntimeEvent};

/// Drives [`CoreRuntime`] in response to `RuntimeEvent`s and runs the builds
/// it asks for.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. This struct handles async IO: reading events from
/// channels, sleeping until the debounce deadline, spawning bundler
/// invocations and reloading the project layout.
pub struct Runtime<B: Bundler + 'static> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    /// Handed to build tasks so they can report completion.
    event_tx: mpsc::Sender<RuntimeEvent>,
    bundler: Arc<B>,
    fs: Arc<dyn FileSystem>,
    notify_tx: Option<mpsc::UnboundedSender<Notification>>,
}

impl<B: Bundler + 'static> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: Bundler + 'static> Runtime<B> {
    pub fn new(
        core: CoreRuntime,
        event_tx: mpsc::Sender<RuntimeEvent>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        bundler: Arc<B>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            bundler,
            fs,
            notify_tx: None,
        }
    }

    /// Publish lifecycle notifications on `tx`.
    pub fn with_notifications(mut self, tx: mpsc::UnboundedSender<Notification>) -> Self {
        self.notify_tx = Some(tx);
        self
    }

    /// Main event loop.
    ///
    /// - Starts the initial build sequence.
    /// - Consumes `RuntimeEvent`s from `event_rx`, waking up on its own when
    ///   the core's timer deadline passes.
    /// - Executes commands returned by the core.
    ///
    /// Returns the core so callers can inspect the final build states.
    pub async fn run(mut self) -> Result<CoreRuntime> {
        info!("bundlewatch runtime started");

        let step = self.core.start();
        let mut keep_running = self.execute(step).await?;

        while keep_running {
            let deadline = self.core.deadline();

            let event = tokio::select! {
                maybe = self.event_rx.recv() => match maybe {
                    Some(e) => e,
                    None => {
                        info!("runtime event channel closed; exiting");
                        break;
                    }
                },
                _ = sleep_until_deadline(deadline) => RuntimeEvent::TimerElapsed,
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event, Instant::now());
            keep_running = self.execute(step).await?;

            if !keep_running {
                info!("core requested exit; stopping runtime");
            }
        }

        info!("runtime exiting");
        Ok(self.core)
    }

    /// Execute the commands of one core step (and of any steps they produce).
    async fn execute(&mut self, step: CoreStep) -> Result<bool> {
        let mut keep_running = step.keep_running;
        let mut pending = step.commands;
        pending.reverse();

        while let Some(command) = pending.pop() {
            match command {
                CoreCommand::StartBuild(plan) => self.spawn_build(plan),
                CoreCommand::Notify(notification) => self.publish(notification),
                CoreCommand::Reinitialize => {
                    let layout = self.reload_layout();
                    self.bundler.reset();
                    let next = self.core.reinitialize(layout);
                    keep_running &= next.keep_running;
                    pending.extend(next.commands.into_iter().rev());
                }
            }
        }

        Ok(keep_running)
    }

    fn spawn_build(&self, plan: BuildPlan) {
        let bundler = Arc::clone(&self.bundler);
        let fs = Arc::clone(&self.fs);
        let tx = self.event_tx.clone();

        debug!(target_kind = %plan.target(), generation = plan.generation, "spawning build");

        tokio::spawn(async move {
            let outcome = run_build(bundler.as_ref(), fs, &plan).await;
            let event = RuntimeEvent::BuildFinished {
                target: plan.target(),
                generation: plan.generation,
                outcome,
            };
            if tx.send(event).await.is_err() {
                debug!("runtime gone; dropping build result");
            }
        });
    }

    fn publish(&self, notification: Notification) {
        debug!(?notification, "notification");
        if let Some(tx) = &self.notify_tx {
            // A dropped receiver just means nobody is listening any more.
            let _ = tx.send(notification);
        }
    }

    /// Re-read `package.json`; keep the current layout when that fails.
    fn reload_layout(&self) -> ProjectLayout {
        let settings = self.core.settings();
        match ProjectLayout::load(self.fs.as_ref(), &settings.package_json) {
            Ok(layout) => layout,
            Err(err) => {
                warn!(
                    error = %format!("{err:#}"),
                    "failed to reload project layout; keeping the previous one"
                );
                settings.layout.clone()
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

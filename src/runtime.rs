//! Background task that owns the studio world and serializes commands.

use std::sync::{Arc, RwLock};

use anyhow::{Context, anyhow};
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::simulation::{ObserverSnapshot, StudioCommand, StudioWorld};

pub struct StudioRequest {
    pub command: StudioCommand,
    /// Receives the snapshot taken right after the command was processed.
    pub reply: Option<oneshot::Sender<ObserverSnapshot>>,
}

/// Cloneable front door to the studio task.
#[derive(Clone)]
pub struct StudioHandle {
    tx: mpsc::Sender<StudioRequest>,
    observer: Arc<RwLock<ObserverSnapshot>>,
}

impl StudioHandle {
    /// Fire-and-forget; the TUI reads results from the observer.
    pub async fn send(&self, command: StudioCommand) -> anyhow::Result<()> {
        self.tx
            .send(StudioRequest {
                command,
                reply: None,
            })
            .await
            .map_err(|_| anyhow!("studio task has stopped"))
    }

    /// Sends a command and waits for the resulting snapshot.
    pub async fn request(&self, command: StudioCommand) -> anyhow::Result<ObserverSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StudioRequest {
                command,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| anyhow!("studio task has stopped"))?;
        reply_rx.await.context("studio task dropped the reply")
    }

    pub fn snapshot(&self) -> ObserverSnapshot {
        match self.observer.read() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Moves `studio` onto a tokio task that processes one command at a time.
pub fn spawn_studio(
    mut studio: StudioWorld,
    shutdown: Arc<Notify>,
) -> (StudioHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<StudioRequest>(64);
    let observer = studio.observer();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                request = rx.recv() => {
                    let Some(request) = request else {
                        // All handles dropped
                        break;
                    };
                    debug!(command = ?request.command, "studio command");
                    studio.apply(request.command);
                    if let Some(reply) = request.reply {
                        reply.send(studio.snapshot()).ok();
                    }
                },
                _ = shutdown.notified() => break,
            }
        }
    });

    (StudioHandle { tx, observer }, task)
}

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::MessagePipeline;
use crate::error::{Result, TubeError};

/// Message lifecycle events published by the host chat, carrying the
/// index of the affected message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageEvent {
    Sent(usize),
    Received(usize),
    Edited(usize),
}

impl MessageEvent {
    pub fn index(&self) -> usize {
        match self {
            MessageEvent::Sent(index)
            | MessageEvent::Received(index)
            | MessageEvent::Edited(index) => *index,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageEvent::Sent(_) => "sent",
            MessageEvent::Received(_) => "received",
            MessageEvent::Edited(_) => "edited",
        }
    }
}

/// Host storage for chat messages
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn message_text(&self, index: usize) -> Option<String>;

    async fn update_message(&self, index: usize, text: String) -> Result<()>;
}

/// Chat log kept in memory
#[derive(Debug, Default)]
pub struct InMemoryChatStore {
    messages: RwLock<Vec<String>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns its index.
    pub fn push(&self, text: impl Into<String>) -> usize {
        let mut messages = self.messages.write();
        messages.push(text.into());
        messages.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<String> {
        self.messages.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn message_text(&self, index: usize) -> Option<String> {
        self.get(index)
    }

    async fn update_message(&self, index: usize, text: String) -> Result<()> {
        match self.messages.write().get_mut(index) {
            Some(message) => {
                *message = text;
                Ok(())
            }
            None => Err(TubeError::MessageNotFound(index)),
        }
    }
}

/// Runs the pipeline for one event and writes the result back.
///
/// Returns whether the stored message changed.
pub async fn handle_event(
    event: MessageEvent,
    store: &dyn ChatStore,
    pipeline: &MessagePipeline,
) -> Result<bool> {
    let index = event.index();
    let text = store
        .message_text(index)
        .await
        .ok_or(TubeError::MessageNotFound(index))?;

    let processed = pipeline.process_message(&text).await?;
    if processed == text {
        return Ok(false);
    }

    store.update_message(index, processed).await?;
    debug!("✏️ Rewrote {} message {}", event.as_str(), index);
    Ok(true)
}

/// Handle to the background task that listens for message events.
///
/// The event bus, chat store and pipeline are supplied by the host;
/// [`EmbedSubsystem::shutdown`] stops listening and waits for the task.
pub struct EmbedSubsystem {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EmbedSubsystem {
    pub fn start(
        mut events: broadcast::Receiver<MessageEvent>,
        store: Arc<dyn ChatStore>,
        pipeline: Arc<MessagePipeline>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            info!("🚀 YouTube embed subsystem listening for messages");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(event) => match handle_event(event, store.as_ref(), &pipeline).await {
                            Ok(_) => {}
                            Err(TubeError::MessageNotFound(index)) => {
                                debug!("Message {} is gone, skipping {} event", index, event.as_str());
                            }
                            Err(e) => {
                                error!("❌ Could not process {} message {}: {}", event.as_str(), event.index(), e);
                            }
                        },
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("⚠️ Event bus lagged, {} message events skipped", skipped);
                        }
                        Err(RecvError::Closed) => {
                            info!("Event bus closed");
                            break;
                        }
                    },
                }
            }

            info!("🛑 YouTube embed subsystem stopped");
        });

        Self { cancel, task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops listening. A message already being processed is finished first.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!("❌ Embed subsystem task failed: {:?}", e);
        }
    }
}

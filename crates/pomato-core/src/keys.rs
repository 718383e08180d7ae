//! Keystroke multiplexer.
//!
//! One task consumes the raw byte channel and republishes two notifications,
//! space and return. Only tasks already waiting are woken: a key pressed
//! while nobody listens is dropped, so stale presses never replay into a
//! later countdown or prompt.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;

use crate::error::{EngineError, Result};

/// Classified input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Space,
    Return,
    Other(u8),
}

impl KeyEvent {
    pub fn classify(byte: u8) -> Self {
        match byte {
            b' ' => KeyEvent::Space,
            b'\n' | b'\r' => KeyEvent::Return,
            other => KeyEvent::Other(other),
        }
    }
}

struct Channels {
    space: Notify,
    enter: Notify,
    closed: watch::Sender<bool>,
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Handle to the running multiplexer. Clones share the same task, which is
/// aborted when the last clone is dropped.
#[derive(Clone)]
pub struct Keystrokes {
    channels: Arc<Channels>,
    _task: Arc<AbortOnDrop>,
}

impl Keystrokes {
    /// Spawn the multiplexer over a raw byte channel.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut bytes: mpsc::Receiver<u8>) -> Self {
        let (closed, _) = watch::channel(false);
        let channels = Arc::new(Channels {
            space: Notify::new(),
            enter: Notify::new(),
            closed,
        });

        let shared = Arc::clone(&channels);
        let task = tokio::spawn(async move {
            while let Some(byte) = bytes.recv().await {
                match KeyEvent::classify(byte) {
                    KeyEvent::Space => shared.space.notify_waiters(),
                    KeyEvent::Return => shared.enter.notify_waiters(),
                    KeyEvent::Other(b) => tracing::trace!(byte = b, "ignored key"),
                }
            }
            tracing::debug!("keystroke source closed");
            shared.closed.send_replace(true);
        });

        Self {
            channels,
            _task: Arc::new(AbortOnDrop(task)),
        }
    }

    pub(crate) fn space(&self) -> &Notify {
        &self.channels.space
    }

    pub fn is_closed(&self) -> bool {
        *self.channels.closed.borrow()
    }

    /// Resolves once the byte stream has ended.
    pub(crate) async fn closed(&self) {
        let mut rx = self.channels.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Block until the next return key.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InputClosed`] if the byte stream ends first.
    pub async fn wait_for_return(&self) -> Result<()> {
        let pressed = self.channels.enter.notified();
        tokio::pin!(pressed);
        pressed.as_mut().enable();

        tokio::select! {
            _ = &mut pressed => Ok(()),
            _ = self.closed() => Err(EngineError::InputClosed),
        }
    }
}

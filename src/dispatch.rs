//! Delivery of background results to the UI thread.
//!
//! Background tasks never touch UI state. They post a [`ShellMessage`] into
//! the inbox and ask egui for a repaint; the shell drains the inbox at the
//! start of every frame.

use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;
use tracing::warn;

use crate::amiibo::AmiiboEntry;
use crate::controller::capture::CaptureReport;
use crate::library::GameEntry;

#[derive(Debug)]
pub enum ShellMessage {
    Capture(CaptureReport),
    LibraryLoaded(Vec<GameEntry>),
    AmiiboLoaded(Vec<AmiiboEntry>),
    TitleExited { path: PathBuf, played: Duration },
    TitleFailed { path: PathBuf, error: String },
}

#[derive(Clone, Debug)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<ShellMessage>,
    ctx: Option<egui::Context>,
}

impl UiDispatcher {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ShellMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, ctx: None }, rx)
    }

    /// Same inbox, additionally waking the given egui context on every post.
    pub fn with_repaint(&self, ctx: egui::Context) -> Self {
        Self {
            tx: self.tx.clone(),
            ctx: Some(ctx),
        }
    }

    pub fn post(&self, message: ShellMessage) {
        if let Err(e) = self.tx.send(message) {
            warn!("UI inbox closed, dropping {:?}", e.0);
            return;
        }
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_reach_the_inbox_in_order() {
        let (dispatcher, mut inbox) = UiDispatcher::channel();
        dispatcher.post(ShellMessage::LibraryLoaded(Vec::new()));
        dispatcher.post(ShellMessage::AmiiboLoaded(Vec::new()));

        assert!(matches!(inbox.try_recv(), Ok(ShellMessage::LibraryLoaded(_))));
        assert!(matches!(inbox.try_recv(), Ok(ShellMessage::AmiiboLoaded(_))));
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn closed_inbox_does_not_panic() {
        let (dispatcher, inbox) = UiDispatcher::channel();
        drop(inbox);
        dispatcher.post(ShellMessage::LibraryLoaded(Vec::new()));
    }
}

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in ipakit
//!
//! This crate provides a domain-driven event system. All user-visible
//! output flows through events; only the CLI renders them. Library crates
//! emit and never print.

pub mod events;
pub use events::{
    AppEvent, DownloadEvent, FailureContext, GeneralEvent, SignatureEvent, StoreEvent,
};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for the event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for the event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout the system
///
/// A single, consistent API whether you hold a raw `EventSender` or a
/// struct that optionally carries one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if the receiver is dropped we continue
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit an operation failed event
    fn emit_operation_failed(&self, operation: impl Into<String>, failure: FailureContext) {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            failure,
        }));
    }

    /// Emit a download started event
    fn emit_download_started(&self, url: impl Into<String>, total_size: Option<u64>) {
        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: url.into(),
            total_size,
        }));
    }

    /// Emit a download progress event
    fn emit_download_progress(&self, url: impl Into<String>, bytes: u64, total: Option<u64>) {
        self.emit(AppEvent::Download(DownloadEvent::Progress {
            url: url.into(),
            bytes_downloaded: bytes,
            total_bytes: total,
        }));
    }

    /// Emit a download completed event
    fn emit_download_completed(&self, url: impl Into<String>, final_size: u64) {
        self.emit(AppEvent::Download(DownloadEvent::Completed {
            url: url.into(),
            final_size,
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emitter_delivers_to_receiver() {
        let (tx, mut rx) = channel();
        tx.emit_warning("careful");
        match rx.recv().await {
            Some(AppEvent::General(GeneralEvent::Warning { message, .. })) => {
                assert_eq!(message, "careful");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropped_receiver_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        // Must not panic or error
        tx.emit_debug("into the void");
    }

    #[test]
    fn log_levels_follow_severity() {
        let warning = AppEvent::General(GeneralEvent::warning("careful"));
        assert_eq!(warning.log_level(), tracing::Level::WARN);

        let failed = AppEvent::Download(DownloadEvent::Failed {
            url: "https://example.com/pkg.ipa".to_string(),
            error: "connection reset".to_string(),
        });
        assert_eq!(failed.log_level(), tracing::Level::ERROR);

        let progress = AppEvent::Download(DownloadEvent::Progress {
            url: "https://example.com/pkg.ipa".to_string(),
            bytes_downloaded: 1,
            total_bytes: None,
        });
        assert_eq!(progress.log_level(), tracing::Level::DEBUG);
    }
}

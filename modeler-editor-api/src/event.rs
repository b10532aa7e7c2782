//! Editor lifecycle events and the channel they travel on.
//!
//! Editors never call back into the tab that owns them. Instead every editor
//! holds an [`EventSink`] scoped to its definition id and emits typed
//! [`EditorEvent`]s into it; the owning tab drains the receiving end and
//! reacts (forwarding state to the menu, surfacing logs, and so on).
//!
//! # Example
//!
//! ```rust
//! use modeler_editor_api::{EditorEvent, EventSink};
//!
//! let (sink, mut receiver) = EventSink::channel("diagram");
//! sink.emit(EditorEvent::Shown);
//!
//! let message = receiver.try_recv().unwrap();
//! assert_eq!(message.source(), "diagram");
//! assert!(matches!(message.event(), EditorEvent::Shown));
//! ```

use crate::state::StateContext;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Problem found while importing a diagram that did not prevent the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportWarning {
    /// Description of the problem
    pub message: String,
}

impl ImportWarning {
    /// Create a new import warning.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of one import round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Content that was imported
    pub xml: String,
    /// Import failure, if the engine rejected the content
    pub error: Option<String>,
    /// Warnings produced by a successful import
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    /// Whether the import produced warnings worth surfacing.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether the engine rejected the content.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of one save round-trip.
///
/// A failed save carries an error and no content; a successful save always
/// carries content, which may legitimately be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    /// Serialized content on success
    pub xml: Option<String>,
    /// Failure reason on error
    pub error: Option<String>,
}

impl SaveReport {
    /// Report for a successful save.
    pub fn success<S: Into<String>>(xml: S) -> Self {
        Self {
            xml: Some(xml.into()),
            error: None,
        }
    }

    /// Report for a failed save.
    pub fn failure<S: Into<String>>(error: S) -> Self {
        Self {
            xml: None,
            error: Some(error.into()),
        }
    }
}

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// A line written to the application log panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Create a warning line.
    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self {
            level: LogLevel::Warning,
            message: message.into(),
        }
    }

    /// Create an error line.
    pub fn error<S: Into<String>>(message: S) -> Self {
        Self {
            level: LogLevel::Error,
            message: message.into(),
        }
    }
}

/// Layout of the properties panel next to a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelLayout {
    pub open: bool,
    pub width: u32,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            open: false,
            width: 250,
        }
    }
}

/// Layout of the log panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLayout {
    pub open: bool,
    /// Set when the user cleared the log
    pub cleared: bool,
}

/// Application layout as seen by an editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorLayout {
    pub properties_panel: PanelLayout,
    pub log: LogLayout,
}

/// Something that happened inside an editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// An import of the given content is starting
    Import { xml: String },
    /// An import finished, successfully or not
    Imported(ImportReport),
    /// The editor is up to date; carries the last import, if still shown
    Updated(Option<ImportReport>),
    /// The editor became visible with current content
    Shown,
    /// A save is starting; observers may stamp metadata now
    Save,
    /// A save finished
    Saved(SaveReport),
    /// A fresh state snapshot was derived
    StateUpdated(StateContext),
    /// Lines for the log panel
    Log(Vec<LogEntry>),
    /// Request to open or close the log panel
    LogToggle { open: bool },
    /// The editor's visible state changed and needs a re-render
    Changed,
    /// The editor requests a layout change
    LayoutChanged(EditorLayout),
    /// A context menu was requested; carries the menu id
    ContextMenuOpen(String),
}

/// An [`EditorEvent`] tagged with the editor it came from.
#[derive(Debug, Clone)]
pub struct EditorMessage {
    id: Uuid,
    source: String,
    event: EditorEvent,
    timestamp: chrono::DateTime<chrono::Utc>,
}

impl EditorMessage {
    /// Unique id of this message.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Id of the editor definition that emitted the event.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The event itself.
    pub fn event(&self) -> &EditorEvent {
        &self.event
    }

    /// Consume the message, returning the event.
    pub fn into_event(self) -> EditorEvent {
        self.event
    }

    /// Time the event was emitted.
    pub fn timestamp(&self) -> chrono::DateTime<chrono::Utc> {
        self.timestamp
    }
}

/// Sending half of the editor event channel.
///
/// Emitting never fails: once the receiving tab is gone, events are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: Option<UnboundedSender<EditorMessage>>,
    source: String,
}

impl EventSink {
    /// Create a new channel whose sink is scoped to `source`.
    pub fn channel<S: Into<String>>(source: S) -> (Self, UnboundedReceiver<EditorMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
                source: source.into(),
            },
            receiver,
        )
    }

    /// A sink that discards every event.
    pub fn detached<S: Into<String>>(source: S) -> Self {
        Self {
            sender: None,
            source: source.into(),
        }
    }

    /// Clone this sink for another editor on the same channel.
    pub fn scoped<S: Into<String>>(&self, source: S) -> Self {
        Self {
            sender: self.sender.clone(),
            source: source.into(),
        }
    }

    /// The id events from this sink are tagged with.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Emit an event.
    pub fn emit(&self, event: EditorEvent) {
        let Some(sender) = &self.sender else {
            return;
        };

        let message = EditorMessage {
            id: Uuid::new_v4(),
            source: self.source.clone(),
            event,
            timestamp: chrono::Utc::now(),
        };

        if sender.send(message).is_err() {
            tracing::trace!("Dropping event from {}: receiver closed", self.source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_sinks_share_channel() {
        let (sink, mut receiver) = EventSink::channel("diagram");
        let xml_sink = sink.scoped("xml");

        sink.emit(EditorEvent::Save);
        xml_sink.emit(EditorEvent::Changed);

        let first = receiver.try_recv().unwrap();
        let second = receiver.try_recv().unwrap();
        assert_eq!(first.source(), "diagram");
        assert_eq!(second.source(), "xml");
        assert_ne!(first.id(), second.id());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (sink, receiver) = EventSink::channel("diagram");
        drop(receiver);
        sink.emit(EditorEvent::Shown);

        EventSink::detached("none").emit(EditorEvent::Shown);
    }

    #[test]
    fn test_save_report_distinguishes_empty_content() {
        let empty = SaveReport::success("");
        assert_eq!(empty.xml.as_deref(), Some(""));
        assert!(empty.error.is_none());

        let failed = SaveReport::failure("no definitions");
        assert!(failed.xml.is_none());
    }
}

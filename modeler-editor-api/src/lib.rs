//! # Modeler Editor API
//!
//! Contracts and shared data for the editors hosted by the modeler. This crate
//! defines what an editor is ([`Editor`]), what it wraps ([`DiagramEngine`]),
//! what it reports ([`EditorEvent`], [`StateContext`]) and the typed actions it
//! accepts ([`EditorAction`]). Concrete editors live in `modeler-editors`;
//! tabs, menus and dialogs live in `modeler-core`.
//!
//! ## Data flow
//!
//! An editor drives its engine, derives a [`StateContext`] from what the
//! engine reports and emits it as [`EditorEvent::StateUpdated`] through its
//! [`EventSink`]. The owning tab forwards the snapshot unchanged to the menu
//! builder.
//!
//! ## Example
//!
//! ```rust
//! use modeler_editor_api::{EditorAction, StateContext};
//! use serde_json::json;
//!
//! let action = EditorAction::parse("zoomIn", &json!({})).unwrap();
//! assert_eq!(action.name(), "zoomIn");
//!
//! let state = StateContext { bpmn: true, editable: true, ..StateContext::default() };
//! assert!(state.editable);
//! ```

pub mod action;
pub mod editor;
pub mod engine;
pub mod error;
pub mod event;
pub mod i18n;
pub mod options;
pub mod state;

pub use action::{Alignment, ClauseKind, Direction, EditorAction};
pub use editor::{Editor, EditorFactory, ImportOutcome, InitialState, PendingImport};
pub use engine::{
    DiagramEngine, EngineEvent, EngineFactory, EngineFuture, SaveOptions, TableSelection,
};
pub use error::{EditorError, EditorResult, EngineError};
pub use event::{
    EditorEvent, EditorLayout, EditorMessage, EventSink, ImportReport, ImportWarning, LogEntry,
    LogLayout, LogLevel, PanelLayout, SaveReport,
};
pub use i18n::{Language, Locale};
pub use options::{AppMetadata, EditorOptions};
pub use state::{ActiveView, DiagramType, ExportFormat, StateContext};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports_compose() {
        let (sink, mut receiver) = EventSink::channel("diagram");
        sink.emit(EditorEvent::StateUpdated(StateContext {
            dmn: true,
            active_editor: Some(ActiveView::Table),
            ..StateContext::default()
        }));

        let message = receiver.try_recv().unwrap();
        match message.into_event() {
            EditorEvent::StateUpdated(state) => {
                assert_eq!(state.diagram_type(), Some(DiagramType::Dmn));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_default_options() {
        let options = EditorOptions::default();
        assert_eq!(options.locale.language(), Language::En);
        assert_eq!(options.metadata.name, "Modeler");
        assert!(!options.layout.properties_panel.open);
    }
}

//! Contract for the diagram engine an editor wraps.
//!
//! The engine owns parsing, rendering and the command stack. Editors only see
//! the narrow surface below: import and serialization as `'static` futures
//! (so an editor can hand an in-flight import to its tab and keep serving
//! other calls), command stack introspection, selection and clipboard state,
//! and a subscription to engine events.

use crate::error::EngineError;
use crate::event::ImportWarning;
use crate::state::ActiveView;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Future returned by asynchronous engine operations.
pub type EngineFuture<T> = BoxFuture<'static, Result<T, EngineError>>;

/// Creates engine instances on demand.
///
/// Editors create their engine lazily on first use, never at construction.
pub type EngineFactory = Arc<dyn Fn() -> Box<dyn DiagramEngine> + Send + Sync>;

/// Notifications published by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// `commandStack.changed`
    CommandStackChanged,
    /// `selection.changed`
    SelectionChanged,
    /// `elements.copied`
    ElementsCopied,
    /// `import.parse.start`
    ImportParseStart,
    /// `import.done`
    ImportDone,
    /// The engine reported an internal error
    Error(String),
}

/// Options for serializing a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Pretty-print the output
    pub format: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { format: true }
    }
}

/// What is selected inside a decision table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSelection {
    /// A rule cell is being edited
    pub rule: bool,
    /// A clause header is being edited
    pub clause: bool,
}

/// A modeling engine instance.
pub trait DiagramEngine: Send {
    /// Import serialized content, replacing the current diagram.
    ///
    /// Resolves with the warnings produced by a successful import.
    fn import_xml(&mut self, xml: &str) -> EngineFuture<Vec<ImportWarning>>;

    /// Serialize the current diagram.
    fn save_xml(&self, options: SaveOptions) -> EngineFuture<String>;

    /// Render the current diagram as SVG.
    fn save_svg(&self) -> EngineFuture<String>;

    /// Whether a diagram has been imported successfully.
    fn is_imported(&self) -> bool;

    /// Current command stack position, `-1` when the stack is empty.
    fn stack_index(&self) -> i64;

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    fn undo(&mut self);

    fn redo(&mut self);

    /// Ids of the selected elements.
    fn selection(&self) -> Vec<String>;

    /// Whether the clipboard is empty.
    fn clipboard_is_empty(&self) -> bool;

    /// Subscribe to engine events.
    fn subscribe(&mut self) -> UnboundedReceiver<EngineEvent>;

    /// Whether the engine ships the editor actions module.
    fn has_editor_actions(&self) -> bool {
        true
    }

    /// Trigger an engine level editor action.
    fn trigger_editor_action(&mut self, action: &str, options: &Value) -> Result<(), EngineError>;

    /// Fire a named event on the engine's event bus.
    fn fire(&mut self, event: &str) -> Result<(), EngineError>;

    /// Record the exporting application on the diagram's root element.
    fn set_exporter(&mut self, name: &str, version: &str);

    /// Let the canvas know its container was resized.
    fn resize(&mut self) -> Result<(), EngineError>;

    /// Sub-view currently shown, for engines with more than one.
    fn active_view(&self) -> ActiveView {
        ActiveView::Diagram
    }

    /// Table editing state, for engines with a table view.
    fn table_selection(&self) -> TableSelection {
        TableSelection::default()
    }

    /// Release engine resources.
    fn destroy(&mut self) {}
}

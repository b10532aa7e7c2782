//! The editor capability shared by every editor variant.
//!
//! An [`Editor`] wraps one engine (or a plain text buffer), derives
//! [`StateContext`] snapshots from it and exposes the import, save and action
//! operations a tab needs. Imports are split in two halves: [`Editor::update`]
//! starts the import and returns a [`PendingImport`] that does not borrow the
//! editor, and [`Editor::finish_import`] applies the resolved outcome. Each
//! pending import carries the generation it was started under so outcomes
//! that arrive after a newer import, or after the editor was destroyed, are
//! recognised as stale and dropped.

use crate::action::EditorAction;
use crate::engine::EngineFuture;
use crate::error::{EditorError, EditorResult, EngineError};
use crate::event::{EditorLayout, EventSink, ImportWarning};
use crate::state::StateContext;
use async_trait::async_trait;
use std::sync::Arc;

/// Bookkeeping used to decide whether an editor is dirty.
///
/// The struct is never mutated in place. Every transition returns a new value
/// with a bumped [`version`](InitialState::version), so each change to the
/// recorded stack index can be traced to exactly one call site.
///
/// # Example
///
/// ```rust
/// use modeler_editor_api::InitialState;
///
/// let opened = InitialState::new("<definitions/>", false);
/// let imported = opened.after_import("<definitions/>");
///
/// assert!(!imported.reimported);
/// assert_eq!(imported.stack_index, Some(-1));
/// assert!(!imported.is_dirty(-1));
/// assert!(imported.is_dirty(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitialState {
    /// Content the editor was opened with, or last saved
    pub xml: Option<String>,
    /// Explicit dirty marker, e.g. for never saved files
    pub dirty: bool,
    /// Command stack position at the last import or save
    pub stack_index: Option<i64>,
    /// An import is in flight
    pub importing: bool,
    /// Content was replaced under an editor that had already been used
    pub reimported: bool,
    version: u64,
}

impl InitialState {
    /// Initial state for freshly opened content.
    pub fn new<S: Into<String>>(xml: S, dirty: bool) -> Self {
        Self {
            xml: Some(xml.into()),
            dirty,
            ..Self::default()
        }
    }

    /// Number of transitions this state went through.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn next(&self) -> Self {
        Self {
            version: self.version + 1,
            ..self.clone()
        }
    }

    /// Set or clear the importing flag.
    pub fn with_importing(&self, importing: bool) -> Self {
        Self {
            importing,
            ..self.next()
        }
    }

    /// Record the stack position if none is recorded yet.
    pub fn with_stack_index_if_unset(&self, stack_index: i64) -> Self {
        if self.stack_index.is_some() {
            return self.clone();
        }

        Self {
            stack_index: Some(stack_index),
            ..self.next()
        }
    }

    /// Transition after content was imported.
    ///
    /// Importing the opened content clears the reimport flag. Importing
    /// anything else after a stack position was recorded marks the editor as
    /// reimported. A fresh import always leaves the command stack empty.
    pub fn after_import(&self, imported: &str) -> Self {
        let reimported = if self.xml.as_deref() == Some(imported) {
            false
        } else if self.stack_index.is_some() {
            true
        } else {
            self.reimported
        };

        Self {
            reimported,
            stack_index: Some(-1),
            importing: false,
            ..self.next()
        }
    }

    /// Transition after a successful save at the given stack position.
    pub fn after_save<S: Into<String>>(&self, saved: S, stack_index: i64) -> Self {
        Self {
            xml: Some(saved.into()),
            dirty: false,
            reimported: false,
            stack_index: Some(stack_index),
            ..self.next()
        }
    }

    /// Dirty check against the engine's current stack position.
    pub fn is_dirty(&self, current_stack_index: i64) -> bool {
        self.dirty || self.reimported || self.stack_index != Some(current_stack_index)
    }
}

/// Result of a resolved import, ready to be applied by the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Generation the import was started under
    pub generation: u64,
    /// Content that was imported
    pub xml: String,
    /// Warnings on success, engine failure otherwise
    pub result: Result<Vec<ImportWarning>, EngineError>,
}

/// An import that was started but not yet applied.
pub struct PendingImport {
    generation: u64,
    xml: String,
    future: EngineFuture<Vec<ImportWarning>>,
}

impl PendingImport {
    pub fn new(generation: u64, xml: String, future: EngineFuture<Vec<ImportWarning>>) -> Self {
        Self {
            generation,
            xml,
            future,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Wait for the engine to finish the import.
    pub async fn resolve(self) -> ImportOutcome {
        let result = self.future.await;

        ImportOutcome {
            generation: self.generation,
            xml: self.xml,
            result,
        }
    }
}

impl std::fmt::Debug for PendingImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingImport")
            .field("generation", &self.generation)
            .field("xml_len", &self.xml.len())
            .finish()
    }
}

/// Constructs an editor emitting into the given sink.
pub type EditorFactory = Arc<dyn Fn(EventSink) -> Box<dyn Editor> + Send + Sync>;

/// An editor shown inside a tab.
///
/// Implementations must only do real work while mounted; calls made while
/// unmounted are deferred to the next [`update`](Editor::update) after
/// [`mount`](Editor::mount).
#[async_trait]
pub trait Editor: Send {
    /// Type tag, e.g. `bpmn` or `xml`.
    fn name(&self) -> &str;

    /// Id of the tab's editor definition this editor was created for.
    fn id(&self) -> &str;

    /// Attach the editor to the view.
    fn mount(&mut self);

    /// Detach the editor from the view.
    fn unmount(&mut self);

    fn is_mounted(&self) -> bool;

    /// Provide new content, optionally resetting the dirty bookkeeping.
    fn set_xml(&mut self, xml: String, initial_state: Option<InitialState>);

    /// Content last imported into, or saved from, this editor.
    fn last_xml(&self) -> Option<&str>;

    /// Whether the editor can represent the given content.
    fn accepts(&self, _content: &str) -> bool {
        true
    }

    /// Bring the editor up to date with its pending content.
    ///
    /// Returns the import to await when the engine has to do work, `None`
    /// when the update already completed (or was skipped while unmounted).
    fn update(&mut self) -> EditorResult<Option<PendingImport>>;

    /// Apply a resolved import.
    ///
    /// Returns `false` when the outcome was stale and has been discarded.
    fn finish_import(&mut self, _outcome: ImportOutcome) -> bool {
        false
    }

    /// Serialize the current content and record it as saved.
    async fn save_xml(&mut self) -> EditorResult<String>;

    /// Serialize the current content without touching the dirty
    /// bookkeeping, e.g. for exports.
    async fn serialize_xml(&mut self) -> EditorResult<String> {
        self.save_xml().await
    }

    /// Render the current content as SVG.
    async fn save_svg(&mut self) -> EditorResult<String> {
        Err(EditorError::export(format!(
            "{} editor cannot render images",
            self.name()
        )))
    }

    /// Perform an editor action.
    fn trigger_action(&mut self, action: &EditorAction) -> EditorResult<()>;

    /// Derive a fresh state snapshot and emit it.
    fn update_state(&mut self);

    /// Derive a fresh state snapshot without emitting it.
    fn current_state(&self) -> StateContext;

    /// Whether loading `xml` would discard the editor's history.
    fn is_history_lost(&self, xml: &str) -> bool {
        self.last_xml() != Some(xml)
    }

    /// Tell the editor whether a text input owns the keyboard.
    fn set_input_active(&mut self, _active: bool) {}

    /// Apply an application layout update.
    fn set_layout(&mut self, _layout: EditorLayout) {}

    /// Dismiss the import warnings overlay.
    fn hide_warnings(&mut self) {}

    /// Open the log panel.
    fn open_log(&mut self) {}

    /// React to queued engine events, returning how many were handled.
    fn pump_engine_events(&mut self) -> usize {
        0
    }

    /// Adapt to a changed container size.
    fn resize(&mut self) -> EditorResult<()> {
        Ok(())
    }

    /// Release the wrapped engine.
    fn destroy(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_bump_version() {
        let state = InitialState::new("<a/>", false);
        let importing = state.with_importing(true);
        let imported = importing.after_import("<a/>");

        assert_eq!(state.version(), 0);
        assert_eq!(importing.version(), 1);
        assert_eq!(imported.version(), 2);
        assert!(!imported.importing);
    }

    #[test]
    fn test_reimport_after_use_marks_dirty() {
        let opened = InitialState::new("<a/>", false).after_import("<a/>");
        let replaced = opened.after_import("<b/>");

        assert!(replaced.reimported);
        assert!(replaced.is_dirty(-1));

        let back = replaced.after_import("<a/>");
        assert!(!back.reimported);
        assert!(!back.is_dirty(-1));
    }

    #[test]
    fn test_first_import_of_other_content_is_not_reimport() {
        let state = InitialState::default().after_import("<b/>");
        assert!(!state.reimported);
        assert_eq!(state.stack_index, Some(-1));
    }

    #[test]
    fn test_dirty_sources_are_independent() {
        let clean = InitialState::new("<a/>", false).after_import("<a/>");
        assert!(!clean.is_dirty(-1));

        let explicit = InitialState { dirty: true, ..clean.clone() };
        assert!(explicit.is_dirty(-1));

        let reimported = InitialState { reimported: true, ..clean.clone() };
        assert!(reimported.is_dirty(-1));

        assert!(clean.is_dirty(3));
    }

    #[test]
    fn test_save_resets_baseline() {
        let state = InitialState::new("<a/>", true)
            .after_import("<a/>")
            .after_save("<a saved=\"1\"/>", 4);

        assert!(!state.dirty);
        assert_eq!(state.stack_index, Some(4));
        assert_eq!(state.xml.as_deref(), Some("<a saved=\"1\"/>"));
        assert!(!state.is_dirty(4));
    }

    #[test]
    fn test_stack_index_recorded_once() {
        let state = InitialState::default().with_stack_index_if_unset(2);
        assert_eq!(state.stack_index, Some(2));
        assert_eq!(state.with_stack_index_if_unset(7).stack_index, Some(2));
    }

    #[tokio::test]
    async fn test_pending_import_resolves_with_generation() {
        let future: EngineFuture<Vec<ImportWarning>> =
            Box::pin(async { Ok(vec![ImportWarning::new("unresolved reference")]) });
        let pending = PendingImport::new(3, "<a/>".to_string(), future);
        assert_eq!(pending.generation(), 3);

        let outcome = pending.resolve().await;
        assert_eq!(outcome.generation, 3);
        assert_eq!(outcome.xml, "<a/>");
        assert_eq!(outcome.result.unwrap().len(), 1);
    }
}

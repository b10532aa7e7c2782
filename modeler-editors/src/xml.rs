//! Plain text XML editor.
//!
//! The XML editor takes any content verbatim, which makes it the fallback
//! for every tab: content a diagram engine rejects is shown here instead of
//! being dropped. It keeps its own undo history in a [`TextBuffer`].

use async_trait::async_trait;
use modeler_editor_api::{
    Editor, EditorAction, EditorError, EditorEvent, EditorResult, EventSink, ImportReport,
    InitialState, PendingImport, SaveReport, StateContext,
};
use tracing::debug;

/// Text content with a bounded undo/redo history.
///
/// Every change advances a revision counter; undo steps it back and redo
/// forward. The revision plays the role of a command stack index for dirty
/// tracking, starting at `-1` for freshly loaded content.
///
/// # Example
///
/// ```rust
/// use modeler_editors::xml::TextBuffer;
///
/// let mut buffer = TextBuffer::new("<a/>");
/// buffer.replace("<a><b/></a>");
/// assert_eq!(buffer.revision(), 0);
///
/// assert!(buffer.undo());
/// assert_eq!(buffer.content(), "<a/>");
/// assert_eq!(buffer.revision(), -1);
/// assert!(buffer.can_redo());
/// ```
#[derive(Debug, Clone)]
pub struct TextBuffer {
    content: String,
    /// Undo history
    undo_history: Vec<String>,
    /// Redo history
    redo_history: Vec<String>,
    /// Maximum undo history size
    max_undo_history: usize,
    revision: i64,
}

impl TextBuffer {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            undo_history: Vec::new(),
            redo_history: Vec::new(),
            max_undo_history: 100,
            revision: -1,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Load new content, forgetting all history.
    pub fn reset<S: Into<String>>(&mut self, content: S) {
        *self = Self {
            max_undo_history: self.max_undo_history,
            ..Self::new(content)
        };
    }

    /// Replace the content as one undoable edit.
    ///
    /// Returns `false` when the content did not change.
    pub fn replace<S: Into<String>>(&mut self, content: S) -> bool {
        let content = content.into();
        if content == self.content {
            return false;
        }

        let previous = std::mem::replace(&mut self.content, content);
        self.undo_history.push(previous);

        if self.undo_history.len() > self.max_undo_history {
            self.undo_history.remove(0);
        }

        // A new edit invalidates everything that was undone
        self.redo_history.clear();
        self.revision += 1;
        true
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_history.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.content, previous);
        self.redo_history.push(current);
        self.revision -= 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_history.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.content, next);
        self.undo_history.push(current);
        self.revision += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_history.is_empty()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

/// Editor showing diagram content as text.
pub struct XmlEditor {
    events: EventSink,
    mounted: bool,
    last_xml: Option<String>,
    new_xml: Option<String>,
    buffer: TextBuffer,
    initial: InitialState,
}

impl XmlEditor {
    pub fn new(events: EventSink) -> Self {
        Self {
            events,
            mounted: false,
            last_xml: None,
            new_xml: None,
            buffer: TextBuffer::default(),
            initial: InitialState::default(),
        }
    }

    /// Current text, including unsaved edits.
    pub fn text(&self) -> &str {
        self.buffer.content()
    }

    /// Apply an edit made by the user.
    pub fn edit<S: Into<String>>(&mut self, text: S) {
        if self.buffer.replace(text) {
            self.update_state();
        }
    }

    fn shown(&mut self, report: Option<ImportReport>) {
        self.events.emit(EditorEvent::Updated(report));
        self.update_state();
        self.events.emit(EditorEvent::Shown);
    }
}

#[async_trait]
impl Editor for XmlEditor {
    fn name(&self) -> &str {
        "xml"
    }

    fn id(&self) -> &str {
        self.events.source()
    }

    fn mount(&mut self) {
        self.mounted = true;
    }

    fn unmount(&mut self) {
        self.mounted = false;
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn set_xml(&mut self, xml: String, initial_state: Option<InitialState>) {
        self.new_xml = Some(xml);

        if let Some(initial) = initial_state {
            self.initial = initial;
        }
    }

    fn last_xml(&self) -> Option<&str> {
        self.last_xml.as_deref()
    }

    fn update(&mut self) -> EditorResult<Option<PendingImport>> {
        if !self.mounted {
            debug!("[#update] skipping (not mounted)");
            return Ok(None);
        }

        let new_xml = match self.new_xml.clone() {
            Some(xml) if self.last_xml.as_ref() != Some(&xml) => xml,
            _ => {
                debug!("[#update] skipping (no change)");
                self.shown(None);
                return Ok(None);
            }
        };

        self.events.emit(EditorEvent::Import {
            xml: new_xml.clone(),
        });

        self.buffer.reset(new_xml.clone());
        self.initial = self.initial.after_import(&new_xml);
        self.last_xml = Some(new_xml.clone());

        let report = ImportReport {
            xml: new_xml,
            error: None,
            warnings: Vec::new(),
        };
        self.events.emit(EditorEvent::Imported(report.clone()));
        self.shown(Some(report));

        Ok(None)
    }

    async fn save_xml(&mut self) -> EditorResult<String> {
        debug!("[#saveXML] save");
        self.events.emit(EditorEvent::Save);

        let xml = self.buffer.content().to_string();
        self.events.emit(EditorEvent::Saved(SaveReport::success(xml.clone())));

        self.last_xml = Some(xml.clone());
        self.new_xml = Some(xml.clone());
        self.initial = self.initial.after_save(xml.clone(), self.buffer.revision());
        self.update_state();

        Ok(xml)
    }

    async fn serialize_xml(&mut self) -> EditorResult<String> {
        Ok(self.buffer.content().to_string())
    }

    fn trigger_action(&mut self, action: &EditorAction) -> EditorResult<()> {
        match action {
            EditorAction::Undo => {
                self.buffer.undo();
            }
            EditorAction::Redo => {
                self.buffer.redo();
            }
            // Clipboard and search are handled by the text view itself
            EditorAction::Copy
            | EditorAction::Paste
            | EditorAction::Find
            | EditorAction::FindNext
            | EditorAction::FindPrev
            | EditorAction::Replace => {
                debug!("Text view handles {}", action);
                return Ok(());
            }
            other => return Err(EditorError::UnknownAction(other.name().to_string())),
        }

        self.update_state();
        Ok(())
    }

    fn update_state(&mut self) {
        let state = self.current_state();
        self.events.emit(EditorEvent::StateUpdated(state));
    }

    fn current_state(&self) -> StateContext {
        StateContext {
            undo: self.buffer.can_undo(),
            redo: self.buffer.can_redo(),
            dirty: self.initial.is_dirty(self.buffer.revision()),
            editable: true,
            searchable: true,
            ..StateContext::default()
        }
    }

    fn destroy(&mut self) {
        self.mounted = false;
    }
}

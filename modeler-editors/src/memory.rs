//! A headless, in-memory [`DiagramEngine`].
//!
//! `MemoryEngine` keeps the imported document as text, runs a command stack
//! with the same indexing as the diagram engines it stands in for (`-1` when
//! empty, index of the last executed command otherwise) and publishes the
//! usual engine events. It renders nothing. The command line tool uses it to
//! drive editors without a window, and the test suites use it through a
//! [`MemoryEngineHandle`] to script edits and observe what editors ask of it.

use crate::content;
use modeler_editor_api::{
    ActiveView, DiagramEngine, EngineError, EngineEvent, EngineFactory, EngineFuture,
    ImportWarning, SaveOptions, TableSelection,
};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Debug, Clone)]
struct Command {
    label: String,
    before: String,
    after: String,
}

#[derive(Debug)]
struct EngineState {
    xml: Option<String>,
    ids: Vec<String>,
    stack: Vec<Command>,
    stack_index: i64,
    selection: Vec<String>,
    clipboard: Vec<String>,
    exporter: Option<(String, String)>,
    view: ActiveView,
    table: TableSelection,
    subscribers: Vec<UnboundedSender<EngineEvent>>,
    import_seq: u64,
    imports: usize,
    serializations: usize,
    triggered: Vec<(String, Value)>,
    fired: Vec<String>,
    resizes: usize,
    fail_next_save: Option<String>,
    fail_next_import: Option<String>,
    editor_actions: bool,
    event_bus: bool,
    destroyed: bool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            xml: None,
            ids: Vec::new(),
            stack: Vec::new(),
            stack_index: -1,
            selection: Vec::new(),
            clipboard: Vec::new(),
            exporter: None,
            view: ActiveView::Diagram,
            table: TableSelection::default(),
            subscribers: Vec::new(),
            import_seq: 0,
            imports: 0,
            serializations: 0,
            triggered: Vec::new(),
            fired: Vec::new(),
            resizes: 0,
            fail_next_save: None,
            fail_next_import: None,
            editor_actions: true,
            event_bus: true,
            destroyed: false,
        }
    }
}

impl EngineState {
    fn publish(&mut self, event: EngineEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn execute(&mut self, label: &str, after: String) -> Result<(), EngineError> {
        let before = self
            .xml
            .clone()
            .ok_or_else(|| EngineError::new("no diagram loaded"))?;

        let keep = (self.stack_index + 1) as usize;
        self.stack.truncate(keep);
        self.stack.push(Command {
            label: label.to_string(),
            before,
            after: after.clone(),
        });
        self.stack_index += 1;
        self.apply(after);

        debug!("Executed command {} at stack index {}", label, self.stack_index);
        self.publish(EngineEvent::CommandStackChanged);
        Ok(())
    }

    fn apply(&mut self, xml: String) {
        self.ids = content::inspect(&xml).map(|s| s.ids).unwrap_or_default();
        self.selection.retain(|id| self.ids.contains(id));
        self.xml = Some(xml);
    }

    fn can_undo(&self) -> bool {
        self.stack_index >= 0
    }

    fn can_redo(&self) -> bool {
        self.stack_index + 1 < self.stack.len() as i64
    }
}

/// Shared view of a [`MemoryEngine`]'s state.
///
/// Every engine created through [`MemoryEngineHandle::factory`] shares the
/// handle's state, so a test can keep the handle while an editor owns the
/// engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngineHandle {
    state: Arc<Mutex<EngineState>>,
}

impl MemoryEngineHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Engine factory whose engines share this handle's state.
    pub fn factory(&self) -> EngineFactory {
        let handle = self.clone();
        Arc::new(move || {
            Box::new(MemoryEngine::with_handle(handle.clone())) as Box<dyn DiagramEngine>
        })
    }

    /// Execute a command that replaces the document with `xml`.
    pub fn execute<S: Into<String>>(&self, label: &str, xml: S) -> Result<(), EngineError> {
        self.lock().execute(label, xml.into())
    }

    /// Execute a command that leaves the document text unchanged.
    pub fn touch(&self, label: &str) -> Result<(), EngineError> {
        let mut state = self.lock();
        let xml = state
            .xml
            .clone()
            .ok_or_else(|| EngineError::new("no diagram loaded"))?;
        state.execute(label, xml)
    }

    /// Replace the selection.
    pub fn select(&self, ids: &[&str]) {
        let mut state = self.lock();
        state.selection = ids.iter().map(|id| id.to_string()).collect();
        state.publish(EngineEvent::SelectionChanged);
    }

    /// Report an internal engine error to subscribers.
    pub fn emit_error<S: Into<String>>(&self, message: S) {
        self.lock().publish(EngineEvent::Error(message.into()));
    }

    /// Make the next serialization fail with `message`.
    pub fn fail_next_save<S: Into<String>>(&self, message: S) {
        self.lock().fail_next_save = Some(message.into());
    }

    /// Make the next import fail with `message`, whatever the content.
    pub fn fail_next_import<S: Into<String>>(&self, message: S) {
        self.lock().fail_next_import = Some(message.into());
    }

    /// Remove the editor actions module.
    pub fn without_editor_actions(&self) -> &Self {
        self.lock().editor_actions = false;
        self
    }

    /// Remove the event bus, making every `fire` fail.
    pub fn without_event_bus(&self) -> &Self {
        self.lock().event_bus = false;
        self
    }

    /// Switch between the diagram and table views.
    pub fn set_active_view(&self, view: ActiveView) {
        self.lock().view = view;
    }

    /// Set which table cells are being edited.
    pub fn set_table_selection(&self, selection: TableSelection) {
        self.lock().table = selection;
    }

    /// Current document, if any.
    pub fn xml(&self) -> Option<String> {
        self.lock().xml.clone()
    }

    pub fn stack_index(&self) -> i64 {
        self.lock().stack_index
    }

    /// Labels of the commands on the stack, oldest first.
    pub fn command_labels(&self) -> Vec<String> {
        self.lock().stack.iter().map(|c| c.label.clone()).collect()
    }

    /// Number of imports started.
    pub fn import_count(&self) -> usize {
        self.lock().imports
    }

    /// Number of serializations performed.
    pub fn save_count(&self) -> usize {
        self.lock().serializations
    }

    /// Editor actions triggered so far.
    pub fn triggered(&self) -> Vec<(String, Value)> {
        self.lock().triggered.clone()
    }

    /// Events fired on the event bus so far.
    pub fn fired(&self) -> Vec<String> {
        self.lock().fired.clone()
    }

    pub fn resize_count(&self) -> usize {
        self.lock().resizes
    }

    pub fn exporter(&self) -> Option<(String, String)> {
        self.lock().exporter.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }
}

/// In-memory engine instance.
///
/// # Example
///
/// ```rust
/// use modeler_editor_api::DiagramEngine;
/// use modeler_editors::MemoryEngine;
///
/// tokio_test::block_on(async {
///     let mut engine = MemoryEngine::new();
///     let warnings = engine.import_xml(r#"<definitions id="d"/>"#).await.unwrap();
///
///     assert!(warnings.is_empty());
///     assert!(engine.is_imported());
///     assert_eq!(engine.stack_index(), -1);
/// });
/// ```
#[derive(Debug, Default)]
pub struct MemoryEngine {
    handle: MemoryEngineHandle,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle(handle: MemoryEngineHandle) -> Self {
        Self { handle }
    }

    /// Factory producing independent engines.
    pub fn factory() -> EngineFactory {
        Arc::new(|| Box::new(MemoryEngine::new()) as Box<dyn DiagramEngine>)
    }

    pub fn handle(&self) -> MemoryEngineHandle {
        self.handle.clone()
    }
}

impl DiagramEngine for MemoryEngine {
    fn import_xml(&mut self, xml: &str) -> EngineFuture<Vec<ImportWarning>> {
        let (seq, forced_failure) = {
            let mut state = self.handle.lock();
            state.import_seq += 1;
            state.imports += 1;
            state.publish(EngineEvent::ImportParseStart);
            (state.import_seq, state.fail_next_import.take())
        };

        let handle = self.handle.clone();
        let xml = xml.to_string();

        Box::pin(async move {
            tokio::task::yield_now().await;

            let parsed = content::inspect(&xml);
            let mut state = handle.lock();

            if state.import_seq != seq {
                return Err(EngineError::new("import superseded by a newer import"));
            }

            if let Some(reason) = forced_failure {
                state.publish(EngineEvent::ImportDone);
                return Err(EngineError::new(reason));
            }

            let summary = match parsed {
                Ok(summary) => summary,
                Err(reason) => {
                    state.publish(EngineEvent::ImportDone);
                    return Err(EngineError::new(reason));
                }
            };

            if summary.root != "definitions" {
                state.publish(EngineEvent::ImportDone);
                return Err(EngineError::new(format!(
                    "unparsable content <{}> detected; this may indicate an invalid diagram file",
                    summary.root
                )));
            }

            let warnings = summary
                .unresolved_references()
                .into_iter()
                .map(|(attribute, id)| {
                    ImportWarning::new(format!("unresolved reference <{}> in {}", id, attribute))
                })
                .collect();

            state.ids = summary.ids;
            state.xml = Some(xml);
            state.stack.clear();
            state.stack_index = -1;
            state.selection.clear();
            state.publish(EngineEvent::ImportDone);

            Ok(warnings)
        })
    }

    fn save_xml(&self, _options: SaveOptions) -> EngineFuture<String> {
        let result = {
            let mut state = self.handle.lock();
            state.serializations += 1;

            match (state.fail_next_save.take(), state.xml.clone()) {
                (Some(reason), _) => Err(EngineError::new(reason)),
                (None, None) => Err(EngineError::new("no definitions loaded")),
                (None, Some(xml)) => match &state.exporter {
                    Some((name, version)) => {
                        content::stamp_exporter(&xml, name, version).map_err(EngineError::new)
                    }
                    None => Ok(xml),
                },
            }
        };

        Box::pin(async move { result })
    }

    fn save_svg(&self) -> EngineFuture<String> {
        let result = {
            let state = self.handle.lock();
            match state.xml {
                Some(_) => render_svg(&state.ids),
                None => Err(EngineError::new("no definitions loaded")),
            }
        };

        Box::pin(async move { result })
    }

    fn is_imported(&self) -> bool {
        self.handle.lock().xml.is_some()
    }

    fn stack_index(&self) -> i64 {
        self.handle.lock().stack_index
    }

    fn can_undo(&self) -> bool {
        self.handle.lock().can_undo()
    }

    fn can_redo(&self) -> bool {
        self.handle.lock().can_redo()
    }

    fn undo(&mut self) {
        let mut state = self.handle.lock();
        if !state.can_undo() {
            return;
        }

        let command = state.stack[state.stack_index as usize].clone();
        state.stack_index -= 1;
        state.apply(command.before);
        state.publish(EngineEvent::CommandStackChanged);
    }

    fn redo(&mut self) {
        let mut state = self.handle.lock();
        if !state.can_redo() {
            return;
        }

        state.stack_index += 1;
        let command = state.stack[state.stack_index as usize].clone();
        state.apply(command.after);
        state.publish(EngineEvent::CommandStackChanged);
    }

    fn selection(&self) -> Vec<String> {
        self.handle.lock().selection.clone()
    }

    fn clipboard_is_empty(&self) -> bool {
        self.handle.lock().clipboard.is_empty()
    }

    fn subscribe(&mut self) -> UnboundedReceiver<EngineEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.handle.lock().subscribers.push(sender);
        receiver
    }

    fn has_editor_actions(&self) -> bool {
        self.handle.lock().editor_actions
    }

    fn trigger_editor_action(&mut self, action: &str, options: &Value) -> Result<(), EngineError> {
        let mut state = self.handle.lock();

        if !state.editor_actions {
            return Err(EngineError::new("editorActions not available"));
        }

        state.triggered.push((action.to_string(), options.clone()));

        match action {
            "selectElements" => {
                state.selection = state.ids.iter().skip(1).cloned().collect();
                state.publish(EngineEvent::SelectionChanged);
            }
            "copy" => {
                state.clipboard = state.selection.clone();
                state.publish(EngineEvent::ElementsCopied);
            }
            "paste" if !state.clipboard.is_empty() => {
                let xml = state.xml.clone().unwrap_or_default();
                state.execute("elements.paste", xml)?;
            }
            "removeSelection" if !state.selection.is_empty() => {
                let xml = state.xml.clone().unwrap_or_default();
                let pruned = content::remove_elements(&xml, &state.selection)
                    .map_err(EngineError::new)?;
                state.selection.clear();
                state.execute("elements.delete", pruned)?;
                state.publish(EngineEvent::SelectionChanged);
            }
            "alignElements" | "distributeElements" | "moveToOrigin"
                if !state.selection.is_empty() =>
            {
                let xml = state.xml.clone().unwrap_or_default();
                state.execute(action, xml)?;
            }
            _ => {}
        }

        Ok(())
    }

    fn fire(&mut self, event: &str) -> Result<(), EngineError> {
        let mut state = self.handle.lock();

        if !state.event_bus {
            return Err(EngineError::new("No provider for \"eventBus\""));
        }

        state.fired.push(event.to_string());
        Ok(())
    }

    fn set_exporter(&mut self, name: &str, version: &str) {
        self.handle.lock().exporter = Some((name.to_string(), version.to_string()));
    }

    fn resize(&mut self) -> Result<(), EngineError> {
        self.handle.lock().resizes += 1;
        Ok(())
    }

    fn active_view(&self) -> ActiveView {
        self.handle.lock().view
    }

    fn table_selection(&self) -> TableSelection {
        self.handle.lock().table
    }

    fn destroy(&mut self) {
        let mut state = self.handle.lock();
        state.destroyed = true;
        state.subscribers.clear();
    }
}

/// One placeholder group per element; there is no geometry to draw.
fn render_svg(ids: &[String]) -> Result<String, EngineError> {
    let mut writer = Writer::new(Vec::new());
    let mut svg = BytesStart::new("svg");
    svg.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
    svg.push_attribute(("version", "1.1"));

    write_event(&mut writer, Event::Start(svg))?;
    for id in ids {
        let mut group = BytesStart::new("g");
        group.push_attribute(("data-element-id", id.as_str()));
        write_event(&mut writer, Event::Empty(group))?;
    }
    write_event(&mut writer, Event::End(BytesEnd::new("svg")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| EngineError::new(e.to_string()))
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), EngineError> {
    writer
        .write_event(event)
        .map_err(|e| EngineError::new(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAGRAM: &str = r#"<definitions id="d"><process id="p"><task id="t1"/><task id="t2"/></process></definitions>"#;

    async fn imported() -> (MemoryEngine, MemoryEngineHandle) {
        let mut engine = MemoryEngine::new();
        engine.import_xml(DIAGRAM).await.unwrap();
        let handle = engine.handle();
        (engine, handle)
    }

    #[tokio::test]
    async fn test_import_rejects_non_diagrams() {
        let mut engine = MemoryEngine::new();
        assert!(engine.import_xml("<html/>").await.is_err());
        assert!(engine.import_xml("<definitions>").await.is_err());
        assert!(!engine.is_imported());
    }

    #[tokio::test]
    async fn test_failed_import_keeps_previous_content() {
        let (mut engine, handle) = imported().await;
        assert!(engine.import_xml("<broken").await.is_err());
        assert_eq!(handle.xml().as_deref(), Some(DIAGRAM));
    }

    #[tokio::test]
    async fn test_import_reports_unresolved_references() {
        let mut engine = MemoryEngine::new();
        let warnings = engine
            .import_xml(r#"<definitions><sequenceFlow id="f" sourceRef="a" targetRef="b"/></definitions>"#)
            .await
            .unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("<a>"));
    }

    #[tokio::test]
    async fn test_superseded_import_is_rejected() {
        let mut engine = MemoryEngine::new();
        let first = engine.import_xml(DIAGRAM);
        let second = engine.import_xml(r#"<definitions id="other"/>"#);

        assert!(second.await.is_ok());
        assert!(first.await.is_err());
        assert_eq!(engine.handle().xml().as_deref(), Some(r#"<definitions id="other"/>"#));
    }

    #[tokio::test]
    async fn test_command_stack_indexing() {
        let (mut engine, handle) = imported().await;
        assert_eq!(engine.stack_index(), -1);
        assert!(!engine.can_undo());

        handle.touch("shape.move").unwrap();
        handle.touch("shape.move").unwrap();
        assert_eq!(engine.stack_index(), 1);

        engine.undo();
        assert_eq!(engine.stack_index(), 0);
        assert!(engine.can_redo());

        handle.touch("shape.create").unwrap();
        assert_eq!(engine.stack_index(), 1);
        assert!(!engine.can_redo());
        assert_eq!(handle.command_labels(), vec!["shape.move", "shape.create"]);
    }

    #[tokio::test]
    async fn test_undo_restores_content() {
        let (mut engine, handle) = imported().await;
        handle.select(&["t1"]);
        engine.trigger_editor_action("removeSelection", &Value::Null).unwrap();
        assert!(!handle.xml().unwrap().contains("t1"));

        engine.undo();
        assert_eq!(handle.xml().as_deref(), Some(DIAGRAM));
        engine.redo();
        assert!(!handle.xml().unwrap().contains("t1"));
    }

    #[tokio::test]
    async fn test_events_are_published() {
        let (mut engine, handle) = imported().await;
        let mut events = engine.subscribe();

        handle.select(&["t1"]);
        engine.trigger_editor_action("copy", &Value::Null).unwrap();
        handle.emit_error("boom");

        assert_eq!(events.try_recv().unwrap(), EngineEvent::SelectionChanged);
        assert_eq!(events.try_recv().unwrap(), EngineEvent::ElementsCopied);
        assert_eq!(events.try_recv().unwrap(), EngineEvent::Error("boom".to_string()));
        assert!(!engine.clipboard_is_empty());
    }

    #[tokio::test]
    async fn test_save_applies_exporter_and_failures() {
        let (mut engine, handle) = imported().await;
        engine.set_exporter("Modeler", "1.0.0");

        let xml = engine.save_xml(SaveOptions::default()).await.unwrap();
        assert!(xml.contains(r#"exporter="Modeler""#));

        handle.fail_next_save("disk on fire");
        let error = engine.save_xml(SaveOptions::default()).await.unwrap_err();
        assert_eq!(error.message, "disk on fire");
        assert_eq!(handle.save_count(), 2);
    }

    #[tokio::test]
    async fn test_svg_lists_elements() {
        let (engine, _) = imported().await;
        let svg = engine.save_svg().await.unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"data-element-id="t2""#));
    }

    #[test]
    fn test_missing_modules() {
        let handle = MemoryEngineHandle::new();
        handle.without_editor_actions().without_event_bus();

        let mut engine = MemoryEngine::with_handle(handle.clone());
        assert!(!engine.has_editor_actions());
        assert!(engine.fire("propertiesPanel.resized").is_err());
        assert!(engine.trigger_editor_action("find", &Value::Null).is_err());
    }
}
